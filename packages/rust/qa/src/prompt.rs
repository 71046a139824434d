//! Prompt templates for grounded question answering.

use sitechat_shared::{ConversationTurn, ScoredChunk};

use crate::FALLBACK_ANSWER;

/// Builds the single-shot prompt sent to the language model.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunks as a numbered context block with sources.
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] Source: {} ({})\n{}\n\n---\n\n",
                i + 1,
                result.chunk.metadata.title,
                result.chunk.metadata.source,
                result.chunk.content
            ));
        }

        context
    }

    /// Render conversation history as alternating `Human:` / `AI:` lines.
    pub fn build_history(turns: &[ConversationTurn]) -> String {
        turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the full prompt: strict-grounding instruction, context block,
    /// recent history, and the current question.
    pub fn build_qa_prompt(
        question: &str,
        results: &[ScoredChunk],
        history: &[ConversationTurn],
    ) -> String {
        let context = Self::build_context(results);
        let history_block = if history.is_empty() {
            String::new()
        } else {
            format!(
                "CONVERSATION SO FAR:\n{}\n\n",
                Self::build_history(history)
            )
        };

        format!(
            r#"You answer questions about one website, using ONLY the context below.

RULES:
1. Use only information explicitly stated in the CONTEXT section.
2. If the context does not contain the answer, reply with exactly:
   "{FALLBACK_ANSWER}"
3. Never draw on outside knowledge and never guess.

CONTEXT:
{context}
{history_block}QUESTION: {question}

ANSWER:"#
        )
    }
}
