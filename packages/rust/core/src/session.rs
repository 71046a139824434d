//! Per-conversation session state.
//!
//! A [`ChatSession`] is created when a site has been ingested and dropped
//! when the conversation ends. It owns the append-only conversation
//! history; concurrent users run independent sessions with independent
//! histories. There is no ambient global session state.

use url::Url;
use uuid::Uuid;

use sitechat_shared::ConversationTurn;

/// A UUID v7 wrapper for session identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's conversation with one ingested site.
#[derive(Debug)]
pub struct ChatSession {
    id: SessionId,
    site: Url,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    /// Start a fresh session for an ingested site.
    pub fn new(site: Url) -> Self {
        Self {
            id: SessionId::new(),
            site,
            history: Vec::new(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The site this session is about.
    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Full conversation history, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Append a user turn.
    pub fn push_human(&mut self, content: impl Into<String>) {
        self.history.push(ConversationTurn::human(content));
    }

    /// Append an assistant turn.
    pub fn push_ai(&mut self, content: impl Into<String>) {
        self.history.push(ConversationTurn::ai(content));
    }
}
