//! Chat session state owned by a client.
//!
//! The server keeps no per-user state. A client holds a [`ChatSession`] and passes the selected
//! document ids with every query.

use time::OffsetDateTime;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The person asking questions.
    User,
    /// Answers and error notices shown back to the user.
    Assistant,
}

/// One entry of the chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Time the message was recorded.
    pub timestamp: OffsetDateTime,
}

/// A document uploaded during the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDocument {
    /// Identifier returned by the server.
    pub id: String,
    /// Local name of the uploaded file.
    pub name: String,
    /// Time the upload completed.
    pub uploaded_at: OffsetDateTime,
}

/// Uploaded documents and chat history for one client.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    documents: Vec<SessionDocument>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file with this name was already uploaded in the session.
    pub fn has_document_named(&self, name: &str) -> bool {
        self.documents.iter().any(|document| document.name == name)
    }

    /// Track a successful upload.
    pub fn add_document(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.documents.push(SessionDocument {
            id: id.into(),
            name: name.into(),
            uploaded_at: OffsetDateTime::now_utc(),
        });
    }

    /// Forget a document; returns `false` when it was not tracked.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|document| document.id != id);
        self.documents.len() != before
    }

    /// Documents uploaded so far, oldest first.
    pub fn documents(&self) -> &[SessionDocument] {
        &self.documents
    }

    /// Identifiers sent as query context.
    pub fn document_ids(&self) -> Vec<String> {
        self.documents.iter().map(|document| document.id.clone()).collect()
    }

    /// Append a message to the history.
    pub fn push_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    /// Chat history, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Drop the chat history, keeping the uploaded documents.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }
}
