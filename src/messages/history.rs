use super::types::Message;
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;

/// Ordered, append-only message log of the active session.
///
/// The log is stored copy-on-write: `snapshot` hands out the current
/// `Arc` and an `append` after that clones the vector only while a
/// snapshot is still alive, so readers never observe a half-applied append.
///
/// Only the turn controller writes to it; outside the crate it is read-only:
///
/// ```compile_fail
/// use carechat::messages::{ConversationHistory, Message};
///
/// let history = ConversationHistory::new();
/// history.append(Message::user("injected"));
/// ```
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Arc<RwLock<Arc<Vec<Message>>>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Arc::new(Vec::new()))),
        }
    }

    pub(crate) fn append(&self, message: Message) {
        let mut guard = self.messages.write();
        Arc::make_mut(&mut *guard).push(message);
    }

    pub(crate) fn clear(&self) {
        *self.messages.write() = Arc::new(Vec::new());
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            messages: self.messages.read().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.read().last().cloned()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the history at the moment it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    messages: Arc<Vec<Message>>,
}

impl HistorySnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl Deref for HistorySnapshot {
    type Target = [Message];

    fn deref(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a HistorySnapshot {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;

    #[test]
    fn test_append_keeps_insertion_order() {
        let history = ConversationHistory::new();
        history.append(Message::user("one"));
        history.append(Message::assistant("two"));
        history.append(Message::user("three"));

        let contents: Vec<_> = history.snapshot().iter().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_alternation_not_enforced() {
        let history = ConversationHistory::new();
        history.append(Message::user("unanswered"));
        history.append(Message::user("again"));
        assert_eq!(history.len(), 2);
        assert!(history.snapshot().iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let history = ConversationHistory::new();
        history.append(Message::user("a"));
        history.append(Message::assistant("b"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn test_snapshot_is_stable_across_later_appends() {
        let history = ConversationHistory::new();
        history.append(Message::user("first"));

        let before = history.snapshot();
        history.append(Message::assistant("second"));

        assert_eq!(before.len(), 1);
        assert_eq!(history.snapshot().len(), 2);
    }

    #[test]
    fn test_snapshot_survives_clear() {
        let history = ConversationHistory::new();
        history.append(Message::user("kept in snapshot"));
        let before = history.snapshot();
        history.clear();
        assert_eq!(before[0].content, "kept in snapshot");
        assert!(history.is_empty());
    }

    #[test]
    fn test_repeated_snapshots_are_equal() {
        let history = ConversationHistory::new();
        history.append(Message::user("Hello"));
        history.append(Message::assistant("Hi there"));
        assert_eq!(history.snapshot(), history.snapshot());
    }

    #[test]
    fn test_clones_share_the_same_log() {
        let history = ConversationHistory::new();
        let reader = history.clone();
        history.append(Message::user("shared"));
        assert_eq!(reader.len(), 1);
    }
}
