use crate::state::{Role, Turn, TurnId};

/// Number of trailing turns sent upstream as context
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// Ordered log of turns for one chat session.
///
/// The full history stays in memory; only [`Conversation::window`] is sent
/// to the backend.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    next_seq: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id for a turn of the given role.
    ///
    /// Ids are `user_<n>` / `bot_<n>` with `n` strictly increasing across
    /// the session, including across [`Conversation::clear`].
    pub fn next_id(&mut self, role: Role) -> TurnId {
        self.next_seq += 1;
        TurnId::new(format!("{}_{}", role.id_prefix(), self.next_seq))
    }

    pub fn append(&mut self, turn: Turn) {
        debug_assert!(
            self.find_by_id(&turn.id).is_none(),
            "duplicate turn id {}",
            turn.id
        );
        self.turns.push(turn);
    }

    /// Allocate an id, append the turn and return a copy of it
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> Turn {
        let id = self.next_id(role);
        let turn = Turn::new(id, role, content);
        self.turns.push(turn.clone());
        turn
    }

    /// Remove the most recent turn with `role`, if any
    pub fn remove_last(&mut self, role: Role) -> Option<Turn> {
        let idx = self.turns.iter().rposition(|t| t.role == role)?;
        Some(self.turns.remove(idx))
    }

    /// The most recent `k` turns in chronological order
    pub fn window(&self, k: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(k);
        &self.turns[start..]
    }

    pub fn find_by_id(&self, id: &TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| &t.id == id)
    }

    pub fn last(&self, role: Role) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == role)
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_of(n: usize) -> Conversation {
        let mut conv = Conversation::new();
        for i in 0..n {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            conv.push(role, format!("m{}", i));
        }
        conv
    }

    #[test]
    fn test_window_returns_last_five_in_order() {
        let conv = conversation_of(7);
        let window = conv.window(DEFAULT_CONTEXT_WINDOW);
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn test_window_shorter_than_k() {
        let conv = conversation_of(3);
        assert_eq!(conv.window(5).len(), 3);
        assert!(Conversation::new().window(5).is_empty());
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut conv = Conversation::new();
        let a = conv.push(Role::User, "a");
        let b = conv.push(Role::Assistant, "b");
        conv.clear();
        let c = conv.push(Role::User, "c");
        assert_eq!(a.id.as_str(), "user_1");
        assert_eq!(b.id.as_str(), "bot_2");
        assert_eq!(c.id.as_str(), "user_3");
    }

    #[test]
    fn test_remove_last_targets_most_recent_role() {
        let mut conv = conversation_of(4);
        let removed = conv.remove_last(Role::Assistant).unwrap();
        assert_eq!(removed.content, "m3");
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last(Role::Assistant).unwrap().content, "m1");
    }

    #[test]
    fn test_remove_last_without_match_is_noop() {
        let mut conv = Conversation::new();
        conv.push(Role::User, "only");
        assert!(conv.remove_last(Role::Assistant).is_none());
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_find_by_id() {
        let mut conv = Conversation::new();
        let turn = conv.push(Role::User, "hello");
        assert_eq!(conv.find_by_id(&turn.id), Some(&turn));
        assert!(conv.find_by_id(&TurnId::new("bot_99")).is_none());
    }
}
