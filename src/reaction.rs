//! Reaction bookkeeping.
//!
//! Every function takes the current reactions of a message and returns a new
//! collection; the input slice is never touched. After any call each entry has
//! `count == users.len()`, `count > 0`, unique users, and emoji are unique
//! across entries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub users: Vec<String>,
    pub count: usize,
}

impl Reaction {
    pub fn new(emoji: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
            users: vec![user_id.into()],
            count: 1,
        }
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }
}

/// Add `user_id` to the `emoji` entry, creating it if needed. Already present is a no-op.
pub fn add(reactions: &[Reaction], emoji: &str, user_id: &str) -> Vec<Reaction> {
    let mut next = reactions.to_vec();
    match next.iter_mut().find(|r| r.emoji == emoji) {
        Some(r) if r.has_user(user_id) => {}
        Some(r) => {
            r.users.push(user_id.to_string());
            r.count = r.users.len();
        }
        None => next.push(Reaction::new(emoji, user_id)),
    }
    next
}

/// Remove `user_id` from the `emoji` entry, dropping the entry once nobody is left.
pub fn remove(reactions: &[Reaction], emoji: &str, user_id: &str) -> Vec<Reaction> {
    reactions
        .iter()
        .filter_map(|r| {
            if r.emoji != emoji || !r.has_user(user_id) {
                return Some(r.clone());
            }
            let users: Vec<String> = r.users.iter().filter(|u| *u != user_id).cloned().collect();
            (!users.is_empty()).then(|| Reaction {
                emoji: r.emoji.clone(),
                count: users.len(),
                users,
            })
        })
        .collect()
}

/// `remove` if the user already reacted with `emoji`, otherwise `add`.
///
/// Toggling the same pair twice restores the same entries and users, but not
/// their order: a dropped entry or a re-added user comes back at the end.
pub fn toggle(reactions: &[Reaction], emoji: &str, user_id: &str) -> Vec<Reaction> {
    let reacted = reactions
        .iter()
        .any(|r| r.emoji == emoji && r.has_user(user_id));
    if reacted {
        remove(reactions, emoji, user_id)
    } else {
        add(reactions, emoji, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(reactions: &[Reaction]) {
        for (i, r) in reactions.iter().enumerate() {
            assert!(r.count > 0, "zero entry for {}", r.emoji);
            assert_eq!(r.count, r.users.len());
            let mut users = r.users.clone();
            users.sort();
            users.dedup();
            assert_eq!(users.len(), r.users.len(), "duplicate user in {}", r.emoji);
            assert!(reactions[i + 1..].iter().all(|o| o.emoji != r.emoji));
        }
    }

    fn by_emoji(mut reactions: Vec<Reaction>) -> Vec<Reaction> {
        for r in &mut reactions {
            r.users.sort();
        }
        reactions.sort_by(|a, b| a.emoji.cmp(&b.emoji));
        reactions
    }

    #[test]
    fn toggle_creates_then_removes() {
        let once = toggle(&[], "👍", "me");
        assert_eq!(once, vec![Reaction::new("👍", "me")]);
        assert!(toggle(&once, "👍", "me").is_empty());
    }

    #[test]
    fn second_user_joins_existing_entry() {
        let start = vec![Reaction::new("❤️", "1")];
        let next = toggle(&start, "❤️", "me");
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].users, vec!["1", "me"]);
        assert_eq!(next[0].count, 2);

        let back = toggle(&next, "❤️", "me");
        assert_eq!(back, start);
    }

    #[test]
    fn input_is_not_mutated() {
        let start = vec![Reaction::new("🔥", "me")];
        let snapshot = start.clone();
        let _ = toggle(&start, "🔥", "me");
        let _ = add(&start, "🔥", "2");
        assert_eq!(start, snapshot);
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let once = add(&[], "👏", "me");
        assert_eq!(add(&once, "👏", "me"), once);
        assert_eq!(remove(&[], "👏", "me"), Vec::<Reaction>::new());
        assert_eq!(remove(&once, "👏", "someone-else"), once);
    }

    #[test]
    fn double_toggle_round_trips_for_many_shapes() {
        let users = ["me", "1", "2"];
        let emoji = ["👍", "❤️", "😂"];
        let mut state: Vec<Reaction> = Vec::new();
        for step in 0..30 {
            let e = emoji[step % emoji.len()];
            let u = users[(step * 7) % users.len()];
            state = toggle(&state, e, u);
            assert_consistent(&state);

            for target in emoji {
                let there = toggle(&state, target, "me");
                assert_consistent(&there);
                // Re-added entries and users land at the end; compare ignoring order.
                assert_eq!(by_emoji(toggle(&there, target, "me")), by_emoji(state.clone()));
            }
        }
    }

    #[test]
    fn order_of_other_entries_is_kept() {
        let start = vec![
            Reaction::new("👍", "me"),
            Reaction::new("❤️", "1"),
            Reaction::new("🚀", "me"),
        ];
        let next = toggle(&start, "👍", "me");
        let emoji: Vec<_> = next.iter().map(|r| r.emoji.as_str()).collect();
        assert_eq!(emoji, vec!["❤️", "🚀"]);
    }
}
