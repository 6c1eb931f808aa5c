//! Mock directory and seeded history the daemon starts with.

use chrono::{Duration, Utc};

use crate::chat::{ChatMessage, MessageStatus, ReplyRef};
use crate::emoji::RecentEmojis;
use crate::entity::{Directory, Presence, User};
use crate::reaction::Reaction;

fn contact(
    id: &str,
    username: &str,
    status: Presence,
    last_seen: &str,
    bio: &str,
    custom_status: &str,
    status_emoji: &str,
) -> User {
    let mut user = User::new(id, username, status);
    user.last_seen = last_seen.to_string();
    user.bio = Some(bio.to_string());
    user.custom_status = Some(custom_status.to_string());
    user.status_emoji = Some(status_emoji.to_string());
    user
}

pub fn contacts() -> Vec<User> {
    vec![
        contact(
            "1",
            "Amara Okafor",
            Presence::Online,
            "2m ago",
            "Software developer passionate about creating amazing user experiences.",
            "Building the future",
            "🚀",
        ),
        contact(
            "2",
            "Kwame Mensah",
            Presence::Offline,
            "1h ago",
            "Designer and creative thinker.",
            "In a meeting",
            "💼",
        ),
        contact(
            "3",
            "Zainab Ahmed",
            Presence::Online,
            "3h ago",
            "Product manager who loves solving complex problems.",
            "Available",
            "✨",
        ),
        contact(
            "4",
            "Tendai Moyo",
            Presence::Online,
            "Yesterday",
            "Marketing specialist with a passion for storytelling.",
            "Coffee time",
            "☕",
        ),
        contact(
            "5",
            "Chijioke Eze",
            Presence::Offline,
            "Yesterday",
            "Data scientist exploring the world of AI.",
            "Deep in code",
            "🤖",
        ),
    ]
}

pub fn directory(self_id: &str) -> Directory {
    let mut me = User::new(self_id, "Me", Presence::Online);
    me.status_emoji = Some("😊".to_string());
    Directory::new(me, contacts())
}

pub fn recent_emojis() -> RecentEmojis {
    RecentEmojis::seeded(["👍", "❤️", "😂", "🔥", "👏"])
}

fn reaction(emoji: &str, users: &[&str]) -> Reaction {
    Reaction {
        emoji: emoji.to_string(),
        users: users.iter().map(|u| u.to_string()).collect(),
        count: users.len(),
    }
}

fn seeded(id: &str, sender_id: &str, text: &str, minutes_ago: i64) -> ChatMessage {
    let mut message = ChatMessage::text(id, sender_id, text);
    message.timestamp = Utc::now() - Duration::minutes(minutes_ago);
    message.status = MessageStatus::Read;
    message
}

/// Earlier conversation between `self_id` and `partner`.
pub fn history(self_id: &str, partner: &User) -> Vec<ChatMessage> {
    let them = partner.id.as_str();

    let mut greeting = seeded("1", them, "Hey there! How are you doing today?", 60);
    greeting.reactions = vec![reaction("👍", &[self_id]), reaction("❤️", &[them, self_id])];

    let answer = seeded("2", self_id, "I'm doing great, thanks for asking! How about you?", 55);

    let mut projects = seeded("3", them, "I'm good too! Just working on some new projects.", 50);
    projects.reactions = vec![reaction("🚀", &[self_id])];

    let mut question = seeded("4", self_id, "That sounds interesting! What kind of projects?", 45);
    question.reply_to = Some(ReplyRef {
        id: projects.id.clone(),
        text: projects.text.clone(),
        sender_name: partner.username.clone(),
    });

    let mut pitch = seeded(
        "5",
        them,
        "I'm building a new chat application with real-time messaging capabilities. \
         It's going to have some cool African-inspired design elements.",
        40,
    );
    pitch.reactions = vec![reaction("🔥", &[self_id]), reaction("👏", &[self_id])];

    vec![greeting, answer, projects, question, pitch]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_consistent() {
        let partner = &contacts()[0];
        let history = history("me", partner);
        assert_eq!(history.len(), 5);
        for (i, message) in history.iter().enumerate() {
            assert_eq!(message.id, (i + 1).to_string());
            for r in &message.reactions {
                assert_eq!(r.count, r.users.len());
            }
        }
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(history[3].reply_to.as_ref().unwrap().sender_name, partner.username);
    }

    #[test]
    fn directory_has_the_mock_contacts() {
        let dir = directory("me");
        assert_eq!(dir.contacts().len(), 5);
        assert_eq!(dir.me().id, "me");
    }
}
