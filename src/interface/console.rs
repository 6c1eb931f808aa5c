use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::bus::{emit, events, EventBus, Subscription, Transport};
use crate::chat::ChatMessage;
use crate::config::Config;
use crate::emoji::{Picker, RecentEmojis, QUICK_REACTIONS};
use crate::entity::{Directory, ProfileUpdate};
use crate::error::{ChatError, ChatResult};
use crate::fixtures;
use crate::manager::ConversationManager;

const HELP: &str = "\
These commands are supported:
  <text>                 send a message
  /contacts [query]      list contacts, optionally filtered by name
  /open <contact-id>     open the conversation with a contact
  /history               show the open conversation
  /reply <message-id>    reply to a message with the next send
  /cancel                stop replying
  /react <id> <emoji>    toggle a reaction on a message
  /emoji <emoji>         insert an emoji (counts as recently used)
  /emojis [query]        browse the emoji picker, optionally filtered
  /recent                show recently used emoji
  /profile <field>=<v>   update username, bio, status or emoji
  /help                  display this text
  /quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Contacts(String),
    Open(String),
    History,
    Reply(String),
    Cancel,
    React { message_id: String, emoji: String },
    Emoji(String),
    Picker(String),
    Recent,
    Profile(ProfileUpdate),
    Quit,
    Say(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> ChatResult<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Ok(Some(Command::Say(line.to_string())));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let required = |usage: &str| -> ChatResult<String> {
            if arg.is_empty() {
                Err(ChatError::InvalidCommand(format!("usage: {usage}")))
            } else {
                Ok(arg.to_string())
            }
        };

        let command = match name {
            "help" | "start" => Command::Help,
            "contacts" => Command::Contacts(arg.to_string()),
            "open" => Command::Open(required("/open <contact-id>")?),
            "history" => Command::History,
            "reply" => Command::Reply(required("/reply <message-id>")?),
            "cancel" => Command::Cancel,
            "react" => {
                let usage = "/react <message-id> <emoji>";
                let mut tokens = arg.split_whitespace();
                let (Some(message_id), Some(emoji), None) = (tokens.next(), tokens.next(), tokens.next())
                else {
                    return Err(ChatError::InvalidCommand(format!("usage: {usage}")));
                };
                Command::React {
                    message_id: message_id.to_string(),
                    emoji: emoji.to_string(),
                }
            }
            "emoji" => Command::Emoji(required("/emoji <emoji>")?),
            "emojis" => Command::Picker(arg.to_string()),
            "recent" => Command::Recent,
            "profile" => Command::Profile(ProfileUpdate::parse_field(arg)?),
            "quit" | "exit" => Command::Quit,
            other => return Err(ChatError::InvalidCommand(format!("unknown command /{other}"))),
        };
        Ok(Some(command))
    }
}

/// Line-oriented front end over stdin/stdout.
pub struct ConsoleInterface {
    config: Config,
    bus: Arc<EventBus>,
    directory: Directory,
    conversation: Option<ConversationManager>,
    recent: RecentEmojis,
}

impl ConsoleInterface {
    pub fn new(config: Config, bus: Arc<EventBus>, directory: Directory) -> Self {
        Self {
            config,
            bus,
            directory,
            conversation: None,
            recent: fixtures::recent_emojis(),
        }
    }

    pub fn conversation(&self) -> Option<&ConversationManager> {
        self.conversation.as_ref()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Tear down the current conversation (if any) and open one with `contact_id`.
    pub fn open(&mut self, contact_id: &str) -> ChatResult<&ConversationManager> {
        let partner = self.directory.contact(contact_id)?.clone();
        if let Some(previous) = self.conversation.take() {
            self.recent = previous.recent_emojis();
        }

        let history = fixtures::history(&self.config.self_id, &partner);
        let transport: Arc<dyn Transport> = self.bus.clone();
        let conversation = ConversationManager::new(&self.config, partner, transport)
            .with_history(history)
            .with_recent(self.recent.clone());
        let conversation: &ConversationManager = self.conversation.insert(conversation);
        Ok(conversation)
    }

    fn active(&self) -> ChatResult<&ConversationManager> {
        self.conversation
            .as_ref()
            .ok_or_else(|| ChatError::InvalidCommand("no conversation open, use /open <contact-id>".into()))
    }

    /// Print incoming messages from anyone but us as they arrive on the bus.
    pub fn watch_incoming(&self) -> Subscription {
        let self_id = self.config.self_id.clone();
        let names: HashMap<String, String> = self
            .directory
            .contacts()
            .iter()
            .map(|c| (c.id.clone(), c.username.clone()))
            .collect();

        self.bus.on_event(
            events::MESSAGE,
            Box::new(move |payload: serde_json::Value| match serde_json::from_value::<ChatMessage>(payload) {
                Ok(msg) if msg.sender_id != self_id => {
                    let name = names.get(&msg.sender_id).unwrap_or(&msg.sender_id);
                    println!("{}", render_line(&msg, name));
                }
                Ok(_) => {}
                Err(e) => warn!("Unreadable message on the bus: {}", e),
            }),
        )
    }

    /// Run one command and produce the text to show the user.
    pub fn handle(&mut self, command: Command) -> ChatResult<String> {
        let reply = match command {
            Command::Help | Command::Quit => HELP.to_string(),
            Command::Contacts(query) => {
                let current = self.conversation.as_ref().map(|c| c.partner().id.clone());
                let mut list = String::new();
                for contact in self.directory.search(&query) {
                    let marker = if current.as_deref() == Some(contact.id.as_str()) { "→" } else { " " };
                    let _ = writeln!(
                        list,
                        "{} {:>3}  {:<16} {:<8} {} {}",
                        marker,
                        contact.id,
                        contact.username,
                        contact.status.to_string(),
                        contact.status_emoji.as_deref().unwrap_or(""),
                        contact.custom_status.as_deref().unwrap_or("No status"),
                    );
                }
                if list.is_empty() {
                    "No contacts found.".to_string()
                } else {
                    list
                }
            }
            Command::Open(contact_id) => {
                self.open(&contact_id)?;
                let conversation = self.active()?;
                format!(
                    "✓ Opened conversation with {}\n{}",
                    conversation.partner(),
                    self.render_history(conversation)
                )
            }
            Command::History => self.render_history(self.active()?),
            Command::Reply(message_id) => {
                let conversation = self.active()?;
                if !conversation.reply_to_id(&message_id) {
                    return Ok(format!("No message {message_id}."));
                }
                match conversation.reply_target() {
                    Some(target) => format!("Replying to {}: {}", target.sender_name, target.text),
                    None => String::new(),
                }
            }
            Command::Cancel => {
                self.active()?.cancel_reply();
                "Reply cancelled.".to_string()
            }
            Command::React { message_id, emoji } => {
                let conversation = self.active()?;
                let self_id = conversation.self_id().to_string();
                if !conversation.toggle_reaction(&message_id, &emoji, &self_id) {
                    return Ok(format!("No message {message_id}."));
                }
                match conversation.message(&message_id) {
                    Some(message) => render_line(&message, &self.sender_name(&message)),
                    None => String::new(),
                }
            }
            Command::Emoji(emoji) => {
                self.active()?.record_emoji_used(&emoji);
                format!("Inserted {emoji}")
            }
            Command::Picker(query) => {
                let categories = Picker::new(&self.current_recent()).search(&query);
                if categories.is_empty() {
                    "No emoji found.".to_string()
                } else {
                    categories
                        .iter()
                        .map(|c| format!("{}: {}", c.name, c.emojis.join(" ")))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Recent => {
                let recent = self.current_recent();
                format!(
                    "Recent: {}\nQuick: {}",
                    recent.as_slice().join(" "),
                    QUICK_REACTIONS.join(" ")
                )
            }
            Command::Profile(update) => {
                let me = self.directory.update_profile(update).clone();
                emit(self.bus.as_ref(), events::PROFILE, &me);
                format!(
                    "{} {} {}",
                    me.username,
                    me.status_emoji.as_deref().unwrap_or(""),
                    me.custom_status.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string()
            }
            Command::Say(text) => {
                let message = self.active()?.send(&text)?;
                render_line(&message, &self.sender_name(&message))
            }
        };
        Ok(reply)
    }

    fn current_recent(&self) -> RecentEmojis {
        match &self.conversation {
            Some(conversation) => conversation.recent_emojis(),
            None => self.recent.clone(),
        }
    }

    fn sender_name(&self, message: &ChatMessage) -> String {
        if message.sender_id == self.config.self_id {
            self.config.self_label.clone()
        } else {
            self.directory
                .contact(&message.sender_id)
                .map(|c| c.username.clone())
                .unwrap_or_else(|_| message.sender_id.clone())
        }
    }

    fn render_history(&self, conversation: &ConversationManager) -> String {
        let lines: Vec<String> = conversation
            .messages()
            .iter()
            .map(|m| render_line(m, &self.sender_name(m)))
            .collect();
        if lines.is_empty() {
            "No messages yet.".to_string()
        } else {
            lines.join("\n")
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let _incoming = self.watch_incoming();
        println!("Welcome to ZeChat! Use /help to see what I can do.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => match self.handle(command) {
                    Ok(reply) if !reply.is_empty() => println!("{}", reply),
                    Ok(_) => {}
                    Err(e) => println!("{}", e),
                },
                Err(e) => println!("{}\nUse /help to see the supported commands.", e),
            }
        }

        if let Some(conversation) = self.conversation.take() {
            conversation.close();
        }
        info!("Console closed");
        Ok(())
    }
}

fn render_line(message: &ChatMessage, sender_name: &str) -> String {
    let mut line = format!("#{} [{}] {}", message.id, sender_name, message.text);
    if let Some(reply) = &message.reply_to {
        let _ = write!(line, "  ↪ {}: {}", reply.sender_name, reply.text);
    }
    if !message.reactions.is_empty() {
        let reactions: Vec<String> = message
            .reactions
            .iter()
            .map(|r| format!("{}{}", r.emoji, r.count))
            .collect();
        let _ = write!(line, "  {}", reactions.join(" "));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> ConsoleInterface {
        let config = Config::default();
        let directory = fixtures::directory(&config.self_id);
        ConsoleInterface::new(config, Arc::new(EventBus::default()), directory)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("hello there").unwrap(), Some(Command::Say("hello there".into())));
        assert_eq!(Command::parse("/open 2").unwrap(), Some(Command::Open("2".into())));
        assert_eq!(
            Command::parse("/react 5 🔥").unwrap(),
            Some(Command::React { message_id: "5".into(), emoji: "🔥".into() })
        );
        assert_eq!(Command::parse("/contacts").unwrap(), Some(Command::Contacts(String::new())));
        assert!(Command::parse("/open").is_err());
        assert!(Command::parse("/react 5").is_err());
        assert!(Command::parse("/react 5 🔥 please").is_err());
        assert_eq!(
            Command::parse("/react  5   👍 ").unwrap(),
            Some(Command::React { message_id: "5".into(), emoji: "👍".into() })
        );
        assert_eq!(Command::parse("/emojis").unwrap(), Some(Command::Picker(String::new())));
        assert_eq!(Command::parse("/emojis 🐶").unwrap(), Some(Command::Picker("🐶".into())));
        assert!(Command::parse("/dance").is_err());
    }

    #[test]
    fn commands_need_an_open_conversation() {
        let mut c = console();
        assert!(matches!(c.handle(Command::History), Err(ChatError::InvalidCommand(_))));
        assert_eq!(
            c.handle(Command::Open("9".into())).unwrap_err(),
            ChatError::UnknownContact("9".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reply_then_send_attaches_snapshot() {
        let mut c = console();
        c.handle(Command::Open("1".into())).unwrap();
        let shown = c.handle(Command::Reply("3".into())).unwrap();
        assert!(shown.starts_with("Replying to Amara Okafor"));

        c.handle(Command::Say("Tell me more".into())).unwrap();
        let conversation = c.conversation().unwrap();
        let sent = conversation.message("6").unwrap();
        assert_eq!(sent.reply_to.unwrap().id, "3");
        assert_eq!(conversation.reply_target(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_contacts_cancels_and_keeps_recent() {
        let mut c = console();
        c.handle(Command::Open("1".into())).unwrap();
        c.handle(Command::React { message_id: "2".into(), emoji: "🎉".into() }).unwrap();
        c.handle(Command::Say("Hi".into())).unwrap();
        assert_eq!(c.conversation().unwrap().pending_responses(), 1);

        c.handle(Command::Open("2".into())).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        let conversation = c.conversation().unwrap();
        assert_eq!(conversation.partner().id, "2");
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.recent_emojis().as_slice()[0], "🎉");
    }

    #[test]
    fn profile_edit_updates_directory() {
        let mut c = console();
        let shown = c
            .handle(Command::Profile(ProfileUpdate::parse_field("status=Coffee time").unwrap()))
            .unwrap();
        assert_eq!(shown, "Me 😊 Coffee time");
        assert_eq!(c.directory().me().custom_status.as_deref(), Some("Coffee time"));
    }

    #[tokio::test(start_paused = true)]
    async fn picker_lists_recent_and_filters() {
        let mut c = console();
        c.handle(Command::Open("1".into())).unwrap();
        c.handle(Command::Emoji("🐶".into())).unwrap();

        let all = c.handle(Command::Picker(String::new())).unwrap();
        assert!(all.starts_with("Recent: 🐶 👍"));
        assert_eq!(all.lines().count(), 8);

        let hits = c.handle(Command::Picker("🐶".into())).unwrap();
        assert_eq!(hits, "Recent: 🐶\nAnimals: 🐶");
        assert_eq!(c.handle(Command::Picker("zz".into())).unwrap(), "No emoji found.");
    }

    #[test]
    fn contacts_are_filtered() {
        let mut c = console();
        let list = c.handle(Command::Contacts("zain".into())).unwrap();
        assert!(list.contains("Zainab Ahmed"));
        assert!(!list.contains("Amara"));
        assert_eq!(c.handle(Command::Contacts("xyz".into())).unwrap(), "No contacts found.");
    }
}
