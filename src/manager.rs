use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bus::{emit, events, Transport};
use crate::chat::{ChatMessage, MessageStatus, ReplyRef};
use crate::config::Config;
use crate::emoji::RecentEmojis;
use crate::entity::User;
use crate::error::{ChatError, ChatResult};
use crate::reaction::{self, Reaction};

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<ChatMessage>,
    reply_target: Option<ReplyRef>,
    recent: RecentEmojis,
}

impl ConversationState {
    fn next_id(&self) -> String {
        // Seeded history may not be numbered 1..n, so never go below the highest id.
        let highest = self
            .messages
            .iter()
            .filter_map(|m| m.id.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        (highest.max(self.messages.len()) + 1).to_string()
    }

    fn push(&mut self, sender_id: &str, text: &str, reply_to: Option<ReplyRef>) -> ChatMessage {
        let message = ChatMessage::text(self.next_id(), sender_id, text).with_reply(reply_to);
        self.messages.push(message.clone());
        message
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

fn lock(state: &Mutex<ConversationState>) -> MutexGuard<'_, ConversationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Payload of a `reaction` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUpdate<'a> {
    pub message_id: &'a str,
    pub emoji: &'a str,
    pub user_id: &'a str,
    pub reactions: &'a [Reaction],
}

/// Payload of a `status` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate<'a> {
    pub message_id: &'a str,
    pub status: MessageStatus,
}

/// Owns one open conversation: the message sequence, reactions, the reply
/// draft and the recent emoji list.
///
/// Lives as long as the conversation is on screen. Dropping it cancels any
/// simulated responses that have not fired yet.
pub struct ConversationManager {
    self_id: String,
    self_label: String,
    response_delay: Duration,
    response_text: String,
    partner: User,
    state: Arc<Mutex<ConversationState>>,
    transport: Arc<dyn Transport>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ConversationManager {
    pub fn new(config: &Config, partner: User, transport: Arc<dyn Transport>) -> Self {
        info!("Opening conversation with {}", partner);
        Self {
            self_id: config.self_id.clone(),
            self_label: config.self_label.clone(),
            response_delay: config.response_delay,
            response_text: config.response_text.clone(),
            partner,
            state: Arc::new(Mutex::new(ConversationState::default())),
            transport,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_history(self, messages: Vec<ChatMessage>) -> Self {
        lock(&self.state).messages = messages;
        self
    }

    pub fn with_recent(self, recent: RecentEmojis) -> Self {
        lock(&self.state).recent = recent;
        self
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        lock(&self.state)
    }

    pub fn partner(&self) -> &User {
        &self.partner
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    pub fn message(&self, id: &str) -> Option<ChatMessage> {
        self.state().messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reply_target(&self) -> Option<ReplyRef> {
        self.state().reply_target.clone()
    }

    pub fn recent_emojis(&self) -> RecentEmojis {
        self.state().recent.clone()
    }

    /// Append a message to the end of the conversation.
    ///
    /// `reply_to` takes precedence over the active reply target. Either way the
    /// active reply target is cleared afterwards.
    pub fn append(
        &self,
        text: &str,
        sender_id: &str,
        reply_to: Option<ReplyRef>,
    ) -> ChatResult<ChatMessage> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = {
            let mut state = self.state();
            let active = state.reply_target.take();
            state.push(sender_id, text, reply_to.or(active))
        };

        info!(id = %message.id, sender = %message.sender_id, "Message appended");
        emit(self.transport.as_ref(), events::MESSAGE, &message);
        Ok(message)
    }

    /// What the composer calls: append as the local user, then schedule the partner's reply.
    pub fn send(&self, text: &str) -> ChatResult<ChatMessage> {
        let message = self.append(text, &self.self_id, None)?;
        self.simulate_response(&self.partner.id);
        Ok(message)
    }

    /// Append the canned acknowledgment from `partner_id` right away.
    pub fn respond(&self, partner_id: &str) -> ChatMessage {
        append_response(&self.state, self.transport.as_ref(), partner_id, &self.response_text)
    }

    /// Schedule [`respond`](Self::respond) after the configured delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn simulate_response(&self, partner_id: &str) {
        let state = Arc::downgrade(&self.state);
        let transport = Arc::clone(&self.transport);
        let partner_id = partner_id.to_string();
        let text = self.response_text.clone();
        let delay = self.response_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire_response(state, transport, partner_id, text);
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of scheduled responses that have not fired yet.
    pub fn pending_responses(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Add the user to the emoji's reaction, or take them off it if already there.
    ///
    /// Unknown message ids are ignored. Returns whether a message was updated.
    pub fn toggle_reaction(&self, message_id: &str, emoji: &str, user_id: &str) -> bool {
        self.update_reactions(message_id, emoji, user_id, reaction::toggle, true)
    }

    pub fn add_reaction(&self, message_id: &str, emoji: &str, user_id: &str) -> bool {
        self.update_reactions(message_id, emoji, user_id, reaction::add, true)
    }

    pub fn remove_reaction(&self, message_id: &str, emoji: &str, user_id: &str) -> bool {
        self.update_reactions(message_id, emoji, user_id, reaction::remove, false)
    }

    fn update_reactions(
        &self,
        message_id: &str,
        emoji: &str,
        user_id: &str,
        apply: fn(&[Reaction], &str, &str) -> Vec<Reaction>,
        promote: bool,
    ) -> bool {
        let reactions = {
            let mut state = self.state();
            let Some(message) = state.message_mut(message_id) else {
                debug!("Reaction on unknown message {} ignored", message_id);
                return false;
            };
            message.reactions = apply(&message.reactions, emoji, user_id);
            let reactions = message.reactions.clone();
            if promote {
                state.recent.promote(emoji);
            }
            reactions
        };

        emit(
            self.transport.as_ref(),
            events::REACTION,
            &ReactionUpdate {
                message_id,
                emoji,
                user_id,
                reactions: &reactions,
            },
        );
        true
    }

    /// Start replying to `message`, or clear the draft reference with `None`.
    pub fn set_reply_target(&self, message: Option<&ChatMessage>) {
        let snapshot = message.map(|m| {
            let sender_name = if m.is_from(&self.self_id) {
                self.self_label.as_str()
            } else {
                self.partner.username.as_str()
            };
            m.reply_ref(sender_name)
        });
        self.state().reply_target = snapshot;
    }

    /// Like [`set_reply_target`](Self::set_reply_target) by id. Unknown ids are ignored.
    pub fn reply_to_id(&self, message_id: &str) -> bool {
        match self.message(message_id) {
            Some(message) => {
                self.set_reply_target(Some(&message));
                true
            }
            None => {
                debug!("Reply to unknown message {} ignored", message_id);
                false
            }
        }
    }

    pub fn cancel_reply(&self) {
        self.set_reply_target(None);
    }

    pub fn record_emoji_used(&self, emoji: &str) {
        self.state().recent.promote(emoji);
    }

    /// Move a message's status forward. Backwards moves and unknown ids are ignored.
    pub fn advance_status(&self, message_id: &str, status: MessageStatus) -> bool {
        let advanced = self
            .state()
            .message_mut(message_id)
            .is_some_and(|m| m.advance_status(status));
        if advanced {
            emit(
                self.transport.as_ref(),
                events::STATUS,
                &StatusUpdate { message_id, status },
            );
        }
        advanced
    }

    /// Cancel every scheduled response. Also runs on drop.
    pub fn close(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let cancelled = pending.iter().filter(|h| !h.is_finished()).count();
        for handle in pending.drain(..) {
            handle.abort();
        }
        if cancelled > 0 {
            info!("Cancelled {} pending responses from {}", cancelled, self.partner);
        }
    }
}

impl Drop for ConversationManager {
    fn drop(&mut self) {
        self.close();
    }
}

fn append_response(
    state: &Mutex<ConversationState>,
    transport: &dyn Transport,
    partner_id: &str,
    text: &str,
) -> ChatMessage {
    let message = lock(state).push(partner_id, text, None);
    info!(id = %message.id, sender = %partner_id, "Response appended");
    emit(transport, events::MESSAGE, &message);
    message
}

fn fire_response(
    state: Weak<Mutex<ConversationState>>,
    transport: Arc<dyn Transport>,
    partner_id: String,
    text: String,
) {
    match state.upgrade() {
        Some(state) => {
            append_response(&state, transport.as_ref(), &partner_id, &text);
        }
        None => debug!("Conversation closed before response from {} fired", partner_id),
    }
}
