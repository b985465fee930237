//! Dialogue state machine for one chat session.
//!
//! `ChatSession` is pure: it owns the transcript and the conversation state
//! and never sleeps or touches storage. Delays and ticket persistence belong
//! to `chat::service`.
//!
//! States: Normal → (escalation) → AwaitingEmail → AwaitingMessage → Normal.
//! While awaiting contact details, input short-circuits to the hand-off
//! handlers and is never matched against the knowledge base.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::knowledge::{is_escalation_request, KnowledgeBase};
use crate::chat::validation::{
    normalize_input, truncate_echo, validate_email, ChatError, DEFAULT_ECHO_MAX_CHARS,
};
use crate::models::chat::{
    ChatMessage, ConversationState, QuickAction, ESCALATION_CHOICES, QUICK_ACTION_MENU,
};
use crate::models::ticket::{SupportTicket, TicketDraft, TicketStatus};

pub const WELCOME_MESSAGE: &str = "Hi! I'm the CVision assistant. I can answer questions about your CV, job search, applications and subscription. Pick a topic below or type your question.";
pub const FALLBACK_MESSAGE: &str = "I'm not sure I understood that. Try rephrasing, or pick one of the topics below.";
pub const ESCALATION_OFFER: &str = "I'm having trouble answering that. Would you like me to connect you with a human support agent?";
pub const ESCALATION_ACK: &str = "I'll connect you with our support team. I just need a couple of details first.";
pub const EMAIL_PROMPT: &str = "Please enter your email address so our team can reach you.";
pub const INVALID_EMAIL_PROMPT: &str = "That doesn't look like a valid email address. Please enter one like name@example.com.";
pub const MESSAGE_PROMPT: &str = "Thanks! Now briefly describe what you need help with.";
pub const CONTINUE_PROMPT: &str = "No problem, let's keep going. What would you like to know?";
pub const ANYTHING_ELSE: &str = "Is there anything else I can help you with?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Consecutive misses before the hand-off offer is shown.
    pub escalation_threshold: u32,
    pub echo_max_chars: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            escalation_threshold: 2,
            echo_max_chars: DEFAULT_ECHO_MAX_CHARS,
        }
    }
}

/// What a single `respond` call did. The transcript already holds the bot
/// messages; the outcome tells the caller what follow-up work is due.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Answered { category: String },
    Unmatched { offer_escalation: bool },
    /// Acknowledged; the caller must follow up with `request_contact_email`.
    EscalationAcknowledged,
    EmailCaptured,
    InvalidEmail,
    TicketCreated { ticket: SupportTicket },
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    state: ConversationState,
    failed_attempts: u32,
    ticket_draft: TicketDraft,
    messages: Vec<ChatMessage>,
    settings: EngineSettings,
}

impl ChatSession {
    pub fn new(settings: EngineSettings) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            state: ConversationState::Normal,
            failed_attempts: 0,
            ticket_draft: TicketDraft::default(),
            messages: Vec::new(),
            settings,
        };
        session.reset();
        session
    }

    /// Back to a fresh conversation: Normal state, no misses, empty draft,
    /// and a transcript holding only the welcome message.
    pub fn reset(&mut self) {
        self.state = ConversationState::Normal;
        self.failed_attempts = 0;
        self.ticket_draft.clear();
        self.messages.clear();
        self.push_bot_with_actions(WELCOME_MESSAGE, QUICK_ACTION_MENU);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn ticket_draft(&self) -> &TicketDraft {
        &self.ticket_draft
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages appended after the first `from` entries.
    pub fn messages_since(&self, from: usize) -> &[ChatMessage] {
        self.messages.get(from..).unwrap_or(&[])
    }

    pub fn record_user_message(&mut self, text: &str) -> Result<(), ChatError> {
        let text = normalize_input(text)?;
        self.messages.push(ChatMessage::user(text));
        Ok(())
    }

    /// Computes the bot reply to `text` and applies the state transition.
    pub fn respond<R: Rng + ?Sized>(
        &mut self,
        knowledge: &KnowledgeBase,
        text: &str,
        rng: &mut R,
    ) -> Result<Outcome, ChatError> {
        let text = normalize_input(text)?;

        let outcome = match self.state {
            ConversationState::AwaitingEmail => self.handle_email(text),
            ConversationState::AwaitingMessage => self.handle_ticket_message(text, rng),
            ConversationState::Normal => self.handle_normal(knowledge, text, rng),
        };

        debug!(
            "Session {} turn: {:?} (state={:?}, failed_attempts={})",
            self.id, outcome, self.state, self.failed_attempts
        );
        Ok(outcome)
    }

    /// Second half of the escalation sequence, run after the hand-off delay.
    pub fn request_contact_email(&mut self) {
        self.state = ConversationState::AwaitingEmail;
        self.push_bot(EMAIL_PROMPT);
    }

    /// The user declined the hand-off offer.
    pub fn continue_with_ai(&mut self) {
        self.failed_attempts = 0;
        self.push_bot_with_actions(CONTINUE_PROMPT, QUICK_ACTION_MENU);
    }

    fn handle_normal<R: Rng + ?Sized>(
        &mut self,
        knowledge: &KnowledgeBase,
        text: &str,
        rng: &mut R,
    ) -> Outcome {
        if is_escalation_request(text) {
            self.failed_attempts = 0;
            self.ticket_draft.clear();
            self.push_bot(ESCALATION_ACK);
            return Outcome::EscalationAcknowledged;
        }

        if let Some(entry) = knowledge.classify(text) {
            self.failed_attempts = 0;
            let reply = entry.pick_response(rng).unwrap_or(FALLBACK_MESSAGE);
            self.push_bot(reply);
            return Outcome::Answered {
                category: entry.category.clone(),
            };
        }

        self.failed_attempts += 1;
        let offer_escalation = self.failed_attempts >= self.settings.escalation_threshold;
        if offer_escalation {
            self.push_bot(FALLBACK_MESSAGE);
            self.push_bot_with_actions(ESCALATION_OFFER, ESCALATION_CHOICES);
        } else {
            self.push_bot_with_actions(FALLBACK_MESSAGE, QUICK_ACTION_MENU);
        }
        Outcome::Unmatched { offer_escalation }
    }

    fn handle_email(&mut self, text: &str) -> Outcome {
        match validate_email(text) {
            Ok(email) => {
                self.ticket_draft.email = Some(email);
                self.state = ConversationState::AwaitingMessage;
                self.push_bot(MESSAGE_PROMPT);
                Outcome::EmailCaptured
            }
            Err(_) => {
                self.push_bot(INVALID_EMAIL_PROMPT);
                Outcome::InvalidEmail
            }
        }
    }

    fn handle_ticket_message<R: Rng + ?Sized>(&mut self, text: &str, rng: &mut R) -> Outcome {
        self.ticket_draft.message = Some(text.to_string());

        let ticket = SupportTicket {
            id: rng.gen_range(1000..=9999),
            email: self.ticket_draft.email.clone().unwrap_or_default(),
            message: text.to_string(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };

        info!("Session {} created support ticket #{}", self.id, ticket.id);

        self.push_bot(format!(
            "Your support ticket #{} has been created. Our team will reach you at {} about: \"{}\"",
            ticket.id,
            ticket.email,
            truncate_echo(&ticket.message, self.settings.echo_max_chars)
        ));
        self.push_bot_with_actions(ANYTHING_ELSE, QUICK_ACTION_MENU);

        self.ticket_draft.clear();
        self.state = ConversationState::Normal;
        Outcome::TicketCreated { ticket }
    }

    fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::bot(text));
    }

    fn push_bot_with_actions(&mut self, text: impl Into<String>, actions: &[QuickAction]) {
        self.messages.push(ChatMessage::bot(text).with_actions(actions));
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
