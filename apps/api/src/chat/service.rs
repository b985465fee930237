//! Session orchestration. Each live `ChatSession` sits behind its own mutex;
//! completed tickets are handed to the `TicketStore`.
//!
//! The mutex is held for the whole turn including the delays. A second
//! message sent while a reply is pending queues behind it, so bot replies
//! always come back in input order. Ticket writes happen after the lock is
//! released and never hold up the session.
//!
//! Sessions unused for longer than `idle_ttl` are dropped by
//! `sweep_idle_sessions`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::chat::engine::{ChatSession, EngineSettings, Outcome};
use crate::chat::knowledge::KnowledgeBase;
use crate::errors::AppError;
use crate::models::chat::{ChatMessage, ConversationState, QuickAction};
use crate::models::ticket::{SupportTicket, TicketDraft};
use crate::tickets::TicketStore;

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub typing_delay: Duration,
    pub handoff_delay: Duration,
    /// How long a session may sit unused before it is evicted.
    pub idle_ttl: Duration,
    pub engine: EngineSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(1000),
            handoff_delay: Duration::from_millis(1500),
            idle_ttl: Duration::from_secs(30 * 60),
            engine: EngineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: ConversationState,
    pub failed_attempts: u32,
    pub ticket_draft: TicketDraft,
    pub messages: Vec<ChatMessage>,
}

impl SessionSnapshot {
    fn of(session: &ChatSession) -> Self {
        Self {
            session_id: session.id(),
            state: session.state(),
            failed_attempts: session.failed_attempts(),
            ticket_draft: session.ticket_draft().clone(),
            messages: session.messages().to_vec(),
        }
    }
}

/// Result of one turn: the messages it appended (user line included) and
/// where the conversation ended up. `outcome` is `None` for ignored input
/// and for control actions that produce no classification.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub session_id: Uuid,
    pub outcome: Option<Outcome>,
    pub state: ConversationState,
    pub failed_attempts: u32,
    pub messages: Vec<ChatMessage>,
}

impl TurnResult {
    fn of(session: &ChatSession, outcome: Option<Outcome>, from: usize) -> Self {
        Self {
            session_id: session.id(),
            outcome,
            state: session.state(),
            failed_attempts: session.failed_attempts(),
            messages: session.messages_since(from).to_vec(),
        }
    }
}

/// A session plus the last time a request touched it.
struct LiveSession {
    chat: ChatSession,
    last_active: Instant,
}

impl LiveSession {
    fn new(chat: ChatSession) -> Self {
        Self {
            chat,
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut ChatSession {
        self.last_active = Instant::now();
        &mut self.chat
    }
}

type SessionHandle = Arc<Mutex<LiveSession>>;

pub struct ChatService {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    knowledge: Arc<KnowledgeBase>,
    tickets: Arc<dyn TicketStore>,
    settings: ServiceSettings,
}

impl ChatService {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        tickets: Arc<dyn TicketStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            knowledge,
            tickets,
            settings,
        }
    }

    pub fn ticket_backend(&self) -> &'static str {
        self.tickets.backend()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn start_session(&self) -> SessionSnapshot {
        let session = ChatSession::new(self.settings.engine);
        let snapshot = SessionSnapshot::of(&session);
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::new(Mutex::new(LiveSession::new(session))));
        info!("Started chat session {}", snapshot.session_id);
        snapshot
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let handle = self.session(id).await?;
        let mut live = handle.lock().await;
        Ok(SessionSnapshot::of(live.touch()))
    }

    pub async fn reset_session(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let handle = self.session(id).await?;
        let mut live = handle.lock().await;
        let session = live.touch();
        session.reset();
        info!("Reset chat session {id}");
        Ok(SessionSnapshot::of(session))
    }

    pub async fn close_session(&self, id: Uuid) -> Result<(), AppError> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(session_not_found(id));
        }
        info!("Closed chat session {id}");
        Ok(())
    }

    /// Runs one user turn. Blank input is ignored and returns an empty turn.
    pub async fn submit_message(&self, id: Uuid, text: &str) -> Result<TurnResult, AppError> {
        let handle = self.session(id).await?;
        let mut live = handle.lock().await;
        let session = live.touch();
        let start = session.messages().len();

        if session.record_user_message(text).is_err() {
            return Ok(TurnResult::of(session, None, start));
        }

        tokio::time::sleep(self.settings.typing_delay).await;

        let result = {
            let mut rng = rand::thread_rng();
            session.respond(&self.knowledge, text, &mut rng)
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => return Ok(TurnResult::of(session, None, start)),
        };

        let created = match &outcome {
            Outcome::EscalationAcknowledged => {
                tokio::time::sleep(self.settings.handoff_delay).await;
                session.request_contact_email();
                None
            }
            Outcome::TicketCreated { ticket } => Some(ticket.clone()),
            _ => None,
        };

        let turn = TurnResult::of(session, Some(outcome), start);
        drop(live);

        if let Some(ticket) = created {
            self.persist_ticket(&ticket).await;
        }
        Ok(turn)
    }

    /// Dispatches a quick-action button. Suggestions submit their canned
    /// text; `ContinueWithAi` dismisses the hand-off offer.
    pub async fn trigger_action(
        &self,
        id: Uuid,
        action: QuickAction,
    ) -> Result<TurnResult, AppError> {
        if let Some(text) = action.message() {
            return self.submit_message(id, text).await;
        }

        let handle = self.session(id).await?;
        let mut live = handle.lock().await;
        let session = live.touch();
        let start = session.messages().len();
        session.continue_with_ai();
        Ok(TurnResult::of(session, None, start))
    }

    pub async fn list_tickets(&self) -> Result<Vec<SupportTicket>, AppError> {
        Ok(self.tickets.list().await?)
    }

    /// Drops every session unused for at least `idle_ttl`. Sessions in the
    /// middle of a turn are locked and always kept.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.settings.idle_ttl;
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(live) => now.duration_since(live.last_active) < ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Write failures are logged and swallowed; the user has already been
    /// shown the confirmation.
    async fn persist_ticket(&self, ticket: &SupportTicket) {
        match self.tickets.append(ticket).await {
            Ok(()) => info!(
                "Persisted support ticket #{} via {}",
                ticket.id,
                self.tickets.backend()
            ),
            Err(e) => error!(
                "Failed to persist support ticket #{} via {}: {e}",
                ticket.id,
                self.tickets.backend()
            ),
        }
    }

    async fn session(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| session_not_found(id))
    }
}

/// Periodically evicts idle sessions. Runs until the service is dropped
/// by every other owner.
pub async fn sweep_idle_sessions(service: Arc<ChatService>) {
    let period = (service.settings.idle_ttl / 4).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        if Arc::strong_count(&service) == 1 {
            debug!("Chat service dropped, stopping idle sweep");
            return;
        }
        let evicted = service.evict_idle().await;
        if evicted > 0 {
            info!("Evicted {evicted} idle chat session(s)");
        }
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Chat session {id} not found"))
}
