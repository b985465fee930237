use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New tickets are always `Open`; the other states are set by the
/// ticketing backend and only ever read back.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// A hand-off request captured by the chat. Created once per completed
/// escalation and only after both email and message are in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    /// Four-digit reference quoted back to the user.
    pub id: u16,
    pub email: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// In-progress contact details collected during escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub email: Option<String>,
    pub message: Option<String>,
}

impl TicketDraft {
    pub fn clear(&mut self) {
        self.email = None;
        self.message = None;
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_clear_empties_both_fields() {
        let mut draft = TicketDraft {
            email: Some("user@example.com".to_string()),
            message: Some("help".to_string()),
        };
        assert!(!draft.is_empty());
        draft.clear();
        assert!(draft.is_empty());
    }

    #[test]
    fn test_ticket_serializes_status_snake_case() {
        let ticket = SupportTicket {
            id: 4821,
            email: "user@example.com".to_string(),
            message: "my CV didn't upload".to_string(),
            status: TicketStatus::InProgress,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["id"], 4821);
    }
}
