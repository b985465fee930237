use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// Where the dialogue currently is. Exactly one of these at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Normal,
    AwaitingEmail,
    AwaitingMessage,
}

/// A tappable suggestion attached to a bot message.
///
/// Suggestions carry a canned user message; the two control actions drive the
/// escalation offer shown after repeated misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    UploadCv,
    FindJobs,
    Pricing,
    AccountHelp,
    TalkToHuman,
    ContinueWithAi,
}

/// The fixed menu shown on welcome and after a completed hand-off.
pub const QUICK_ACTION_MENU: &[QuickAction] = &[
    QuickAction::UploadCv,
    QuickAction::FindJobs,
    QuickAction::Pricing,
    QuickAction::AccountHelp,
    QuickAction::TalkToHuman,
];

/// Buttons attached to the escalation offer.
pub const ESCALATION_CHOICES: &[QuickAction] =
    &[QuickAction::TalkToHuman, QuickAction::ContinueWithAi];

impl QuickAction {
    pub fn label(&self) -> &'static str {
        match self {
            QuickAction::UploadCv => "Upload my CV",
            QuickAction::FindJobs => "Find jobs",
            QuickAction::Pricing => "Plans & pricing",
            QuickAction::AccountHelp => "Account help",
            QuickAction::TalkToHuman => "Talk to Human",
            QuickAction::ContinueWithAi => "Continue with AI",
        }
    }

    /// Text submitted on the user's behalf. `None` for actions that are
    /// handled without a user message.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            QuickAction::UploadCv => Some("How do I upload my CV?"),
            QuickAction::FindJobs => Some("How do I search for jobs?"),
            QuickAction::Pricing => Some("What subscription plans do you offer?"),
            QuickAction::AccountHelp => Some("I need help with my account login"),
            QuickAction::TalkToHuman => Some("talk to a human"),
            QuickAction::ContinueWithAi => None,
        }
    }
}

/// One line of the transcript. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_actions: Vec<QuickAction>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: text.into(),
            quick_actions: vec![],
            timestamp: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: text.into(),
            quick_actions: vec![],
            timestamp: Utc::now(),
        }
    }

    pub fn with_actions(mut self, actions: &[QuickAction]) -> Self {
        self.quick_actions = actions.to_vec();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_action_wire_ids_are_snake_case() {
        let json = serde_json::to_string(&QuickAction::ContinueWithAi).unwrap();
        assert_eq!(json, r#""continue_with_ai""#);
        let action: QuickAction = serde_json::from_str(r#""talk_to_human""#).unwrap();
        assert_eq!(action, QuickAction::TalkToHuman);
    }

    #[test]
    fn test_continue_with_ai_sends_no_message() {
        assert!(QuickAction::ContinueWithAi.message().is_none());
        assert_eq!(QuickAction::TalkToHuman.message(), Some("talk to a human"));
    }

    #[test]
    fn test_menu_excludes_continue_with_ai() {
        assert!(!QUICK_ACTION_MENU.contains(&QuickAction::ContinueWithAi));
    }

    #[test]
    fn test_message_without_actions_omits_field() {
        let json = serde_json::to_value(ChatMessage::bot("hi")).unwrap();
        assert!(json.get("quick_actions").is_none());
        assert_eq!(json["sender"], "bot");
    }

    #[test]
    fn test_default_state_is_normal() {
        assert_eq!(ConversationState::default(), ConversationState::Normal);
    }
}
