//! Conversation log entries and chat replies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// One inbound message and the reply it produced. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationLogEntry {
    pub id: Uuid,
    pub owner_id: String,
    pub user_message: String,
    pub assistant_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_program: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationLogEntry {
    pub fn new(
        owner_id: impl Into<String>,
        user_message: impl Into<String>,
        assistant_response: impl Into<String>,
        recommended_program: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            user_message: user_message.into(),
            assistant_response: assistant_response.into(),
            recommended_program,
            created_at: Utc::now(),
        }
    }
}

/// Terminal outcome of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// A schedule was registered for the last recommended program.
    ScheduleConfirmation { text: String, program: String },
    /// A catalog program was pitched.
    Recommendation { text: String, program: String },
    /// Anything else: companionship, apologies, off-catalog suggestions.
    AssistantAnswer { text: String },
}

impl ChatReply {
    pub fn text(&self) -> &str {
        match self {
            Self::ScheduleConfirmation { text, .. }
            | Self::Recommendation { text, .. }
            | Self::AssistantAnswer { text } => text,
        }
    }

    /// Program recorded in the log for this reply. Only recommendations set it.
    pub fn recommended_program(&self) -> Option<&str> {
        match self {
            Self::Recommendation { program, .. } => Some(program),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScheduleConfirmation { .. } => "schedule_confirmation",
            Self::Recommendation { .. } => "recommendation",
            Self::AssistantAnswer { .. } => "assistant_answer",
        }
    }

    /// Wire shape: `{user_message, <kind>: text, ...}`.
    pub fn to_json(&self, user_message: &str) -> serde_json::Value {
        let mut value = json!({
            "user_message": user_message,
            self.kind(): self.text(),
        });
        match self {
            Self::Recommendation { program, .. } => {
                value["recommended_program"] = json!(program);
            }
            Self::ScheduleConfirmation { program, .. } => {
                value["program"] = json!(program);
            }
            Self::AssistantAnswer { .. } => {}
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_json_carries_program() {
        let reply = ChatReply::Recommendation {
            text: "요가교실 어떠세요?".into(),
            program: "요가교실".into(),
        };
        let json = reply.to_json("심심해요");
        assert_eq!(json["user_message"], "심심해요");
        assert_eq!(json["recommendation"], "요가교실 어떠세요?");
        assert_eq!(json["recommended_program"], "요가교실");
        assert!(json.get("assistant_answer").is_none());
    }

    #[test]
    fn only_recommendations_are_logged_with_program() {
        let confirm = ChatReply::ScheduleConfirmation {
            text: "ok".into(),
            program: "서예".into(),
        };
        assert_eq!(confirm.recommended_program(), None);
        assert_eq!(confirm.to_json("예")["schedule_confirmation"], "ok");

        let answer = ChatReply::AssistantAnswer { text: "네".into() };
        assert_eq!(answer.recommended_program(), None);
        assert_eq!(answer.kind(), "assistant_answer");
    }
}
