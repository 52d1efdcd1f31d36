use serde::{Deserialize, Serialize};

/// Reply from `POST /chatbot/session/new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reply from `POST /chatbot/message`.
///
/// The simple backend answers `{"reply": "..."}`; the knowledge-base backend
/// answers `{"session_id": "...", "response": {"message": "...", "suggestions": [...]}}`.
/// Both read into the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireReply")]
pub struct ChatReply {
    pub message: String,
    pub suggestions: Vec<String>,
    pub knowledge_sources: Vec<serde_json::Value>,
    pub personalized: bool,
    pub session_id: Option<String>,
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    response: Option<BotResponse>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct BotResponse {
    message: String,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    knowledge_sources: Vec<serde_json::Value>,
    #[serde(default)]
    personalized: bool,
}

impl TryFrom<WireReply> for ChatReply {
    type Error = String;

    fn try_from(wire: WireReply) -> Result<Self, Self::Error> {
        match (wire.response, wire.reply) {
            (Some(response), _) => Ok(Self {
                message: response.message,
                suggestions: response.suggestions,
                knowledge_sources: response.knowledge_sources,
                personalized: response.personalized,
                session_id: wire.session_id,
            }),
            (None, Some(reply)) => Ok(Self {
                message: reply,
                suggestions: Vec::new(),
                knowledge_sources: Vec::new(),
                personalized: false,
                session_id: wire.session_id,
            }),
            (None, None) => Err("chat reply has neither `reply` nor `response`".to_string()),
        }
    }
}

/// Summary of a chatbot session. The backend does not fix a schema for it,
/// so the body is kept as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatSessionSummary(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_omits_missing_session() {
        let body = serde_json::to_value(ChatRequest {
            message: "any jobs?".to_string(),
            session_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "any jobs?" }));

        let body = serde_json::to_value(ChatRequest {
            message: "hi".to_string(),
            session_id: Some("anon-session".to_string()),
        })
        .unwrap();
        assert_eq!(body["session_id"], "anon-session");
    }

    #[test]
    fn test_simple_reply_shape() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"reply": "Tailor your resume to the role."}"#).unwrap();
        assert_eq!(reply.message, "Tailor your resume to the role.");
        assert!(reply.suggestions.is_empty());
        assert_eq!(reply.session_id, None);
    }

    #[test]
    fn test_knowledge_base_reply_shape() {
        let body = r#"{
            "session_id": "s1",
            "response": {
                "message": "Try the STAR method",
                "suggestions": ["Practice out loud", "Prepare examples"],
                "knowledge_sources": ["interview_001"],
                "context_used": 2,
                "personalized": true
            }
        }"#;
        let reply: ChatReply = serde_json::from_str(body).unwrap();
        assert_eq!(reply.message, "Try the STAR method");
        assert_eq!(reply.suggestions, ["Practice out loud", "Prepare examples"]);
        assert_eq!(reply.knowledge_sources, [serde_json::json!("interview_001")]);
        assert!(reply.personalized);
        assert_eq!(reply.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_reply_without_message_rejected() {
        let err = serde_json::from_str::<ChatReply>(r#"{"session_id": "s1"}"#).unwrap_err();
        assert!(err.to_string().contains("neither"));
    }
}
