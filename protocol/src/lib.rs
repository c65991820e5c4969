use bioslide_common::{ImageCandidate, Message, Slide, View};
use serde::{Deserialize, Serialize};

/// Events emitted by the conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionConfigured { model: String },
    TurnStarted,
    AgentMessageDelta { delta: String },
    AgentMessage { message: String },
    /// The model finished gathering requirements and the deck was replaced.
    SlidesReady { count: usize },
    ViewChanged { view: View },
    TurnComplete,
    /// Input was dropped because a turn is still in flight.
    Busy,
    Error { message: String },
    ResetComplete,
    ShutdownComplete,
}

/// Operations submitted to the conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    UserInput { text: String },
    Reset,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub op: Op,
}

impl Submission {
    pub fn new(op: Op) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            op,
        }
    }
}

/// Request body for one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Outcome of one conversation turn.
///
/// `slides` is only present when `complete` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<Slide>>,
    pub complete: bool,
}

impl ChatTurnResponse {
    pub fn question(message: impl Into<String>) -> Self {
        Self { message: message.into(), slides: None, complete: false }
    }

    pub fn deck(message: impl Into<String>, slides: Vec<Slide>) -> Self {
        Self { message: message.into(), slides: Some(slides), complete: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSearchRequest {
    pub search_term: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSearchResponse {
    #[serde(default)]
    pub images: Vec<ImageCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatesRequest {
    pub location_name: String,
}

/// Error payload shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_event() {
        let event = Event::SlidesReady { count: 3 };
        let serialized = serde_json::to_string(&event).unwrap();
        assert_eq!(serialized, r#"{"type":"slides_ready","count":3}"#);
    }

    #[test]
    fn incomplete_turn_omits_slides() {
        let resp = ChatTurnResponse::question("Ո՞ր ոլորտն է քեզ հետաքրքրում");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["complete"], false);
        assert!(json.get("slides").is_none());
    }

    #[test]
    fn request_payloads_use_camel_case() {
        let req = CoordinatesRequest { location_name: "Yerevan".into() };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"locationName":"Yerevan"}"#);
        let req = ImageSearchRequest { search_term: "Komitas".into() };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"searchTerm":"Komitas"}"#);
    }

    #[test]
    fn image_response_tolerates_missing_images() {
        let resp: ImageSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.images.is_empty());
    }
}
