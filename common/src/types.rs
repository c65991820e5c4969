use serde::{Deserialize, Serialize};

/// A single slide of a biography deck.
///
/// Field names follow the camelCase payload the model emits after the
/// `SLIDES_JSON:` sentinel, so a slide can be decoded straight from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Slide {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            image_url: None,
            image_search_term: None,
            location: None,
        }
    }

    pub fn with_image_search_term(mut self, term: impl Into<String>) -> Self {
        self.image_search_term = Some(term.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Search term to use for image lookup, if it carries any text.
    pub fn search_term(&self) -> Option<&str> {
        self.image_search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self { name: name.into(), lat, lng }
    }
}

/// A bare latitude/longitude pair, as returned by the coordinate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker tag used when a transcript is rendered as plain text.
    pub fn tag(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Which screen is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Chat,
    Graph,
    Slideshow,
}

/// One image offered by the image search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_decodes_model_payload_entry() {
        let raw = r#"{
            "id": "1",
            "title": "Մանկություն",
            "content": "Ծնվել է...",
            "imageSearchTerm": "young Einstein",
            "location": { "name": "Ulm", "lat": 48.4011, "lng": 9.9876 }
        }"#;
        let slide: Slide = serde_json::from_str(raw).unwrap();
        assert_eq!(slide.id, "1");
        assert_eq!(slide.search_term(), Some("young Einstein"));
        assert_eq!(slide.location.as_ref().map(|l| l.name.as_str()), Some("Ulm"));
        assert_eq!(slide.image_url, None);
    }

    #[test]
    fn blank_search_term_is_treated_as_missing() {
        let slide = Slide::new("1", "A", "").with_image_search_term("   ");
        assert_eq!(slide.search_term(), None);
    }

    #[test]
    fn slide_serializes_camel_case_and_skips_absent_fields() {
        let slide = Slide::new("2", "B", "text").with_image_search_term("curie lab");
        let json = serde_json::to_string(&slide).unwrap();
        assert_eq!(
            json,
            r#"{"id":"2","title":"B","content":"text","imageSearchTerm":"curie lab"}"#
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::assistant("barev");
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"role":"assistant","content":"barev"}"#
        );
    }
}
