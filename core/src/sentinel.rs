//! Extraction of the structured deck from free-form model output.
//!
//! The model is told to write `SLIDES_JSON:` followed by a JSON object with
//! a `slides` array once it has enough information. Anything else is a
//! clarifying question.

use bioslide_common::Slide;
use serde::Deserialize;
use std::collections::HashSet;

pub const SLIDES_SENTINEL: &str = "SLIDES_JSON:";

/// What a model reply turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Plain text; the conversation continues.
    Incomplete { message: String },
    /// Prose before the sentinel plus the decoded deck.
    Complete { message: String, slides: Vec<Slide> },
}

#[derive(Debug, Deserialize)]
struct SlidesPayload {
    slides: Vec<Slide>,
}

pub fn parse_model_reply(text: &str) -> ModelReply {
    let Some(pos) = text.find(SLIDES_SENTINEL) else {
        return ModelReply::Incomplete { message: text.trim().to_string() };
    };

    let prose = text[..pos].trim();
    let payload = &text[pos + SLIDES_SENTINEL.len()..];

    match decode_payload(payload) {
        Some(slides) if !slides.is_empty() => ModelReply::Complete {
            message: prose.to_string(),
            slides: ensure_unique_ids(slides),
        },
        Some(_) => {
            tracing::warn!("model emitted {SLIDES_SENTINEL} with an empty slides array");
            ModelReply::Incomplete { message: text.trim().to_string() }
        }
        None => {
            tracing::warn!("model emitted {SLIDES_SENTINEL} but the payload did not parse");
            ModelReply::Incomplete { message: text.trim().to_string() }
        }
    }
}

/// Best-effort decode: skip code fences and take the outermost `{ ... }` span.
fn decode_payload(payload: &str) -> Option<Vec<Slide>> {
    let start = payload.find('{')?;
    let end = payload.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<SlidesPayload>(&payload[start..=end])
        .ok()
        .map(|p| p.slides)
}

/// Give every slide a non-empty id that no other slide in the deck uses.
/// Ids the model got right are left alone.
pub fn ensure_unique_ids(slides: Vec<Slide>) -> Vec<Slide> {
    let mut seen: HashSet<String> = HashSet::new();
    let taken: HashSet<String> = slides.iter().map(|s| s.id.trim().to_string()).collect();

    slides
        .into_iter()
        .enumerate()
        .map(|(index, mut slide)| {
            let id = slide.id.trim().to_string();
            if id.is_empty() || seen.contains(&id) {
                let mut candidate = (index + 1).to_string();
                let mut suffix = 1;
                while seen.contains(&candidate) || taken.contains(&candidate) {
                    candidate = format!("{}-{suffix}", index + 1);
                    suffix += 1;
                }
                slide.id = candidate;
            } else {
                slide.id = id;
            }
            seen.insert(slide.id.clone());
            slide
        })
        .collect()
}

/// Strip a surrounding Markdown code fence such as three backticks plus `json`.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_question_is_incomplete() {
        let reply = parse_model_reply("  Քանի՞ սլայդ ես ուզում:  ");
        assert_eq!(
            reply,
            ModelReply::Incomplete { message: "Քանի՞ սլայդ ես ուզում:".into() }
        );
    }

    #[test]
    fn sentinel_with_valid_payload_is_complete() {
        let text = r#"Շատ լավ, ահա քո ներկայացումը:
SLIDES_JSON:
{
  "slides": [
    {"id": "1", "title": "A", "content": "a", "imageSearchTerm": "Einstein young"},
    {"id": "2", "title": "B", "content": "b", "location": {"name": "Bern", "lat": 46.948, "lng": 7.4474}},
    {"id": "3", "title": "C", "content": "c"}
  ]
}"#;
        let ModelReply::Complete { message, slides } = parse_model_reply(text) else {
            panic!("expected a complete reply");
        };
        assert_eq!(message, "Շատ լավ, ահա քո ներկայացումը:");
        let titles: Vec<_> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(slides[1].location.as_ref().map(|l| l.lat), Some(46.948));
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let text = "SLIDES_JSON:\n```json\n{\"slides\":[{\"id\":\"1\",\"title\":\"A\",\"content\":\"\"}]}\n```";
        match parse_model_reply(text) {
            ModelReply::Complete { message, slides } => {
                assert!(message.is_empty());
                assert_eq!(slides.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_json_after_sentinel_is_incomplete() {
        let text = "Ահա:\nSLIDES_JSON: { \"slides\": [ {\"id\": \"1\", \"title\": } ";
        assert_eq!(
            parse_model_reply(text),
            ModelReply::Incomplete { message: text.trim().to_string() }
        );
    }

    #[test]
    fn sentinel_without_object_is_incomplete() {
        assert!(matches!(
            parse_model_reply("SLIDES_JSON: coming soon"),
            ModelReply::Incomplete { .. }
        ));
    }

    #[test]
    fn empty_slides_array_is_incomplete() {
        assert!(matches!(
            parse_model_reply("SLIDES_JSON: {\"slides\": []}"),
            ModelReply::Incomplete { .. }
        ));
    }

    #[test]
    fn duplicate_and_blank_ids_are_repaired() {
        let slides = vec![
            Slide::new("1", "A", ""),
            Slide::new("1", "B", ""),
            Slide::new("", "C", ""),
            Slide::new("2", "D", ""),
        ];
        let ids: Vec<_> = ensure_unique_ids(slides).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["1", "2-1", "3", "2"]);
    }

    #[test]
    fn correct_ids_are_untouched() {
        let slides = vec![Slide::new("intro", "A", ""), Slide::new("end", "B", "")];
        let ids: Vec<_> = ensure_unique_ids(slides).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["intro", "end"]);
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"lat\":1}\n```"), "{\"lat\":1}");
        assert_eq!(strip_code_fences(" {\"lat\":1} "), "{\"lat\":1}");
    }
}
