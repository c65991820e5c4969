use bioslide_common::Coordinates;
use bioslide_protocol::CoordinatesRequest;

use crate::client::{ModelClient, ModelPrompt};
use crate::error::{BioslideError, Result};
use crate::prompt::render_coordinates_prompt;
use crate::sentinel::strip_code_fences;

/// Ask the model for the coordinates of a named place.
pub async fn lookup_coordinates(
    client: &(dyn ModelClient + Send + Sync),
    request: &CoordinatesRequest,
) -> Result<Coordinates> {
    let name = request.location_name.trim();
    if name.is_empty() {
        return Err(BioslideError::Validation("Location name is required".to_string()));
    }

    let prompt = ModelPrompt {
        system: String::new(),
        messages: vec![bioslide_common::Message::user(render_coordinates_prompt(name))],
    };
    let text = client
        .complete(prompt)
        .await
        .map_err(|e| BioslideError::Request(e.to_string()))?;
    parse_coordinates(&text)
}

pub fn parse_coordinates(text: &str) -> Result<Coordinates> {
    let body = strip_code_fences(text);
    let coords: Coordinates = serde_json::from_str(body)
        .map_err(|e| BioslideError::Coordinates(format!("{e}: {body}")))?;
    if !(-90.0..=90.0).contains(&coords.lat) || !(-180.0..=180.0).contains(&coords.lng) {
        return Err(BioslideError::Coordinates(format!("out of range: {body}")));
    }
    Ok(coords)
}
