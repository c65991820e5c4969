use crate::sentinel::SLIDES_SENTINEL;

/// Render the fixed instruction that steers the model through the
/// requirements conversation and tells it how to hand over the deck.
pub fn render_system_instruction(language: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "You are a helpful assistant for school students aged 10-16 creating biography presentations in {language}."
    ));
    lines.push("You should ask clarifying questions to understand what presentation they want to create.".to_string());
    lines.push(
        "Ask about: the person's life aspects to focus on (art, science, personal life, etc.), the number of slides (suggest 5-10), and the depth of content."
            .to_string(),
    );
    lines.push(String::new());
    lines.push("After gathering enough information, respond with a JSON object containing the slides.".to_string());
    lines.push("The response should be in this exact format when you have enough information:".to_string());
    lines.push(SLIDES_SENTINEL.to_string());
    lines.push(format!(
        r#"{{
  "slides": [
    {{
      "id": "1",
      "title": "Slide title in {language}",
      "content": "Detailed content in {language}",
      "imageSearchTerm": "relevant search term in English",
      "location": {{ "name": "City Name", "lat": 40.1811, "lng": 44.5136 }}
    }}
  ]
}}"#
    ));
    lines.push("The \"location\" field is optional; include it only when a place is relevant to the slide.".to_string());
    lines.push("Do not put comments inside the JSON.".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Respond in {language}. If you need more information, ask a question. If you have enough information, generate the slides JSON."
    ));
    lines.join("\n")
}

pub fn render_coordinates_prompt(location_name: &str) -> String {
    format!(
        "Return ONLY a JSON object with the coordinates for {location_name}.\nFormat: {{\"lat\": latitude, \"lng\": longitude}}\nDo not include any other text."
    )
}
