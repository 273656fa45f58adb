use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{entry::parse_date, Enrichment, Rating},
    services::llm::LanguageModel,
};

/// Platforms the model may choose from
pub const PLATFORMS: [&str; 8] = [
    "Netflix",
    "Disney+",
    "Prime Video",
    "Apple TV+",
    "Watcha",
    "TVING",
    "Wavve",
    "Cinema",
];

/// Builds the enrichment prompt. The reply must be a bare JSON object.
pub fn build_prompt(title: &str, combined_comment: &str, language: &str) -> String {
    format!(
        r#"Title: '{title}'
Accumulated comments: '{comment}'

Using the information above, answer with a JSON object only.

1. platform: exactly one of {platforms}.
2. rating: a score between 1.0 and 5.0 in steps of 0.5, judged from the overall tone of all comments.
3. release_date: first release date (YYYY-MM-DD).
4. running_time: total running time in minutes. Number only.
5. cast_crew: the main director and two or three lead actors, comma separated, written in {language}. Mark the director, e.g. "Bong Joon-ho (director), Song Kang-ho".

Example:
{{
    "platform": "Netflix",
    "rating": 4.5,
    "release_date": "2025-01-01",
    "running_time": 130,
    "cast_crew": "Lee Eung-bok (director), Kim Go-eun, Gong Yoo"
}}"#,
        title = title,
        comment = combined_comment,
        platforms = PLATFORMS.join(", "),
        language = language,
    )
}

/// Prompts the model and parses its reply
pub async fn analyze(
    model: &dyn LanguageModel,
    title: &str,
    combined_comment: &str,
    language: &str,
) -> AppResult<Enrichment> {
    let prompt = build_prompt(title, combined_comment, language);
    let reply = model.complete(&prompt).await?;
    let enrichment = parse_enrichment(&reply)?;

    tracing::info!(
        title = %title,
        model = %model.name(),
        platform = %enrichment.platform,
        rating = %enrichment.rating,
        "Entry enriched"
    );

    Ok(enrichment)
}

/// Parses a model reply into an `Enrichment`.
///
/// Markdown fences and surrounding prose are ignored. Every field except
/// `rating` falls back to a default when missing or malformed.
pub fn parse_enrichment(reply: &str) -> AppResult<Enrichment> {
    let json = extract_json(reply).ok_or_else(|| {
        AppError::Llm(format!("No JSON object in model reply: {}", snippet(reply)))
    })?;

    let value: Value = serde_json::from_str(&json)
        .map_err(|e| AppError::Llm(format!("Model reply is not valid JSON: {}", e)))?;
    let fields = value
        .as_object()
        .ok_or_else(|| AppError::Llm("Model reply is not a JSON object".to_string()))?;

    let rating = fields
        .get("rating")
        .and_then(leading_number)
        .and_then(Rating::new)
        .ok_or_else(|| AppError::Llm("Model reply has no usable rating".to_string()))?;

    Ok(Enrichment {
        platform: text_field(fields, "platform"),
        rating,
        release_date: fields
            .get("release_date")
            .and_then(Value::as_str)
            .and_then(parse_date),
        running_time: fields
            .get("running_time")
            .and_then(leading_number)
            .filter(|m| *m >= 0.0)
            .map(|m| m.round() as u32)
            .unwrap_or(0),
        cast_crew: text_field(fields, "cast_crew"),
    })
}

/// Outermost `{...}` of the reply, after dropping code fences
fn extract_json(reply: &str) -> Option<String> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let trimmed = cleaned.trim();

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;

    if start <= end {
        Some(trimmed[start..=end].to_string())
    } else {
        None
    }
}

/// Strings as-is, arrays joined with ", ", numbers stringified
fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::trim))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// A JSON number, or the first number embedded in a string ("130분" → 130).
/// A `-` directly before the digits is kept.
fn leading_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let negative = s[..start].ends_with('-');
            let digits: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let number: f64 = digits.trim_end_matches('.').parse().ok()?;
            Some(if negative { -number } else { number })
        }
        _ => None,
    }
}

fn snippet(reply: &str) -> String {
    reply.chars().take(120).collect()
}
