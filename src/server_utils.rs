use rand::Rng;
use serde_json::Value;

use crate::types::GameMode;

const MAX_ROOM_CODE_LEN: usize = 16;

pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(16).collect()
}

/// Room codes are free-form but short: ASCII letters, digits, `-` and `_`.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ROOM_CODE_LEN {
        return None;
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn parse_mode(raw: &str) -> Option<GameMode> {
    GameMode::parse(raw.trim().to_ascii_lowercase().as_str())
}

/// Blank means "pick one for me"; anything else must be a u32.
pub fn parse_seed(raw: Option<&str>) -> Result<Option<u32>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("seed must be an integer in 0..={}", u32::MAX)),
    }
}

/// Same rules as [`parse_seed`] for JSON bodies, which may send a number.
pub fn parse_seed_value(value: Option<&Value>) -> Result<Option<u32>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => parse_seed(Some(raw)),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|seed| u32::try_from(seed).ok())
            .map(Some)
            .ok_or_else(|| format!("seed must be an integer in 0..={}", u32::MAX)),
        Some(_) => Err("seed must be a number or a string".to_string()),
    }
}

pub fn random_room_code() -> String {
    rand::rng().random_range(1000..=9999).to_string()
}
