//! Deserializers for form-style JSON bodies.
//!
//! Browser forms post every field as a string and send `""` for fields the
//! user left empty. Used with `#[serde(default, deserialize_with = "...")]`
//! these map such values onto `Option`s, where `None` means "leave unchanged".

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// `null`, `""` and whitespace-only strings become `None`; anything else is
/// kept trimmed.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

/// Accepts `3`, `"3"`, `""` or `null` for an optional integer field.
pub fn optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map_err(|_| de::Error::custom(format!("expected a whole number, got \"{text}\"")))?
        }
    };

    i32::try_from(number)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("number {number} is out of range")))
}
