//! Decimal fields arrive either as JSON numbers or as decimal strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn to_f64<E: serde::de::Error>(value: NumberOrString) -> Result<f64, E> {
    match value {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid decimal: {}", s))),
    }
}

pub fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    to_f64(NumberOrString::deserialize(deserializer)?)
}

pub fn flexible_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => to_f64(value).map(Some),
        None => Ok(None),
    }
}

/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
