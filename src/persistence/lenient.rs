//! Forgiving field readers for hand-edited or older documents.
//!
//! Each reader accepts a JSON number or a numeric string and yields `None` for
//! anything else, so the caller substitutes the slot default instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{clamp_loop_count, parse_loop_count};

fn number_or_numeric_string(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Delay in seconds; negative or non-finite values count as missing.
pub fn delay<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_or_numeric_string(&value).filter(|secs| secs.is_finite() && *secs >= 0.0))
}

/// Loop count; present-but-unusable values coerce to 1.
pub fn loop_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(clamp_loop_count),
        Value::String(s) => Some(parse_loop_count(s)),
        _ => None,
    };
    Ok(Some(count.unwrap_or(1)))
}

/// Playback order; fractional values truncate.
pub fn order<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_or_numeric_string(&value)
        .filter(|f| f.is_finite())
        .map(|f| f.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::delay")]
        delay: Option<f64>,
        #[serde(default, deserialize_with = "super::loop_count")]
        loops: Option<u32>,
        #[serde(default, deserialize_with = "super::order")]
        order: Option<i32>,
    }

    fn probe(v: serde_json::Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn numbers_and_numeric_strings() {
        let p = probe(json!({"delay": "1.5", "loops": "3", "order": 4}));
        assert_eq!(p.delay, Some(1.5));
        assert_eq!(p.loops, Some(3));
        assert_eq!(p.order, Some(4));
    }

    #[test]
    fn malformed_values() {
        let p = probe(json!({"delay": "soon", "loops": -4, "order": "first"}));
        assert_eq!(p.delay, None);
        assert_eq!(p.loops, Some(1));
        assert_eq!(p.order, None);

        let p = probe(json!({"delay": -0.2, "loops": null}));
        assert_eq!(p.delay, None);
        assert_eq!(p.loops, Some(1));
    }

    #[test]
    fn missing_fields_stay_none() {
        let p = probe(json!({}));
        assert_eq!(p.delay, None);
        assert_eq!(p.loops, None);
        assert_eq!(p.order, None);
    }
}
