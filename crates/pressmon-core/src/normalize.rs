//! Payload Normalizer
//!
//! Tolerant decoding boundary for inbound telemetry. Every message shape the
//! backends have produced so far is absorbed here so that everything
//! downstream only ever sees a [`CanonicalReading`].
//!
//! Accepted shapes:
//! - JSON text or an already decoded [`Value`]
//! - enveloped records: `{event, reading}`, `{data}` or the bare record
//! - single-sensor records: `{sensor: "Temperature_C", value: 37.5}`
//! - backend field names: `pressao_kPa`, `temperatura_C`, `distancia_mm`
//! - raw firmware flags: `IR_pao`, `IR_mao`
//!
//! Normalization never fails. Anything it cannot make sense of turns into the
//! all-zero record.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::reading::{CanonicalReading, UNKNOWN_DEVICE};

/// Event tag carried by messages that contain a sensor reading
pub const INGEST_EVENT: &str = "ingest";

/// Backend field names used when the canonical name is absent
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("pressao_kPa", "pressure"),
    ("temperatura_C", "temperature"),
    ("distancia_mm", "distance"),
    ("IR_pao", "ir_bread"),
    ("IR_mao", "ir_hand"),
];

/// Canonical fields a partial record may carry
#[derive(Debug, Clone, Default, PartialEq)]
struct PartialReading {
    device_id: Option<String>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    distance: Option<f64>,
    ir_bread: Option<bool>,
    ir_hand: Option<bool>,
}

impl PartialReading {
    /// Merge over defaults
    fn into_reading(self, received_at: DateTime<Utc>) -> CanonicalReading {
        CanonicalReading {
            device_id: self
                .device_id
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            temperature: self.temperature.unwrap_or(0.0),
            pressure: self.pressure.unwrap_or(0.0),
            distance: self.distance.unwrap_or(0.0),
            ir_bread: self.ir_bread.unwrap_or(false),
            ir_hand: self.ir_hand.unwrap_or(false),
            received_at,
        }
    }
}

/// A record shape the normalizer knows how to read
struct ShapeMatcher {
    name: &'static str,
    extract: fn(&Map<String, Value>) -> Option<PartialReading>,
}

/// Tried in order; the first matcher that recognises the record wins
const SHAPE_MATCHERS: &[ShapeMatcher] = &[
    ShapeMatcher {
        name: "single-sensor",
        extract: single_sensor,
    },
    ShapeMatcher {
        name: "flat-record",
        extract: flat_record,
    },
];

/// Classification of a raw streaming message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{event: "ingest", reading: {...}}`
    Ingest(Value),
    /// `{type: "keepalive"}`
    Keepalive,
    /// Valid JSON that carries no reading
    Other(Value),
    /// Not JSON at all
    Invalid,
}

/// Sort a raw text frame into ingest / keepalive / other / invalid
pub fn classify_message(text: &str) -> InboundMessage {
    let parsed: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return InboundMessage::Invalid,
    };

    let is_ingest = parsed.get("event").and_then(Value::as_str) == Some(INGEST_EVENT);
    let has_reading = parsed.get("reading").map(is_truthy).unwrap_or(false);

    if is_ingest && has_reading {
        InboundMessage::Ingest(parsed)
    } else if parsed.get("type").and_then(Value::as_str) == Some("keepalive") {
        InboundMessage::Keepalive
    } else {
        InboundMessage::Other(parsed)
    }
}

/// Normalize raw text. Text that is not JSON yields the default record.
pub fn normalize_text(text: &str, received_at: DateTime<Utc>) -> CanonicalReading {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => normalize(&value, received_at),
        Err(_) => CanonicalReading::default().stamped(received_at),
    }
}

/// Normalize any decoded payload into a canonical reading
pub fn normalize(payload: &Value, received_at: DateTime<Utc>) -> CanonicalReading {
    // A JSON string holding JSON is decoded once more
    if let Value::String(text) = payload {
        return normalize_text(text, received_at);
    }

    let record = unwrap_envelope(payload);
    let partial = match record.as_object() {
        Some(fields) => SHAPE_MATCHERS
            .iter()
            .find_map(|matcher| {
                let partial = (matcher.extract)(fields)?;
                tracing::trace!(shape = matcher.name, "payload shape matched");
                Some(partial)
            })
            .unwrap_or_default(),
        None => PartialReading::default(),
    };

    partial.into_reading(received_at)
}

/// Descend one envelope level: `.reading`, else `.data`, else the value itself
fn unwrap_envelope(payload: &Value) -> &Value {
    ["reading", "data"]
        .iter()
        .find_map(|key| payload.get(*key).filter(|v| !v.is_null()))
        .unwrap_or(payload)
}

/// `{sensor: name, value: v}` carrying a single measurement
fn single_sensor(fields: &Map<String, Value>) -> Option<PartialReading> {
    let sensor = fields.get("sensor")?;
    let value = fields.get("value")?;

    let name = match sensor {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    };

    let mut partial = PartialReading {
        device_id: device_id(fields),
        ..PartialReading::default()
    };
    if name.contains("temp") {
        partial.temperature = Some(coerce_number(Some(value)));
    }
    if name.contains("press") {
        partial.pressure = Some(coerce_number(Some(value)));
    }
    if name.contains("dist") {
        partial.distance = Some(coerce_number(Some(value)));
    }
    if name.contains("bread") {
        partial.ir_bread = Some(is_truthy(value));
    }
    if name.contains("hand") {
        partial.ir_hand = Some(is_truthy(value));
    }
    Some(partial)
}

/// Bare record with canonical or backend field names
fn flat_record(fields: &Map<String, Value>) -> Option<PartialReading> {
    Some(PartialReading {
        device_id: device_id(fields),
        temperature: Some(coerce_number(lookup(fields, "temperature"))),
        pressure: Some(coerce_number(lookup(fields, "pressure"))),
        distance: Some(coerce_number(lookup(fields, "distance"))),
        ir_bread: Some(lookup(fields, "ir_bread").map(is_truthy).unwrap_or(false)),
        ir_hand: Some(lookup(fields, "ir_hand").map(is_truthy).unwrap_or(false)),
    })
}

/// Canonical field, or its backend alias when the canonical key is absent
fn lookup<'a>(fields: &'a Map<String, Value>, canonical: &str) -> Option<&'a Value> {
    if let Some(value) = fields.get(canonical) {
        return Some(value);
    }
    FIELD_ALIASES
        .iter()
        .filter(|(_, target)| *target == canonical)
        .find_map(|(alias, _)| fields.get(*alias))
}

fn device_id(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("device_id")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `Number(v ?? 0)` with NaN and infinities folded to 0. Strings accept
/// decimal and exponent forms as well as unsigned `0x`, `0o` and `0b`
/// literals.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_numeric_string(trimmed).unwrap_or(0.0)
            }
        }
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => coerce_number(Some(single)),
            _ => 0.0,
        },
        Some(Value::Object(_)) => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn parse_numeric_string(s: &str) -> Option<f64> {
    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return s.parse::<f64>().ok(),
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// JavaScript truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_invalid_text_yields_default() {
        let at = now();
        for text in ["", "not json", "{broken", "{\"a\":}"] {
            let r = normalize_text(text, at);
            assert_eq!(r, CanonicalReading::default().stamped(at), "input {text:?}");
        }
    }

    #[test]
    fn test_single_sensor_temperature_string_value() {
        let r = normalize(&json!({"sensor": "Temperature_C", "value": "37.5"}), now());
        assert_eq!(r.temperature, 37.5);
        assert_eq!(r.pressure, 0.0);
        assert_eq!(r.distance, 0.0);
        assert!(!r.ir_bread);
        assert!(!r.ir_hand);
        assert_eq!(r.device_id, "unknown");
    }

    #[test]
    fn test_single_sensor_booleans_are_truthy_cast() {
        let r = normalize(&json!({"sensor": "IR_BREAD", "value": 1}), now());
        assert!(r.ir_bread);
        let r = normalize(&json!({"sensor": "ir_hand", "value": 0}), now());
        assert!(!r.ir_hand);
        let r = normalize(&json!({"sensor": "hand", "value": "no"}), now());
        assert!(r.ir_hand);
    }

    #[test]
    fn test_pressure_alias() {
        let r = normalize(&json!({"pressao_kPa": 120}), now());
        assert_eq!(r.pressure, 120.0);
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let r = normalize(&json!({"pressure": 80, "pressao_kPa": 120}), now());
        assert_eq!(r.pressure, 80.0);
    }

    #[test]
    fn test_all_aliases_inside_envelope() {
        let msg = json!({
            "event": "ingest",
            "reading": {
                "device_id": "sim-arduino-01",
                "temperatura_C": 180.5,
                "pressao_kPa": "101.3",
                "distancia_mm": 42.0,
                "ir_bread": true
            }
        });
        let r = normalize(&msg, now());
        assert_eq!(r.device_id, "sim-arduino-01");
        assert_eq!(r.temperature, 180.5);
        assert_eq!(r.pressure, 101.3);
        assert_eq!(r.distance, 42.0);
        assert!(r.ir_bread);
        assert!(!r.ir_hand);
    }

    #[test]
    fn test_firmware_ir_flags() {
        let r = normalize(&json!({"IR_pao": true, "IR_mao": false, "distancia_mm": null}), now());
        assert!(r.ir_bread);
        assert!(!r.ir_hand);
        assert_eq!(r.distance, 0.0);
    }

    #[test]
    fn test_data_envelope_and_json_string() {
        let r = normalize(&json!({"data": {"temperature": 21}}), now());
        assert_eq!(r.temperature, 21.0);

        let r = normalize(&json!("{\"reading\":{\"distance\":33}}"), now());
        assert_eq!(r.distance, 33.0);
    }

    #[test]
    fn test_null_reading_falls_through_to_data() {
        let r = normalize(&json!({"reading": null, "data": {"pressure": 7}}), now());
        assert_eq!(r.pressure, 7.0);
    }

    #[test]
    fn test_garbage_numbers_become_zero() {
        let r = normalize(
            &json!({"temperature": "hot", "pressure": {"x": 1}, "distance": null}),
            now(),
        );
        assert_eq!(r.temperature, 0.0);
        assert_eq!(r.pressure, 0.0);
        assert_eq!(r.distance, 0.0);
    }

    #[test]
    fn test_prefixed_number_strings() {
        assert_eq!(coerce_number(Some(&json!("0x1A"))), 26.0);
        assert_eq!(coerce_number(Some(&json!(" 0b11 "))), 3.0);
        assert_eq!(coerce_number(Some(&json!("0o17"))), 15.0);
        assert_eq!(coerce_number(Some(&json!("1.5e2"))), 150.0);
        assert_eq!(coerce_number(Some(&json!("0x"))), 0.0);
        assert_eq!(coerce_number(Some(&json!("0b12"))), 0.0);
        assert_eq!(coerce_number(Some(&json!("-0x10"))), 0.0);

        let r = normalize(&json!({"distance": "0x28"}), now());
        assert_eq!(r.distance, 40.0);
    }

    #[test]
    fn test_non_object_payloads() {
        for payload in [json!(42), json!([1, 2]), json!(null), json!(true)] {
            let at = now();
            assert_eq!(normalize(&payload, at), CanonicalReading::default().stamped(at));
        }
    }

    #[test]
    fn test_numeric_device_id_is_stringified() {
        let r = normalize(&json!({"device_id": 7, "temperature": 1}), now());
        assert_eq!(r.device_id, "7");
    }

    #[test]
    fn test_classify_message() {
        assert!(matches!(
            classify_message(r#"{"event":"ingest","reading":{"temperature":1}}"#),
            InboundMessage::Ingest(_)
        ));
        assert_eq!(classify_message(r#"{"type":"keepalive"}"#), InboundMessage::Keepalive);
        assert!(matches!(
            classify_message(r#"{"event":"ingest"}"#),
            InboundMessage::Other(_)
        ));
        assert!(matches!(
            classify_message(r#"{"event":"ingest","reading":null}"#),
            InboundMessage::Other(_)
        ));
        assert_eq!(classify_message("hello"), InboundMessage::Invalid);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1.5)));
    }
}
