//! Record decoder for JSONL transcript lines
//!
//! Each line of a transcript file is decoded independently and tolerantly:
//! empty lines, malformed JSON, and structurally valid but irrelevant
//! objects all decode to `None` rather than an error, so one corrupt line
//! never aborts aggregation of the rest of the file.
//!
//! Field extraction defaults per field instead of failing the record: a
//! missing or wrong-typed token count reads as 0, a missing model or
//! session id as `None`.

use crate::pricing::PricingTier;
use crate::types::{TokenCounts, UsageRecord};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::trace;

/// Record kind that carries priced usage
const ASSISTANT_KIND: &str = "assistant";

/// Decode one transcript line into a usage record
///
/// Returns `None` for empty lines, unparseable JSON, records whose kind is
/// not an assistant response, and records without a usage block.
///
/// # Examples
/// ```
/// use ccwatch::record::decode_line;
///
/// let line = r#"{"type":"assistant","sessionId":"abc","timestamp":"2025-01-01T10:00:00Z","message":{"model":"claude-sonnet-4","usage":{"input_tokens":100,"output_tokens":50}}}"#;
/// let record = decode_line(line).unwrap();
/// assert_eq!(record.tokens.input_tokens, 100);
///
/// assert!(decode_line("").is_none());
/// assert!(decode_line("not json").is_none());
/// ```
pub fn decode_line(line: &str) -> Option<UsageRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            trace!("skipping malformed line: {e}");
            return None;
        }
    };

    if value.get("type").and_then(Value::as_str) != Some(ASSISTANT_KIND) {
        return None;
    }

    let message = value.get("message")?;
    let usage = message.get("usage").filter(|u| u.is_object())?;

    let tokens = TokenCounts::new(
        field_u64(usage, "input_tokens"),
        field_u64(usage, "output_tokens"),
        field_u64(usage, "cache_creation_input_tokens"),
        field_u64(usage, "cache_read_input_tokens"),
    );

    let model = message
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let session_id = value
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let cost = PricingTier::for_model(model.as_deref()).cost(&tokens);

    Some(UsageRecord {
        model,
        session_id,
        timestamp,
        tokens,
        cost,
    })
}

/// Parse an ISO-8601 timestamp, with or without fractional seconds
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn field_u64(obj: &Value, key: &str) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assistant_line(model: &str, input: u64, output: u64) -> String {
        format!(
            r#"{{"type":"assistant","sessionId":"s1","timestamp":"2025-01-01T10:00:00Z","message":{{"model":"{model}","usage":{{"input_tokens":{input},"output_tokens":{output},"cache_creation_input_tokens":0,"cache_read_input_tokens":0}}}}}}"#
        )
    }

    #[test]
    fn test_decode_valid_line() {
        let record = decode_line(&assistant_line("claude-sonnet-4", 1000, 500)).unwrap();
        assert_eq!(record.tokens.input_tokens, 1000);
        assert_eq!(record.tokens.output_tokens, 500);
        assert_eq!(record.model.as_deref(), Some("claude-sonnet-4"));
        assert_eq!(record.session_id.as_deref(), Some("s1"));
        assert_eq!(
            record.timestamp,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap())
        );
        assert!(record.cost > 0.0);
    }

    #[test]
    fn test_empty_and_malformed_lines_skip() {
        assert!(decode_line("").is_none());
        assert!(decode_line("   ").is_none());
        assert!(decode_line("{not json").is_none());
        assert!(decode_line("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_non_assistant_kind_skips() {
        let line = r#"{"type":"user","message":{"usage":{"input_tokens":100}}}"#;
        assert!(decode_line(line).is_none());

        let line = r#"{"message":{"usage":{"input_tokens":100}}}"#;
        assert!(decode_line(line).is_none());
    }

    #[test]
    fn test_missing_or_null_usage_skips() {
        let line = r#"{"type":"assistant","message":{"model":"claude-sonnet-4"}}"#;
        assert!(decode_line(line).is_none());

        let line = r#"{"type":"assistant","message":{"model":"claude-sonnet-4","usage":null}}"#;
        assert!(decode_line(line).is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let line = r#"{"type":"assistant","message":{"usage":{"output_tokens":42}}}"#;
        let record = decode_line(line).unwrap();
        assert_eq!(record.tokens.input_tokens, 0);
        assert_eq!(record.tokens.output_tokens, 42);
        assert!(record.model.is_none());
        assert!(record.session_id.is_none());
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_wrong_typed_fields_default() {
        let line = r#"{"type":"assistant","sessionId":7,"timestamp":false,"message":{"model":3,"usage":{"input_tokens":"lots","output_tokens":42}}}"#;
        let record = decode_line(line).unwrap();
        assert_eq!(record.tokens.input_tokens, 0);
        assert_eq!(record.tokens.output_tokens, 42);
        assert!(record.model.is_none());
        assert!(record.session_id.is_none());
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_timestamp_with_and_without_fractional_seconds() {
        let plain = parse_timestamp("2025-01-01T10:37:00Z").unwrap();
        let fractional = parse_timestamp("2025-01-01T10:37:00.123Z").unwrap();
        let offset = parse_timestamp("2025-01-01T12:37:00+02:00").unwrap();

        assert_eq!(plain, Utc.with_ymd_and_hms(2025, 1, 1, 10, 37, 0).unwrap());
        assert_eq!(fractional.timestamp(), plain.timestamp());
        assert_eq!(offset, plain);
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2025-01-01").is_none());
    }

    #[test]
    fn test_unknown_model_prices_at_default_tier() {
        let known = decode_line(&assistant_line("claude-sonnet-4", 1000, 500)).unwrap();
        let unknown = decode_line(&assistant_line("mystery-model", 1000, 500)).unwrap();
        assert_eq!(known.cost, unknown.cost);

        let opus = decode_line(&assistant_line("claude-opus-4", 1000, 500)).unwrap();
        assert!(opus.cost > known.cost);
    }
}
