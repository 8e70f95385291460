//! InfluxDB line protocol encoding.
//!
//! Shared by the HTTP and socket backends. Each record becomes one line:
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...][ timestamp_ns]
//! ```
//!
//! Every column is classified in a fixed priority order:
//!
//! 1. the `timestamp` column becomes the trailing nanosecond timestamp
//! 2. `Text` becomes a quoted string field
//! 3. `Integer` / `Float` become bare numeric fields
//! 4. `Boolean` becomes a `true` / `false` field
//! 5. anything else becomes an unquoted tag
//!
//! The store infers column types from the first write it sees, so this
//! classification is part of the wire contract and must not drift.
//!
//! String field values are embedded verbatim: quotes and backslashes inside
//! them are not escaped, and neither are tag keys or values.

use chrono::{DateTime, Utc};

use crate::record::{format_timestamp, Record, Value, TIMESTAMP_FIELD};

/// Encodes a batch of records as newline-separated lines.
///
/// No trailing newline is appended; transports that need one add it.
pub fn encode(table: &str, records: &[Record]) -> String {
    records
        .iter()
        .map(|record| encode_line(table, record))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Same as [`encode`], as the UTF-8 bytes sent over the wire.
pub fn encode_bytes(table: &str, records: &[Record]) -> Vec<u8> {
    encode(table, records).into_bytes()
}

/// Encodes a single record as one line (no newline).
pub fn encode_line(table: &str, record: &Record) -> String {
    let mut tags: Vec<String> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut timestamp: Option<i64> = None;

    for (key, value) in record.iter() {
        if key == TIMESTAMP_FIELD {
            match value {
                Value::Timestamp(ts) => {
                    timestamp = Some(timestamp_nanos(ts));
                    continue;
                }
                Value::Integer(ns) => {
                    timestamp = Some(*ns);
                    continue;
                }
                _ => {}
            }
        }

        match value {
            Value::Text(s) => fields.push(format!("{key}=\"{s}\"")),
            Value::Integer(i) => fields.push(format!("{key}={i}")),
            Value::Float(f) => fields.push(format!("{key}={}", format_float(*f))),
            Value::Boolean(b) => fields.push(format!("{key}={b}")),
            Value::Symbol(s) => tags.push(format!("{key}={s}")),
            Value::Timestamp(ts) => tags.push(format!("{key}={}", format_timestamp(ts))),
            Value::Null => {}
        }
    }

    let mut line = String::from(table);
    if !tags.is_empty() {
        line.push(',');
        line.push_str(&tags.join(","));
    }
    line.push(' ');
    line.push_str(&fields.join(","));
    if let Some(ns) = timestamp {
        line.push(' ');
        line.push_str(&ns.to_string());
    }
    line
}

/// Nanoseconds since the Unix epoch, truncated.
///
/// Outside the range an `i64` nanosecond count can hold (years 1677-2262)
/// the microsecond count is scaled and saturated instead.
pub fn timestamp_nanos(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt()
        .unwrap_or_else(|| ts.timestamp_micros().saturating_mul(1_000))
}

// `{:?}` always keeps a decimal point or exponent (`3.0`, `1e20`), so a float
// column is never mistaken for an integral literal.
fn format_float(f: f64) -> String {
    format!("{f:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_tags_before_fields_timestamp_last() {
        let ts = sample_ts();
        let record = Record::new()
            .with("timestamp", ts)
            .with("name", "x")
            .with("n", 3i64)
            .with("flag", true)
            .with("region", Value::Symbol("eu".into()));

        let line = encode("t", &[record]);
        assert_eq!(
            line,
            format!("t,region=eu name=\"x\",n=3,flag=true {}", 1_704_067_200_000_000_000i64)
        );
    }

    #[test]
    fn test_no_tags_means_no_leading_comma() {
        let record = Record::new().with("temperature", 25.5).with("humidity", 60.1);
        assert_eq!(encode_line("m", &record), "m temperature=25.5,humidity=60.1");
    }

    #[test]
    fn test_multiple_tags_keep_insertion_order() {
        let record = Record::new()
            .with("host", Value::Symbol("a".into()))
            .with("v", 1i64)
            .with("dc", Value::Symbol("west".into()));
        assert_eq!(encode_line("m", &record), "m,host=a,dc=west v=1");
    }

    #[test]
    fn test_lines_joined_without_trailing_newline() {
        let records = vec![
            Record::new().with("v", 1i64),
            Record::new().with("v", 2i64),
        ];
        let payload = encode("m", &records);
        assert_eq!(payload, "m v=1\nm v=2");
        assert!(!payload.ends_with('\n'));
    }

    #[test]
    fn test_empty_batch_encodes_to_empty_string() {
        assert_eq!(encode("m", &[]), "");
        assert!(encode_bytes("m", &[]).is_empty());
    }

    #[test]
    fn test_float_keeps_decimal_point() {
        let record = Record::new().with("a", 3.0).with("b", -0.25);
        assert_eq!(encode_line("m", &record), "m a=3.0,b=-0.25");
    }

    #[test]
    fn test_false_is_lowercase() {
        let record = Record::new().with("ok", false);
        assert_eq!(encode_line("m", &record), "m ok=false");
    }

    #[test]
    fn test_string_field_is_not_escaped() {
        let record = Record::new().with("msg", r#"say "hi"\now"#);
        assert_eq!(encode_line("m", &record), r#"m msg="say "hi"\now""#);
    }

    #[test]
    fn test_integer_timestamp_is_taken_as_nanoseconds() {
        let record = Record::new().with("v", 1i64).with("timestamp", 42i64);
        assert_eq!(encode_line("m", &record), "m v=1 42");
    }

    #[test]
    fn test_timestamp_position_in_record_does_not_matter() {
        let ts = Utc.timestamp_opt(1, 500).unwrap();
        let record = Record::new().with("v", 1i64).with("timestamp", ts);
        assert_eq!(encode_line("m", &record), "m v=1 1000000500");
    }

    #[test]
    fn test_text_under_timestamp_key_is_an_ordinary_field() {
        let record = Record::new().with("timestamp", "soon");
        assert_eq!(encode_line("m", &record), "m timestamp=\"soon\"");
    }

    #[test]
    fn test_other_timestamp_column_becomes_tag() {
        let record = Record::new()
            .with("seen_at", sample_ts())
            .with("v", 1i64);
        assert_eq!(
            encode_line("m", &record),
            "m,seen_at=2024-01-01T00:00:00.000000Z v=1"
        );
    }

    #[test]
    fn test_null_is_omitted() {
        let record = Record::new().with("a", Value::Null).with("b", 1i64);
        assert_eq!(encode_line("m", &record), "m b=1");
    }

    #[test]
    fn test_record_without_fields_is_malformed_but_encoded() {
        let record = Record::new().with("host", Value::Symbol("a".into()));
        assert_eq!(encode_line("m", &record), "m,host=a ");
    }

    #[test]
    fn test_sub_microsecond_precision_is_kept() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(timestamp_nanos(&ts), 1_700_000_000_123_456_789);
    }
}
