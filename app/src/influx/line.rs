use sprout_core::store::{FieldValue, Point};
use std::fmt::Write;

const TAG_SPECIAL: &[char] = &[',', '=', ' ', '\\'];

/// Serializes a point into InfluxDB line protocol with ns precision
pub fn encode(point: &Point) -> String {
    let mut line = escape(&point.measurement, &[',', ' ', '\\']);
    for (key, value) in &point.tags {
        let _ = write!(
            line,
            ",{}={}",
            escape(key, TAG_SPECIAL),
            escape(value, TAG_SPECIAL)
        );
    }

    let fields: Vec<String> = point
        .fields
        .iter()
        .map(|(key, value)| {
            let key = escape(key, TAG_SPECIAL);
            match value {
                FieldValue::Float(val) => format!("{}={}", key, val),
                FieldValue::Text(text) => format!("{}=\"{}\"", key, escape(text, &['"', '\\'])),
            }
        })
        .collect();
    let _ = write!(line, " {}", fields.join(","));

    if let Some(nanos) = point.time.timestamp_nanos_opt() {
        let _ = write!(line, " {}", nanos);
    }
    line
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            // not representable, a raw line break ends the record
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c if special.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
