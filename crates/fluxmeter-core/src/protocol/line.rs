//! Line-protocol points.
//!
//! Text form: `<name>[,<tag>=<value>...] <field>=<number>[,<field>=<number>...] <timestamp>`.
//! Tags are emitted in the order stored on the point; `Point::new` stores base
//! tags first and instance labels second, each sorted by key.
//!
//! A tag whose key or value is empty, or whose key is reserved, cannot be
//! written and is left off the point. Backslashes are doubled and line breaks
//! become spaces, since the protocol has no escape for them.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use super::batch::Precision;
use crate::labels::LabelSet;

/// Tag keys the line protocol reserves.
pub const RESERVED_TAG_KEYS: [&str; 1] = ["time"];

/// One exported, timestamped record.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, f64)>,
    pub timestamp: SystemTime,
}

impl Point {
    /// Build a point whose tags are `base` followed by `labels`.
    /// A label sharing a key with a base tag replaces that base tag.
    /// Unwritable tags (see [`is_writable_tag`]) are skipped; an unwritable
    /// label does not replace anything.
    pub fn new(
        name: &str,
        base: &LabelSet,
        labels: &LabelSet,
        fields: Vec<(String, f64)>,
        timestamp: SystemTime,
    ) -> Self {
        let overrides = |k: &str| labels.get(k).is_some_and(|v| is_writable_tag(k, v));
        let mut tags = Vec::with_capacity(base.len() + labels.len());
        for (k, v) in base.iter() {
            if is_writable_tag(k, v) && !overrides(k) {
                tags.push((k.to_string(), v.to_string()));
            }
        }
        for (k, v) in labels.iter() {
            if is_writable_tag(k, v) {
                tags.push((k.to_string(), v.to_string()));
            } else {
                tracing::trace!(metric = name, key = k, "skipping unwritable tag");
            }
        }
        Self {
            name: name.to_string(),
            tags,
            fields,
            timestamp,
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// Look up a tag by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append this point as one newline-terminated line.
    /// Returns `false` (writing nothing) when no field has a finite value.
    pub fn encode_line(&self, precision: Precision, out: &mut BytesMut) -> bool {
        let line = self.render(precision);
        if line.is_empty() {
            return false;
        }
        out.reserve(line.len() + 1);
        out.put_slice(line.as_bytes());
        out.put_u8(b'\n');
        true
    }

    /// Whether at least one field has a finite value.
    pub fn has_finite_field(&self) -> bool {
        self.fields.iter().any(|(_, v)| v.is_finite())
    }

    /// Render without a trailing newline; empty when there is nothing to write.
    pub fn render(&self, precision: Precision) -> String {
        let mut fields = self.fields.iter().filter(|(_, v)| v.is_finite()).peekable();
        if fields.peek().is_none() {
            return String::new();
        }

        let mut out = String::with_capacity(64);
        escape_into(&mut out, &self.name, &[',', ' ']);
        for (k, v) in &self.tags {
            out.push(',');
            escape_into(&mut out, k, &[',', '=', ' ']);
            out.push('=');
            escape_into(&mut out, v, &[',', '=', ' ']);
        }
        out.push(' ');
        for (i, (k, v)) in fields.enumerate() {
            if i > 0 {
                out.push(',');
            }
            escape_into(&mut out, k, &[',', '=', ' ']);
            out.push('=');
            out.push_str(&v.to_string());
        }
        out.push(' ');
        out.push_str(&timestamp_in(self.timestamp, precision).to_string());
        out
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Precision::Nanoseconds))
    }
}

/// Timestamp as an integer count of `precision` units since the Unix epoch.
/// Instants before the epoch clamp to 0.
pub fn timestamp_in(ts: SystemTime, precision: Precision) -> u128 {
    let d = ts.duration_since(UNIX_EPOCH).unwrap_or_default();
    match precision {
        Precision::Nanoseconds => d.as_nanos(),
        Precision::Microseconds => d.as_micros(),
        Precision::Milliseconds => d.as_millis(),
        Precision::Seconds => u128::from(d.as_secs()),
    }
}

/// Whether a tag can be written: non-empty key and value, key not reserved.
pub fn is_writable_tag(key: &str, value: &str) -> bool {
    !key.is_empty() && !value.is_empty() && !RESERVED_TAG_KEYS.contains(&key)
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        let c = if matches!(c, '\n' | '\r') { ' ' } else { c };
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
