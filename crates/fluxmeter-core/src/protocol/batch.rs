//! Point batches and their write settings.

use bytes::{Bytes, BytesMut};
use serde::Deserialize;

use super::line::Point;
use crate::error::{MetricsError, Result};

/// Timestamp precision of written points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Precision {
    #[default]
    #[serde(rename = "ns")]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Nanoseconds => "ns",
            Precision::Microseconds => "us",
            Precision::Milliseconds => "ms",
            Precision::Seconds => "s",
        }
    }
}

/// Cluster write consistency requested from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    Any,
    One,
    Quorum,
    All,
}

impl Consistency {
    pub fn as_str(self) -> &'static str {
        match self {
            Consistency::Any => "any",
            Consistency::One => "one",
            Consistency::Quorum => "quorum",
            Consistency::All => "all",
        }
    }
}

/// Settings carried by every batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub retention_policy: String,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub write_consistency: Option<Consistency>,
}

impl BatchConfig {
    /// Database and retention policy names may be empty (server defaults) but
    /// must not carry whitespace or control characters.
    pub fn validate(&self) -> Result<()> {
        check_name("batch.database", &self.database)?;
        check_name("batch.retention_policy", &self.retention_policy)?;
        Ok(())
    }
}

fn check_name(what: &str, s: &str) -> Result<()> {
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(MetricsError::Config(format!(
            "{what} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

/// One batch of points, handed to a sink in a single call.
#[derive(Debug, Clone, Default)]
pub struct BatchPoints {
    config: BatchConfig,
    points: Vec<Point>,
}

impl BatchPoints {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Add a point. Points with no finite field encode to nothing and are
    /// not kept, so [`BatchPoints::len`] equals the number of encoded lines.
    pub fn add_point(&mut self, p: Point) {
        if p.has_finite_field() {
            self.points.push(p);
        }
    }

    pub fn add_points(&mut self, ps: impl IntoIterator<Item = Point>) {
        self.points.extend(ps.into_iter().filter(Point::has_finite_field));
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Encode all points as newline-terminated lines in the batch precision.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.points.len() * 64);
        for p in &self.points {
            p.encode_line(self.config.precision, &mut buf);
        }
        buf.freeze()
    }

    /// Same as [`BatchPoints::encode`], as a `String`.
    pub fn to_line_protocol(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 64);
        for p in &self.points {
            let line = p.render(self.config.precision);
            if !line.is_empty() {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}
