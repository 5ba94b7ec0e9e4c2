use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use fluxmeter_core::error::{MetricsError, Result};
use fluxmeter_core::histogram::DEFAULT_BUCKETS;
use fluxmeter_core::labels::LabelSet;
use fluxmeter_core::protocol::BatchConfig;

use crate::influx::validate_tags;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    /// Base tags stamped on every exported point.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    pub batch: BatchConfig,

    #[serde(default)]
    pub histogram: HistogramSection,

    #[serde(default)]
    pub export: ExportSection,

    #[serde(default)]
    pub ops: OpsSection,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.batch.database.is_empty() {
            return Err(MetricsError::Config("batch.database must not be empty".into()));
        }
        self.batch.validate()?;
        validate_tags(&LabelSet::from_pairs(self.tags.iter()))?;

        self.histogram.validate()?;
        self.export.validate()?;
        self.ops.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSection {
    #[serde(default = "default_buckets")]
    pub buckets: usize,
}

impl Default for HistogramSection {
    fn default() -> Self {
        Self {
            buckets: default_buckets(),
        }
    }
}

impl HistogramSection {
    pub fn validate(&self) -> Result<()> {
        if !(2..=1024).contains(&self.buckets) {
            return Err(MetricsError::Config(
                "histogram.buckets must be between 2 and 1024".into(),
            ));
        }
        Ok(())
    }
}

fn default_buckets() -> usize {
    DEFAULT_BUCKETS
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default)]
    pub sink: SinkKind,

    /// Target file, required when `sink: file`.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            sink: SinkKind::default(),
            path: None,
        }
    }
}

impl ExportSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(MetricsError::Config(
                "export.interval_ms must be between 100 and 3600000".into(),
            ));
        }
        match (self.sink, self.path.as_deref()) {
            (SinkKind::File, None | Some("")) => Err(MetricsError::Config(
                "export.path is required when export.sink is file".into(),
            )),
            (SinkKind::Stdout, Some(_)) => Err(MetricsError::Config(
                "export.path is only valid with export.sink: file".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_interval_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for OpsSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl OpsSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| MetricsError::Config(format!("ops.listen must be a socket address: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:9273".into()
}
