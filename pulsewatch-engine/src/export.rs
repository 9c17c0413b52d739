//! Serialize samples for hand-off to other tools.

use std::fmt;
use std::str::FromStr;

use pulsewatch_types::{MetricSample, UnknownVariant};

use crate::error::Result;

/// Output format for [`export_samples`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(UnknownVariant {
                kind: "export format",
                value: s.to_string(),
            }),
        }
    }
}

pub const CSV_HEADER: [&str; 5] = ["timestamp", "component", "metric_name", "value", "tags"];

/// Render samples in the requested format.
///
/// CSV rows carry tags as a JSON object, or an empty field when untagged.
pub fn export_samples(samples: &[MetricSample], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(samples)?),
        ExportFormat::Csv => to_csv(samples),
    }
}

fn to_csv(samples: &[MetricSample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for sample in samples {
        let tags = if sample.tags.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&sample.tags)?
        };
        wtr.write_record([
            sample.timestamp_ms.to_string(),
            sample.component.clone(),
            sample.metric_name.clone(),
            sample.value.to_string(),
            tags,
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
