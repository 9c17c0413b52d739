//! Sample files.
//!
//! Samples are read from newline-delimited JSON, one [`MetricSample`] per
//! line. Blank lines and lines starting with `#` are skipped. A file whose
//! first non-blank character is `[` is read as a single JSON array instead,
//! which is what `pulsewatch export --format json` writes.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use pulsewatch_engine::Engine;
use pulsewatch_types::MetricSample;

/// Read every sample in `path`.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<MetricSample>> {
    let path = path.as_ref();
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_samples(BufReader::new(file)).with_context(|| format!("in {}", path.display()))
}

/// Parse samples from any reader.
pub fn parse_samples<R: BufRead>(mut reader: R) -> Result<Vec<MetricSample>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content).context("invalid sample array");
    }

    let mut samples = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sample: MetricSample = serde_json::from_str(line)
            .with_context(|| format!("invalid sample on line {}", idx + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Replay a sample file into `engine`, returning how many samples were recorded.
///
/// The whole file is validated before anything is written.
pub async fn replay<P: AsRef<Path>>(engine: &Engine, path: P) -> Result<usize> {
    let path = path.as_ref();
    let samples = read_samples(path)?;
    let count = engine
        .record_batch(samples)
        .await
        .with_context(|| format!("failed to replay {}", path.display()))?;
    tracing::info!(count, path = %path.display(), "replayed samples");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn parses_json_lines_with_comments() {
        let input = r#"
# captured from staging
{"timestamp_ms": 1000, "component": "api", "metric_name": "response_time", "value": 120.0}

{"timestamp_ms": 2000, "component": "api", "metric_name": "response_time", "value": 130.5, "tags": {"region": "eu"}}
"#;
        let samples = parse_samples(Cursor::new(input)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], MetricSample::new(1000, "api", "response_time", 120.0));
        assert_eq!(samples[1].tag("region"), Some("eu"));
    }

    #[test]
    fn parses_json_array() {
        let input = r#"[
  {"timestamp_ms": 5, "component": "db", "metric_name": "cpu_usage", "value": 40.0}
]"#;
        let samples = parse_samples(Cursor::new(input)).unwrap();
        assert_eq!(samples, vec![MetricSample::new(5, "db", "cpu_usage", 40.0)]);
    }

    #[test]
    fn reports_bad_line_number() {
        let input = "{\"timestamp_ms\": 1, \"component\": \"api\", \"metric_name\": \"a\", \"value\": 1.0}\nnot json\n";
        let err = parse_samples(Cursor::new(input)).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_samples(dir.path().join("nope.jsonl")).is_err());
    }

    #[tokio::test]
    async fn replay_records_into_engine() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let now = pulsewatch_types::current_timestamp_ms();
        for i in 0..3u64 {
            writeln!(
                file,
                r#"{{"timestamp_ms": {}, "component": "api", "metric_name": "throughput", "value": {}}}"#,
                now - 1000 * (3 - i),
                100 + i
            )
            .unwrap();
        }

        let engine = Engine::builder().build().unwrap();
        assert_eq!(replay(&engine, file.path()).await.unwrap(), 3);
        assert_eq!(engine.latest_value("api", "throughput"), Some(102.0));
        assert_eq!(engine.get_history("api", "throughput", 1).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn replay_rejects_invalid_sample_without_writing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"timestamp_ms": 1, "component": "api", "metric_name": "throughput", "value": 1.0}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"timestamp_ms": 2, "component": "", "metric_name": "throughput", "value": 1.0}}"#
        )
        .unwrap();

        let engine = Engine::builder().build().unwrap();
        assert!(replay(&engine, file.path()).await.is_err());
        assert_eq!(engine.latest_value("api", "throughput"), None);
    }
}
