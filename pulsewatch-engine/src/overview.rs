//! System-wide health rollup.

use std::collections::BTreeMap;

use pulsewatch_types::{window_start, ComponentSummary, SystemOverview, Timestamp};

use crate::analyzer::Analyzer;
use crate::config::HealthThresholds;
use crate::error::{Result, ValidationError};
use crate::health;
use crate::policy;

/// Number of components named in the "lowest scoring" call-out.
const WORST_COMPONENTS_LISTED: usize = 3;

/// Combine component summaries into a system overview.
pub fn build_overview(
    window_hours: u64,
    component_summaries: BTreeMap<String, ComponentSummary>,
    thresholds: &HealthThresholds,
    generated_at: Timestamp,
) -> SystemOverview {
    let overall_health_score = if component_summaries.is_empty() {
        0.0
    } else {
        let total: f64 = component_summaries.values().map(|s| s.health_score).sum();
        total / component_summaries.len() as f64
    };

    let total_anomalies = component_summaries
        .values()
        .map(ComponentSummary::total_anomalies)
        .sum();

    let mut overview = SystemOverview {
        window_hours,
        overall_health_score,
        health_status: thresholds.status_for(overall_health_score),
        component_summaries,
        total_anomalies,
        system_recommendations: Vec::new(),
        generated_at,
    };
    overview.system_recommendations = system_recommendations(&overview, thresholds);
    overview
}

fn system_recommendations(overview: &SystemOverview, thresholds: &HealthThresholds) -> Vec<String> {
    if overview.component_summaries.is_empty() {
        return vec![format!(
            "No components reported metrics in the last {}h.",
            overview.window_hours
        )];
    }

    let score = overview.overall_health_score;
    let mut out = vec![if score >= thresholds.excellent_score {
        format!("System health is excellent ({score:.1}).")
    } else if score >= thresholds.good_score {
        format!("System health is good ({score:.1}).")
    } else if score >= thresholds.fair_score {
        format!("System health needs attention ({score:.1}).")
    } else {
        format!("System health is poor ({score:.1}); immediate investigation required.")
    }];

    let worst = overview.worst_components();
    if worst
        .first()
        .is_some_and(|summary| summary.health_score < thresholds.good_score)
    {
        let listed: Vec<String> = worst
            .iter()
            .take(WORST_COMPONENTS_LISTED)
            .map(|s| format!("{} ({:.1})", s.component, s.health_score))
            .collect();
        out.push(format!("Lowest scoring components: {}.", listed.join(", ")));
    }

    let saturated = metrics_matching(overview, |metric, average| {
        policy::is_resource_metric(metric) && average > thresholds.resource_saturation
    });
    if !saturated.is_empty() {
        out.push(format!(
            "Consider scaling resources; high utilisation on {}.",
            saturated.join(", ")
        ));
    }

    let slow = metrics_matching(overview, |metric, average| {
        policy::is_response_time_metric(metric) && average > thresholds.slow_response_time
    });
    if !slow.is_empty() {
        out.push(format!("Slow components detected: {}.", slow.join(", ")));
    }

    out
}

/// `component/metric (average)` for every analysis matching `predicate`.
fn metrics_matching<F>(overview: &SystemOverview, predicate: F) -> Vec<String>
where
    F: Fn(&str, f64) -> bool,
{
    overview
        .component_summaries
        .values()
        .flat_map(|summary| summary.metric_analyses.values())
        .filter(|analysis| analysis.sample_count > 0 && predicate(&analysis.metric_name, analysis.average))
        .map(|analysis| {
            format!(
                "{}/{} ({:.1})",
                analysis.component, analysis.metric_name, analysis.average
            )
        })
        .collect()
}

/// Summaries of every component with data in the last `hours`.
pub async fn component_summaries(
    analyzer: &Analyzer,
    hours: u64,
) -> Result<BTreeMap<String, ComponentSummary>> {
    if hours == 0 {
        return Err(ValidationError::InvalidWindow { hours }.into());
    }

    let since = window_start(analyzer.clock().now_ms(), hours);
    let components = analyzer
        .store()
        .distinct_components(since)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "failed to list components");
            err
        })?;

    let mut summaries = BTreeMap::new();
    for component in components {
        let summary = health::summarize(analyzer, &component, hours).await?;
        summaries.insert(component, summary);
    }
    Ok(summaries)
}

/// Build the system overview for the last `hours`.
pub async fn overview(analyzer: &Analyzer, hours: u64) -> Result<SystemOverview> {
    let summaries = component_summaries(analyzer, hours).await?;
    let overview = build_overview(
        hours,
        summaries,
        analyzer.thresholds(),
        analyzer.clock().now_ms(),
    );
    tracing::debug!(
        components = overview.component_summaries.len(),
        score = overview.overall_health_score,
        status = %overview.health_status,
        "system overview built"
    );
    Ok(overview)
}
