//! Network Leverage Index: a monthly composite of network reach and
//! activity.
//!
//! Combines the stored access map (reach), overlap analytics (density),
//! interaction velocity within the month, and how capital-adjacent the
//! graph's labels look. One snapshot row per (company, month), upserted.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, NetworkDb};
use crate::normalize::{extract_firm_type_tokens, matches_title_pattern};
use crate::overlap::compute_overlap_intelligence;

/// Events that count toward intro velocity.
const VELOCITY_EVENTS: &[&str] = &["intro_sent", "meeting_scheduled", "meeting_completed"];

/// Saturation points for the component normalizations.
const ACCESS_SATURATION: f64 = 500.0;
const VELOCITY_SATURATION: f64 = 50.0;
const CAPITAL_SATURATION: f64 = 100.0;

/// One monthly snapshot's metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NliMetrics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub overlap_density: f64,
    pub intro_velocity: i64,
    pub capital_adjacency: usize,
    pub nli_score: i64,
}

/// A snapshot as returned from history; `metrics` degrades to `{}` when
/// the stored JSON is malformed.
#[derive(Debug, Clone, Serialize)]
pub struct NliSnapshot {
    pub month: String,
    pub metrics: serde_json::Value,
}

/// First day of the month holding `month`, as the stored key.
fn month_start(month: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(month.year(), month.month(), 1).unwrap_or(month)
}

/// First day of the following month (exclusive window end).
fn next_month_start(start: NaiveDate) -> NaiveDate {
    if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap_or(start)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1).unwrap_or(start)
    }
}

/// Compute and store the NLI snapshot for a company and month.
pub fn compute_nli(db: &NetworkDb, company_id: i64, month: NaiveDate) -> Result<NliMetrics, DbError> {
    let snapshot_month = month_start(month);
    let month_key = snapshot_month.format("%Y-%m-%d").to_string();

    // Reach: the stored access map
    let nodes = db.graph_nodes_for_company(company_id)?;
    let edge_count = db.graph_edges_for_company(company_id)?.len();
    let node_count = nodes.len();

    // Density: overlap share of the combined network
    let overlap = compute_overlap_intelligence(db, company_id)?;
    let overlap_density = overlap.overlap_percentage;

    // Activity: intro-adjacent events inside the month window
    let window_start = month_key.clone();
    let window_end = next_month_start(snapshot_month).format("%Y-%m-%d").to_string();
    let intro_velocity =
        db.count_events_between(company_id, &window_start, &window_end, VELOCITY_EVENTS)?;

    // Capital adjacency: labels that read like firms or investor titles
    let capital_adjacency = nodes
        .iter()
        .filter(|n| {
            let label = n.label.trim();
            !label.is_empty()
                && (!extract_firm_type_tokens(label).is_empty() || matches_title_pattern(label))
        })
        .count();

    let access_score = (node_count as f64 / ACCESS_SATURATION).min(1.0);
    let overlap_score = overlap_density / 100.0;
    let intro_score = (intro_velocity as f64 / VELOCITY_SATURATION).min(1.0);
    let capital_score = (capital_adjacency as f64 / CAPITAL_SATURATION).min(1.0);

    let nli_score = ((0.35 * access_score
        + 0.25 * overlap_score
        + 0.20 * intro_score
        + 0.20 * capital_score)
        * 100.0)
        .round() as i64;

    let metrics = NliMetrics {
        total_nodes: node_count,
        total_edges: edge_count,
        overlap_density,
        intro_velocity,
        capital_adjacency,
        nli_score,
    };

    let metrics_json = serde_json::to_string(&metrics).unwrap_or_else(|_| "{}".to_string());
    let now = chrono::Utc::now().to_rfc3339();
    db.upsert_network_snapshot(company_id, &month_key, &metrics_json, &now)?;

    log::info!(
        "NLI snapshot for company {} {}: score {}",
        company_id,
        month_key,
        nli_score
    );

    Ok(metrics)
}

/// Recent NLI snapshots, newest month first.
pub fn get_nli_history(
    db: &NetworkDb,
    company_id: i64,
    months: i64,
) -> Result<Vec<NliSnapshot>, DbError> {
    Ok(db
        .recent_network_snapshots(company_id, months)?
        .into_iter()
        .map(|row| NliSnapshot {
            month: row.snapshot_month,
            metrics: row
                .metrics_json
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_else(|| serde_json::json!({})),
        })
        .collect())
}
