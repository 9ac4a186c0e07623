//! Relationship strength: an explainable 0–100 score between any two
//! addressable entities.
//!
//! Four independently-capped factor groups (network proximity,
//! interaction intensity, recency, pipeline progress) sum to a 100-point
//! scale. Every fired rule appends a human-readable factor, and
//! the result is cached in the `relationships` table keyed by the
//! (from, to) pair.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{DbError, NetworkDb};
use crate::entity::EntityRef;

const MAX_NETWORK_PTS: f64 = 25.0;
const MAX_INTENSITY_PTS: f64 = 35.0;
const MAX_RECENCY_PTS: f64 = 20.0;
const MAX_PROGRESS_PTS: f64 = 20.0;

/// Strength result, as persisted and returned.
#[derive(Debug, Clone, Serialize)]
pub struct StrengthResult {
    pub relationship_strength: i64,
    pub factors: Vec<String>,
    pub last_interaction_ts: Option<String>,
}

// ---------------------------------------------------------------------------
// Factor groups (pure)
// ---------------------------------------------------------------------------

fn network_points(
    shared_investors_count: usize,
    shared_org_count: usize,
    factors: &mut Vec<String>,
) -> f64 {
    let mut pts: f64 = 0.0;
    match shared_investors_count {
        0 => {}
        1 => {
            pts += 6.0;
            factors.push("Seen in 1 investor network (+6)".to_string());
        }
        2 => {
            pts += 12.0;
            factors.push("Seen in 2 investor networks (+12)".to_string());
        }
        n => {
            pts += 18.0;
            factors.push(format!("Seen in {} investor networks (+18)", n));
        }
    }
    match shared_org_count {
        0 => {}
        1 => {
            pts += 4.0;
            factors.push("Org appears in your network (+4)".to_string());
        }
        _ => {
            pts += 7.0;
            factors.push("Common org across networks (+7)".to_string());
        }
    }
    pts.min(MAX_NETWORK_PTS)
}

fn intensity_points(event_counts: &HashMap<String, usize>, factors: &mut Vec<String>) -> f64 {
    let count = |key: &str| event_counts.get(key).copied().unwrap_or(0);

    let meetings = count("meeting_completed");
    let replies = count("email_reply");
    let docs = count("doc_shared") + count("term_sheet_received") + count("term_sheet_signed");
    let commitments = count("commitment_made") + count("investment_closed");

    let mut pts = 0.0;
    if meetings > 0 {
        let m_pts = (meetings as f64 * 6.0).min(20.0);
        pts += m_pts;
        factors.push(format!("{} meeting(s) completed (+{})", meetings, m_pts as i64));
    }
    if replies > 0 {
        let r_pts = (replies as f64 * 2.0).min(8.0);
        pts += r_pts;
        factors.push(format!("{} reply event(s) (+{})", replies, r_pts as i64));
    }
    if docs > 0 {
        let d_pts = (docs as f64 * 2.5).min(5.0);
        pts += d_pts;
        factors.push(format!("{} doc/term-sheet event(s) (+{})", docs, d_pts as i64));
    }
    if commitments > 0 {
        let c_pts = (commitments as f64 * 10.0).min(10.0);
        pts += c_pts;
        factors.push(format!("{} commitment/closing event(s) (+{})", commitments, c_pts as i64));
    }
    pts.min(MAX_INTENSITY_PTS)
}

fn recency_points(days_since: Option<f64>, factors: &mut Vec<String>) -> f64 {
    let Some(days) = days_since else { return 0.0 };
    if days <= 7.0 {
        factors.push("Last touch within 7 days (+20)".to_string());
        MAX_RECENCY_PTS
    } else if days <= 30.0 {
        factors.push("Last touch within 30 days (+12)".to_string());
        12.0
    } else if days <= 90.0 {
        factors.push("Last touch within 90 days (+6)".to_string());
        6.0
    } else {
        factors.push("Last touch over 90 days ago (+0)".to_string());
        0.0
    }
}

fn progress_points(current_status: Option<&str>, factors: &mut Vec<String>) -> f64 {
    let Some(status) = current_status else { return 0.0 };
    let status = status.to_lowercase();
    let pts: f64 = match status.as_str() {
        "prospect" => 0.0,
        "contacted" => 4.0,
        "meeting" => 8.0,
        "interested" => 12.0,
        "committed" => 16.0,
        "invested" => 20.0,
        "inactive" => 0.0,
        _ => 0.0,
    };
    if pts > 0.0 {
        factors.push(format!("Pipeline stage: {} (+{})", status, pts as i64));
    }
    pts.min(MAX_PROGRESS_PTS)
}

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

/// Parse an RFC3339/ISO-8601 timestamp, tolerating the SQLite
/// `YYYY-MM-DD HH:MM:SS` and bare `YYYY-MM-DDTHH:MM:SS` forms.
fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(ts, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Fractional days since the given timestamp; None when unparseable.
fn days_ago(ts: &str) -> Option<f64> {
    let parsed = parse_ts(ts)?;
    let secs = (Utc::now() - parsed).num_seconds() as f64;
    Some((secs / 86400.0).max(0.0))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute relationship strength between two entities, persist it to the
/// `relationships` cache, and return the explained result.
///
/// Missing data degrades to neutral: no events means zero intensity and
/// recency, no status history means zero progress. The score never fails
/// for lack of signal.
pub fn compute_relationship_strength(
    db: &NetworkDb,
    company_id: i64,
    from: &EntityRef,
    to: &EntityRef,
    shared_investors_count: usize,
    shared_org_count: usize,
) -> Result<StrengthResult, DbError> {
    let mut factors = Vec::new();

    let net_pts = network_points(shared_investors_count, shared_org_count, &mut factors);

    // Interaction intensity + last touch across the pair (both directions)
    let events = db.interactions_for_pair(company_id, from, to)?;
    let mut event_counts: HashMap<String, usize> = HashMap::new();
    let mut last_ts: Option<String> = None;
    for event in &events {
        *event_counts.entry(event.event_type.clone()).or_insert(0) += 1;
        if last_ts.as_deref().map(|prev| event.event_ts.as_str() > prev).unwrap_or(true) {
            last_ts = Some(event.event_ts.clone());
        }
    }
    let intensity_pts = intensity_points(&event_counts, &mut factors);

    let rec_pts = recency_points(last_ts.as_deref().and_then(days_ago), &mut factors);

    // Progression depth of the counterpart
    let status = db.latest_status(company_id, to)?;
    let prog_pts = progress_points(status.as_deref(), &mut factors);

    let total = net_pts + intensity_pts + rec_pts + prog_pts;
    let max_pts = MAX_NETWORK_PTS + MAX_INTENSITY_PTS + MAX_RECENCY_PTS + MAX_PROGRESS_PTS;
    let strength = ((total / max_pts) * 100.0).clamp(0.0, 100.0).round() as i64;

    let factors_json = serde_json::to_string(&factors).unwrap_or_else(|_| "[]".to_string());
    let now = Utc::now().to_rfc3339();
    db.upsert_relationship(
        company_id,
        from,
        to,
        strength,
        &factors_json,
        last_ts.as_deref(),
        &now,
    )?;

    Ok(StrengthResult {
        relationship_strength: strength,
        factors,
        last_interaction_ts: last_ts,
    })
}

/// Convenience wrapper for investor ↔ candidate strength.
pub fn compute_investor_candidate_strength(
    db: &NetworkDb,
    company_id: i64,
    investor_id: i64,
    candidate_name: &str,
    candidate_linkedin_url: &str,
    shared_investors_count: usize,
    shared_org_count: usize,
) -> Result<StrengthResult, DbError> {
    let from = EntityRef::Investor(investor_id);
    let to = EntityRef::candidate(candidate_name, candidate_linkedin_url);
    compute_relationship_strength(
        db,
        company_id,
        &from,
        &to,
        shared_investors_count,
        shared_org_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_network_points_monotonic_in_shared_investors() {
        let mut prev = -1.0;
        for shared in 0..6 {
            let pts = network_points(shared, 0, &mut Vec::new());
            assert!(pts >= prev, "tier for {} dropped below {}", shared, prev);
            prev = pts;
        }
        assert_eq!(network_points(1, 0, &mut Vec::new()), 6.0);
        assert_eq!(network_points(2, 0, &mut Vec::new()), 12.0);
        assert_eq!(network_points(3, 0, &mut Vec::new()), 18.0);
        assert_eq!(network_points(3, 2, &mut Vec::new()), 25.0);
    }

    #[test]
    fn test_intensity_caps() {
        let mut factors = Vec::new();
        // 4 meetings would be 24 raw, capped at 20
        let pts = intensity_points(&counts(&[("meeting_completed", 4)]), &mut factors);
        assert_eq!(pts, 20.0);
        // Each bucket saturates independently, group capped at 35
        let all = counts(&[
            ("meeting_completed", 10),
            ("email_reply", 10),
            ("doc_shared", 10),
            ("commitment_made", 3),
        ]);
        let pts = intensity_points(&all, &mut Vec::new());
        assert_eq!(pts, 35.0);
    }

    #[test]
    fn test_recency_tiers() {
        assert_eq!(recency_points(Some(3.0), &mut Vec::new()), 20.0);
        assert_eq!(recency_points(Some(20.0), &mut Vec::new()), 12.0);
        assert_eq!(recency_points(Some(60.0), &mut Vec::new()), 6.0);
        assert_eq!(recency_points(Some(200.0), &mut Vec::new()), 0.0);
        // No timestamp at all: no points, no factor
        let mut factors = Vec::new();
        assert_eq!(recency_points(None, &mut factors), 0.0);
        assert!(factors.is_empty());
    }

    #[test]
    fn test_progress_mapping() {
        assert_eq!(progress_points(Some("prospect"), &mut Vec::new()), 0.0);
        assert_eq!(progress_points(Some("contacted"), &mut Vec::new()), 4.0);
        assert_eq!(progress_points(Some("meeting"), &mut Vec::new()), 8.0);
        assert_eq!(progress_points(Some("interested"), &mut Vec::new()), 12.0);
        assert_eq!(progress_points(Some("committed"), &mut Vec::new()), 16.0);
        assert_eq!(progress_points(Some("Invested"), &mut Vec::new()), 20.0);
        assert_eq!(progress_points(Some("inactive"), &mut Vec::new()), 0.0);
        assert_eq!(progress_points(Some("who-knows"), &mut Vec::new()), 0.0);
        assert_eq!(progress_points(None, &mut Vec::new()), 0.0);
    }

    #[test]
    fn test_parse_ts_formats() {
        assert!(parse_ts("2026-01-01T00:00:00+00:00").is_some());
        assert!(parse_ts("2026-01-01T00:00:00").is_some());
        assert!(parse_ts("2026-01-01 00:00:00").is_some());
        assert!(parse_ts("not a time").is_none());
    }

    #[test]
    fn test_strength_bounds_and_persistence() {
        let db = test_db();
        let from = EntityRef::Investor(1);
        let to = EntityRef::candidate("Jane Doe", "");

        // Recent + intense + committed + fully shared: pins the scale at 100
        let recent = Utc::now().to_rfc3339();
        for _ in 0..4 {
            db.append_interaction(1, None, &to, "meeting_completed", &recent, None).unwrap();
        }
        for _ in 0..4 {
            db.append_interaction(1, None, &to, "email_reply", &recent, None).unwrap();
        }
        db.append_interaction(1, None, &to, "doc_shared", &recent, None).unwrap();
        db.append_interaction(1, None, &to, "term_sheet_received", &recent, None).unwrap();
        db.append_interaction(1, None, &to, "commitment_made", &recent, None).unwrap();
        db.append_status(1, &to, "invested", &recent, None).unwrap();

        let result = compute_relationship_strength(&db, 1, &from, &to, 3, 2).unwrap();
        assert_eq!(result.relationship_strength, 100);
        assert!(!result.factors.is_empty());

        // Cached row exists and matches
        let row = db.get_relationship(1, &from, &to).unwrap().unwrap();
        assert_eq!(row.relationship_strength, Some(100));

        // No signal at all: floor of zero, not an error
        let cold = compute_relationship_strength(
            &db,
            1,
            &EntityRef::Investor(2),
            &EntityRef::Org("somewhere".into()),
            0,
            0,
        )
        .unwrap();
        assert_eq!(cold.relationship_strength, 0);
    }

    #[test]
    fn test_strength_monotonic_in_shared_investors() {
        let db = test_db();
        let to = EntityRef::candidate("Jane Doe", "");
        let mut prev = -1;
        for shared in 0..5 {
            let result = compute_relationship_strength(
                &db,
                1,
                &EntityRef::Investor(1),
                &to,
                shared,
                0,
            )
            .unwrap();
            assert!(
                result.relationship_strength >= prev,
                "strength dropped at shared={}",
                shared
            );
            prev = result.relationship_strength;
        }
    }
}
