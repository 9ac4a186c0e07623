//! Negotiation intelligence: term-sheet clause patterns per investor.
//!
//! Aggregates how often each clause shows up across an investor's term
//! sheets and maps the likelihoods onto founder-friendliness and
//! control-risk scales.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::behavior;
use crate::db::{DbError, NetworkDb};

/// The clause vocabulary. `parsed_terms_json` documents are keyed by these
/// names; anything else in a document is ignored.
pub const CLAUSE_KEYS: &[&str] = &[
    "liquidation_pref",
    "participation",
    "board_seat",
    "protective_provisions",
    "drag_along",
    "pro_rata",
    "redemption",
    "veto_rights",
];

/// Clauses that shift economics away from the founders.
const ECON_CLAUSES: &[&str] = &["liquidation_pref", "participation", "redemption"];

/// Clauses that shift control away from the founders.
const CONTROL_CLAUSES: &[&str] = &["board_seat", "protective_provisions", "veto_rights", "drag_along"];

/// Per-clause occurrence counts and likelihoods across one investor's
/// term sheets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClauseStats {
    pub frequency: BTreeMap<String, usize>,
    pub likelihood: BTreeMap<String, f64>,
}

/// Aggregated negotiation profile for (company, investor).
#[derive(Debug, Clone, Serialize)]
pub struct ClauseProfile {
    pub clause_stats: ClauseStats,
    pub founder_friendliness_score: i64,
    pub control_risk_score: i64,
}

/// Side-by-side comparison row.
#[derive(Debug, Clone, Serialize)]
pub struct InvestorComparison {
    pub investor_id: i64,
    pub investor_name: String,
    pub behavior_axes: behavior::AxisScores,
    pub behavior_confidence: behavior::AxisConfidence,
    pub behavior_metrics: behavior::BehaviorMetrics,
    pub founder_friendliness_score: i64,
    pub control_risk_score: i64,
    pub clause_stats: ClauseStats,
}

/// A clause counts as present unless it is null or an empty/"none"/"off"
/// string.
fn clause_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => {
            !matches!(s.trim().to_lowercase().as_str(), "" | "none" | "off")
        }
        Some(_) => true,
    }
}

/// Aggregate clause frequency/likelihood over parsed term-sheet documents.
/// Malformed documents were already dropped by the caller; an empty set
/// yields all-zero likelihoods rather than an error.
pub fn aggregate_clause_stats(term_sheets: &[serde_json::Value]) -> ClauseStats {
    let total = term_sheets.len().max(1);
    let mut stats = ClauseStats::default();
    for key in CLAUSE_KEYS {
        let freq = term_sheets
            .iter()
            .filter(|doc| clause_present(doc.get(*key)))
            .count();
        stats.frequency.insert(key.to_string(), freq);
        stats.likelihood.insert(key.to_string(), freq as f64 / total as f64);
    }
    stats
}

/// Map clause likelihoods to (founder_friendliness, control_risk) scores.
pub fn scores_from_clause_stats(stats: &ClauseStats) -> (i64, i64) {
    let likelihood = |key: &str| stats.likelihood.get(key).copied().unwrap_or(0.0);

    let econ_sum: f64 = ECON_CLAUSES.iter().map(|&k| likelihood(k)).sum();
    let control_sum: f64 = CONTROL_CLAUSES.iter().map(|&k| likelihood(k)).sum();

    let econ_risk = (econ_sum / ECON_CLAUSES.len() as f64).min(1.0);
    let control_risk = (control_sum / CONTROL_CLAUSES.len() as f64).min(1.0);

    let control_risk_score = (control_risk * 100.0).round() as i64;
    let founder_friendliness_score = ((1.0 - econ_risk.max(control_risk)) * 100.0).round() as i64;
    (founder_friendliness_score, control_risk_score)
}

/// Recompute and store the clause patterns for an investor from its term
/// sheets. Term sheets with malformed `parsed_terms_json` are skipped.
pub fn update_investor_clause_patterns(
    db: &NetworkDb,
    company_id: i64,
    investor_id: i64,
) -> Result<ClauseProfile, DbError> {
    let parsed: Vec<serde_json::Value> = db
        .term_sheets_for_investor(company_id, investor_id)?
        .into_iter()
        .filter_map(|sheet| sheet.parsed_terms_json)
        .filter_map(|raw| serde_json::from_str(&raw).ok())
        .collect();

    let stats = aggregate_clause_stats(&parsed);
    let (founder_friendliness, control_risk) = scores_from_clause_stats(&stats);

    let stats_json = serde_json::to_string(&stats).unwrap_or_else(|_| "{}".to_string());
    let now = Utc::now().to_rfc3339();
    db.upsert_clause_patterns(
        company_id,
        investor_id,
        &stats_json,
        founder_friendliness,
        control_risk,
        &now,
    )?;

    Ok(ClauseProfile {
        clause_stats: stats,
        founder_friendliness_score: founder_friendliness,
        control_risk_score: control_risk,
    })
}

/// Stored clause profile for an investor, computing on cache miss.
/// Malformed stored stats degrade to empty stats.
pub fn get_investor_clause_profile(
    db: &NetworkDb,
    company_id: i64,
    investor_id: i64,
) -> Result<ClauseProfile, DbError> {
    let Some(row) = db.get_clause_patterns(company_id, investor_id)? else {
        return update_investor_clause_patterns(db, company_id, investor_id);
    };
    let stats = row
        .clause_stats_json
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    Ok(ClauseProfile {
        clause_stats: stats,
        founder_friendliness_score: row.founder_friendliness_score.unwrap_or(50),
        control_risk_score: row.control_risk_score.unwrap_or(50),
    })
}

/// Side-by-side investor comparison: behavior profile joined with clause
/// patterns. Unknown investor ids are skipped, not errors.
pub fn compare_investors(
    db: &NetworkDb,
    company_id: i64,
    investor_ids: &[i64],
) -> Result<Vec<InvestorComparison>, DbError> {
    let mut results = Vec::new();
    for &investor_id in investor_ids {
        let Some(investor) = db.get_investor(investor_id)? else {
            continue;
        };
        if investor.company_id != company_id {
            continue;
        }
        let profile = behavior::compute_behavior_profile(db, company_id, investor_id)?;
        let clause_profile = get_investor_clause_profile(db, company_id, investor_id)?;
        results.push(InvestorComparison {
            investor_id,
            investor_name: investor.full_name,
            behavior_axes: profile.axis_scores,
            behavior_confidence: profile.confidence,
            behavior_metrics: profile.behavior_metrics,
            founder_friendliness_score: clause_profile.founder_friendliness_score,
            control_risk_score: clause_profile.control_risk_score,
            clause_stats: clause_profile.clause_stats,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::investors::NewInvestor;
    use crate::db::term_sheets::NewTermSheet;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_clause_present_semantics() {
        let doc = serde_json::json!({
            "board_seat": "1 seat",
            "veto_rights": "",
            "drag_along": "none",
            "pro_rata": "off",
            "participation": null,
        });
        assert!(clause_present(doc.get("board_seat")));
        assert!(!clause_present(doc.get("veto_rights")));
        assert!(!clause_present(doc.get("drag_along")));
        assert!(!clause_present(doc.get("pro_rata")));
        assert!(!clause_present(doc.get("participation")));
        assert!(!clause_present(doc.get("redemption")));
    }

    #[test]
    fn test_aggregate_likelihoods() {
        let sheets = vec![
            serde_json::json!({"board_seat": "1 seat", "liquidation_pref": "1x"}),
            serde_json::json!({"board_seat": "observer"}),
        ];
        let stats = aggregate_clause_stats(&sheets);
        assert_eq!(stats.frequency["board_seat"], 2);
        assert_eq!(stats.likelihood["board_seat"], 1.0);
        assert_eq!(stats.likelihood["liquidation_pref"], 0.5);
        assert_eq!(stats.likelihood["redemption"], 0.0);

        // No sheets: all zero, no division by zero
        let empty = aggregate_clause_stats(&[]);
        assert_eq!(empty.likelihood["board_seat"], 0.0);
    }

    #[test]
    fn test_scores_from_stats() {
        // Every control clause in every sheet
        let sheets = vec![serde_json::json!({
            "board_seat": "1 seat",
            "protective_provisions": "standard",
            "veto_rights": "broad",
            "drag_along": "yes",
        })];
        let stats = aggregate_clause_stats(&sheets);
        let (friendliness, control_risk) = scores_from_clause_stats(&stats);
        assert_eq!(control_risk, 100);
        assert_eq!(friendliness, 0);

        // Nothing at all: maximally founder-friendly
        let (friendliness, control_risk) = scores_from_clause_stats(&aggregate_clause_stats(&[]));
        assert_eq!(control_risk, 0);
        assert_eq!(friendliness, 100);
    }

    #[test]
    fn test_update_skips_malformed_documents() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", "2026-01-01T00:00:00").unwrap();
        let inv = db
            .insert_investor(
                company_id,
                &NewInvestor { full_name: "Dana Wells".into(), ..Default::default() },
                "2026-01-01T00:00:00",
            )
            .unwrap();
        db.insert_term_sheet(
            company_id,
            inv,
            &NewTermSheet {
                parsed_terms_json: Some("{\"board_seat\": \"1 seat\"}".into()),
                ..Default::default()
            },
        )
        .unwrap();
        db.insert_term_sheet(
            company_id,
            inv,
            &NewTermSheet { parsed_terms_json: Some("{broken".into()), ..Default::default() },
        )
        .unwrap();

        let profile = update_investor_clause_patterns(&db, company_id, inv).unwrap();
        // Only the well-formed sheet contributes
        assert_eq!(profile.clause_stats.frequency["board_seat"], 1);
        assert_eq!(profile.clause_stats.likelihood["board_seat"], 1.0);

        // Cached read agrees
        let cached = get_investor_clause_profile(&db, company_id, inv).unwrap();
        assert_eq!(cached.control_risk_score, profile.control_risk_score);
    }

    #[test]
    fn test_compare_skips_unknown_and_foreign_investors() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", "2026-01-01T00:00:00").unwrap();
        let other_company = db.insert_company("Other Co", "2026-01-01T00:00:00").unwrap();
        let inv = db
            .insert_investor(
                company_id,
                &NewInvestor { full_name: "Dana Wells".into(), ..Default::default() },
                "2026-01-01T00:00:00",
            )
            .unwrap();
        let foreign = db
            .insert_investor(
                other_company,
                &NewInvestor { full_name: "Not Yours".into(), ..Default::default() },
                "2026-01-01T00:00:00",
            )
            .unwrap();

        let rows = compare_investors(&db, company_id, &[inv, foreign, 9999]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].investor_name, "Dana Wells");
        assert_eq!(rows[0].founder_friendliness_score, 100);
    }
}
