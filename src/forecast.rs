//! Scenario forecasting: simulated per-investor reactions to a named
//! situation.
//!
//! Composes the behavior profile and relationship strength engines: every
//! investor starts from the same base reaction distribution, ordered
//! scenario rules shift probability mass according to their behavioral
//! axes, a strong relationship dampens the negative categories, and the
//! result is renormalized to a proper distribution. Each execution is
//! appended to `scenario_runs` and never rewritten.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::behavior;
use crate::db::{DbError, NetworkDb};
use crate::entity::EntityRef;
use crate::strength;

/// Tag recorded on every persisted run.
pub const MODEL_VERSION: &str = "rules_v1";

/// Relationship strength at or above this dampens negative reactions.
const STRONG_RELATIONSHIP: i64 = 70;

/// Factor strings surfaced per investor.
const MAX_FACTORS: usize = 6;

/// The scenario taxonomy. Unknown input coerces to `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    MissedRevenue,
    DelayedExit,
    DownRound,
    ChooseBetweenInvestors,
    Custom,
}

impl ScenarioType {
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "missed_revenue" => ScenarioType::MissedRevenue,
            "delayed_exit" => ScenarioType::DelayedExit,
            "down_round" => ScenarioType::DownRound,
            "choose_between_investors" => ScenarioType::ChooseBetweenInvestors,
            _ => ScenarioType::Custom,
        }
    }

    /// Downside scenarios share the control/stress/conviction rules.
    fn is_downside(self) -> bool {
        matches!(self, ScenarioType::MissedRevenue | ScenarioType::DownRound)
    }
}

/// Probability mass over the six reaction categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionProbabilities {
    pub supportive: f64,
    pub neutral: f64,
    pub pressure: f64,
    pub control_push: f64,
    pub exit_push: f64,
    pub ghost: f64,
}

impl ReactionProbabilities {
    /// The shared starting distribution before any investor-specific rule.
    pub fn base() -> Self {
        Self {
            supportive: 0.30,
            neutral: 0.40,
            pressure: 0.15,
            control_push: 0.05,
            exit_push: 0.05,
            ghost: 0.05,
        }
    }

    pub fn sum(&self) -> f64 {
        self.supportive + self.neutral + self.pressure + self.control_push + self.exit_push + self.ghost
    }

    /// Rescale so the categories sum to 1.0.
    fn normalize(&mut self) {
        let total = self.sum();
        let total = if total > 0.0 { total } else { 1.0 };
        self.supportive = (self.supportive / total).max(0.0);
        self.neutral = (self.neutral / total).max(0.0);
        self.pressure = (self.pressure / total).max(0.0);
        self.control_push = (self.control_push / total).max(0.0);
        self.exit_push = (self.exit_push / total).max(0.0);
        self.ghost = (self.ghost / total).max(0.0);
    }
}

/// One investor's simulated reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorForecast {
    pub investor_id: i64,
    pub investor_name: String,
    pub probabilities: ReactionProbabilities,
    pub relationship_strength: i64,
    pub behavior_axes: behavior::AxisScores,
    pub confidence: f64,
    pub factors: Vec<String>,
}

/// Full result of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub scenario_type: ScenarioType,
    pub investors: Vec<InvestorForecast>,
    pub guidance: Vec<String>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Ordered, scenario-specific adjustments, then relationship dampening.
fn adjust_for_behavior_and_scenario(
    scenario_type: ScenarioType,
    axes: &behavior::AxisScores,
    relationship_strength: i64,
    probs: &mut ReactionProbabilities,
    factors: &mut Vec<String>,
) {
    if scenario_type.is_downside() {
        if axes.control_orientation >= 60.0 {
            probs.control_push += 0.10;
            probs.pressure += 0.05;
            factors.push(
                "High control orientation in downside scenario (+control_push, +pressure)".to_string(),
            );
        }
        if axes.stress_behavior >= 60.0 {
            probs.pressure += 0.10;
            factors.push("High stress reactivity in negative scenario (+pressure)".to_string());
        }
        if axes.conviction_strength >= 65.0 && axes.risk_appetite >= 60.0 {
            probs.supportive += 0.10;
            factors.push("High conviction and risk appetite (+supportive)".to_string());
        }
    }
    if scenario_type == ScenarioType::DelayedExit {
        if axes.patience < 45.0 {
            probs.exit_push += 0.10;
            probs.pressure += 0.05;
            factors.push("Low patience in delayed exit scenario (+exit_push, +pressure)".to_string());
        } else {
            probs.neutral += 0.05;
            factors.push("Higher patience dampens negative reactions (+neutral)".to_string());
        }
    }

    if relationship_strength >= STRONG_RELATIONSHIP {
        probs.supportive += 0.10;
        probs.pressure *= 0.7;
        probs.control_push *= 0.7;
        probs.exit_push *= 0.7;
        factors.push("Strong relationship reduces negative reactions (+supportive)".to_string());
    }
}

/// Forecast confidence from how much evidence backs the profile.
fn confidence_from_profile(profile: &behavior::BehaviorProfile, has_term_sheet: bool) -> f64 {
    let mut confidence = profile.confidence.mean();
    if profile.behavior_metrics.episodes_count >= 2 {
        confidence += 0.1;
    }
    if profile.behavior_metrics.events_count >= 10 {
        confidence += 0.1;
    }
    if has_term_sheet {
        confidence += 0.1;
    }
    confidence.clamp(0.1, 1.0)
}

/// Aggregate textual guidance: who is likely to push for control, who
/// stays supportive.
fn aggregate_guidance(investors: &[InvestorForecast]) -> Vec<String> {
    let mut guidance = Vec::new();

    let risky: Vec<&str> = investors
        .iter()
        .filter(|f| f.probabilities.control_push >= 0.2)
        .take(5)
        .map(|f| f.investor_name.as_str())
        .collect();
    if !risky.is_empty() {
        guidance.push(format!(
            "Investors likely to push for control terms: {}.",
            risky.join(", ")
        ));
    }

    let supportive: Vec<&str> = investors
        .iter()
        .filter(|f| f.probabilities.supportive >= 0.4)
        .take(5)
        .map(|f| f.investor_name.as_str())
        .collect();
    if !supportive.is_empty() {
        guidance.push(format!(
            "Most supportive profiles in this scenario: {}.",
            supportive.join(", ")
        ));
    }

    guidance
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run a scenario for a company: one forecast per investor, aggregated
/// guidance, and an immutable run record. The referenced scenario must
/// exist; everything else degrades rather than fails.
pub fn run_scenario(
    db: &NetworkDb,
    company_id: i64,
    scenario_id: i64,
) -> Result<ScenarioForecast, DbError> {
    let scenario = db
        .get_scenario(company_id, scenario_id)?
        .ok_or(DbError::ScenarioNotFound(scenario_id))?;
    let scenario_type = ScenarioType::from_str_lossy(&scenario.scenario_type);

    let investors = db.investors_for_company(company_id)?;
    let mut per_investor = Vec::new();
    let mut confidences = Vec::new();

    for investor in &investors {
        let profile = behavior::compute_behavior_profile(db, company_id, investor.id)?;

        // Strength toward the company context itself, addressed as an org
        let from = EntityRef::Investor(investor.id);
        let to = EntityRef::Org(format!("company:{}", company_id));
        let relationship =
            strength::compute_relationship_strength(db, company_id, &from, &to, 0, 0)?;
        let relationship_strength = relationship.relationship_strength;

        let mut probs = ReactionProbabilities::base();
        let mut factors = Vec::new();
        adjust_for_behavior_and_scenario(
            scenario_type,
            &profile.axis_scores,
            relationship_strength,
            &mut probs,
            &mut factors,
        );
        probs.normalize();
        factors.truncate(MAX_FACTORS);

        let has_term_sheet = db.has_term_sheet(company_id, investor.id)?;
        let confidence = confidence_from_profile(&profile, has_term_sheet);
        confidences.push(confidence);

        per_investor.push(InvestorForecast {
            investor_id: investor.id,
            investor_name: investor.full_name.clone(),
            probabilities: probs,
            relationship_strength,
            behavior_axes: profile.axis_scores,
            confidence,
            factors,
        });
    }

    let guidance = aggregate_guidance(&per_investor);
    let forecast = ScenarioForecast {
        scenario_type,
        investors: per_investor,
        guidance,
    };

    let avg_confidence = if confidences.is_empty() {
        0.1
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };
    let results_json = serde_json::to_string(&forecast).unwrap_or_else(|_| "{}".to_string());
    let run_ts = Utc::now().to_rfc3339();
    db.append_scenario_run(
        scenario_id,
        company_id,
        &run_ts,
        &results_json,
        avg_confidence,
        MODEL_VERSION,
    )?;

    log::info!(
        "Scenario run for company {}: {} investors, avg confidence {:.2}",
        company_id,
        forecast.investors.len(),
        avg_confidence
    );

    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::investors::NewInvestor;
    use crate::db::term_sheets::NewTermSheet;
    use crate::db::test_utils::test_db;

    fn axes(control: f64, stress: f64, patience: f64, conviction: f64, risk: f64) -> behavior::AxisScores {
        behavior::AxisScores {
            risk_appetite: risk,
            control_orientation: control,
            patience,
            stress_behavior: stress,
            relationship_style: 50.0,
            conviction_strength: conviction,
        }
    }

    #[test]
    fn test_probabilities_renormalize_to_one() {
        for scenario in [
            ScenarioType::MissedRevenue,
            ScenarioType::DelayedExit,
            ScenarioType::DownRound,
            ScenarioType::ChooseBetweenInvestors,
            ScenarioType::Custom,
        ] {
            for strength in [0, 100] {
                let mut probs = ReactionProbabilities::base();
                let mut factors = Vec::new();
                adjust_for_behavior_and_scenario(
                    scenario,
                    &axes(80.0, 80.0, 20.0, 80.0, 80.0),
                    strength,
                    &mut probs,
                    &mut factors,
                );
                probs.normalize();
                assert!(
                    (probs.sum() - 1.0).abs() < 1e-6,
                    "sum for {:?}/{} was {}",
                    scenario,
                    strength,
                    probs.sum()
                );
            }
        }
    }

    #[test]
    fn test_downside_rules_shift_mass() {
        let mut probs = ReactionProbabilities::base();
        adjust_for_behavior_and_scenario(
            ScenarioType::DownRound,
            &axes(65.0, 50.0, 50.0, 50.0, 50.0),
            0,
            &mut probs,
            &mut Vec::new(),
        );
        assert!(probs.control_push > ReactionProbabilities::base().control_push);

        // Neutral axes in a custom scenario: base distribution untouched
        let mut unchanged = ReactionProbabilities::base();
        adjust_for_behavior_and_scenario(
            ScenarioType::Custom,
            &axes(50.0, 50.0, 50.0, 50.0, 50.0),
            0,
            &mut unchanged,
            &mut Vec::new(),
        );
        assert_eq!(unchanged.control_push, ReactionProbabilities::base().control_push);
    }

    #[test]
    fn test_strong_relationship_dampens() {
        let mut damped = ReactionProbabilities::base();
        adjust_for_behavior_and_scenario(
            ScenarioType::DownRound,
            &axes(65.0, 65.0, 50.0, 50.0, 50.0),
            85,
            &mut damped,
            &mut Vec::new(),
        );
        let mut raw = ReactionProbabilities::base();
        adjust_for_behavior_and_scenario(
            ScenarioType::DownRound,
            &axes(65.0, 65.0, 50.0, 50.0, 50.0),
            0,
            &mut raw,
            &mut Vec::new(),
        );
        damped.normalize();
        raw.normalize();
        assert!(damped.pressure < raw.pressure);
        assert!(damped.supportive > raw.supportive);
    }

    #[test]
    fn test_unknown_scenario_type_is_custom() {
        assert_eq!(ScenarioType::from_str_lossy("meteor_strike"), ScenarioType::Custom);
        assert_eq!(ScenarioType::from_str_lossy("down_round"), ScenarioType::DownRound);
    }

    #[test]
    fn test_guidance_thresholds() {
        let make = |name: &str, control_push: f64, supportive: f64| InvestorForecast {
            investor_id: 1,
            investor_name: name.to_string(),
            probabilities: ReactionProbabilities {
                supportive,
                neutral: 0.2,
                pressure: 0.1,
                control_push,
                exit_push: 0.05,
                ghost: 0.05,
            },
            relationship_strength: 0,
            behavior_axes: axes(50.0, 50.0, 50.0, 50.0, 50.0),
            confidence: 0.5,
            factors: Vec::new(),
        };
        let guidance = aggregate_guidance(&[
            make("Hardball Harry", 0.25, 0.1),
            make("Friendly Fran", 0.05, 0.45),
            make("Quiet Quinn", 0.05, 0.2),
        ]);
        assert_eq!(guidance.len(), 2);
        assert!(guidance[0].contains("Hardball Harry"));
        assert!(!guidance[0].contains("Quinn"));
        assert!(guidance[1].contains("Friendly Fran"));
    }

    #[test]
    fn test_run_scenario_end_to_end() {
        let db = test_db();
        let now = "2026-01-01T00:00:00";
        let company_id = db.insert_company("Startup Co", now).unwrap();
        let inv = db
            .insert_investor(
                company_id,
                &NewInvestor { full_name: "Dana Wells".into(), ..Default::default() },
                now,
            )
            .unwrap();
        let investor = EntityRef::Investor(inv);
        db.append_interaction(company_id, None, &investor, "intro_sent", "2026-01-02T00:00:00", None)
            .unwrap();
        db.append_interaction(company_id, None, &investor, "declined", "2026-01-09T00:00:00", None)
            .unwrap();

        let scenario_id = db
            .insert_scenario(company_id, "Q3 miss", "missed_revenue", None, None, now)
            .unwrap();

        let forecast = run_scenario(&db, company_id, scenario_id).unwrap();
        assert_eq!(forecast.investors.len(), 1);
        let f = &forecast.investors[0];
        assert!((f.probabilities.sum() - 1.0).abs() < 1e-6);
        let no_sheet_confidence = f.confidence;

        // A term sheet raises confidence, everything else equal
        db.insert_term_sheet(company_id, inv, &NewTermSheet::default()).unwrap();
        let forecast = run_scenario(&db, company_id, scenario_id).unwrap();
        let with_sheet_confidence = forecast.investors[0].confidence;
        assert!(with_sheet_confidence >= no_sheet_confidence);
        assert!((with_sheet_confidence - no_sheet_confidence - 0.1).abs() < 1e-9);

        // Two executions, two immutable run rows
        let runs = db.runs_for_scenario(company_id, scenario_id).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.model_version.as_deref() == Some(MODEL_VERSION)));

        // Unknown scenario id is a structural failure
        assert!(run_scenario(&db, company_id, scenario_id + 99).is_err());
    }
}
