//! Investor behavior profiling from the interaction event log.
//!
//! The chronologically-sorted log is parsed into "decision episodes"
//! (bounded spans from an intro to a decision) by a two-state machine.
//! Raw metrics derived from episodes and event counts feed six 0–100
//! behavioral axes, each with its own confidence from a saturating step
//! over how much evidence exists.
//!
//! Parser invariants, kept deliberately: a second `intro_sent` while an
//! episode is open is ignored, and a trailing unterminated episode at
//! end-of-log is dropped. Both can under-count real decision cycles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbInteraction, NetworkDb};
use crate::entity::EntityRef;

/// Event types that close an open episode.
const DECISION_EVENTS: &[&str] = &["declined", "commitment_made", "investment_closed"];

/// One closed decision episode.
#[derive(Debug, Clone)]
pub struct DecisionEpisode {
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub meetings: usize,
}

impl DecisionEpisode {
    /// Elapsed days from intro to decision.
    pub fn duration_days(&self) -> f64 {
        (self.end_ts - self.start_ts).num_seconds() as f64 / 86400.0
    }
}

/// Raw behavior metrics. `followup_latency_hours` needs pairwise
/// send/reply matching the log does not carry yet, so it stays `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub avg_time_to_decision_days: Option<f64>,
    pub avg_meetings_to_decision: Option<f64>,
    pub response_rate: Option<f64>,
    pub followup_latency_hours: Option<f64>,
    pub episodes_count: usize,
    pub ghosted_count: usize,
    pub events_count: usize,
    pub priority_style: String,
    pub reliability: String,
}

/// The six behavioral axes, each 0–100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisScores {
    pub risk_appetite: f64,
    pub control_orientation: f64,
    pub patience: f64,
    pub stress_behavior: f64,
    pub relationship_style: f64,
    pub conviction_strength: f64,
}

/// Per-axis confidence, each 0–1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfidence {
    pub risk_appetite: f64,
    pub control_orientation: f64,
    pub patience: f64,
    pub stress_behavior: f64,
    pub relationship_style: f64,
    pub conviction_strength: f64,
}

impl AxisConfidence {
    /// Mean confidence across the six axes.
    pub fn mean(&self) -> f64 {
        (self.risk_appetite
            + self.control_orientation
            + self.patience
            + self.stress_behavior
            + self.relationship_style
            + self.conviction_strength)
            / 6.0
    }
}

/// Full behavior profile for one investor at one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub axis_scores: AxisScores,
    pub confidence: AxisConfidence,
    pub behavior_metrics: BehaviorMetrics,
}

// ---------------------------------------------------------------------------
// Episode parsing
// ---------------------------------------------------------------------------

fn parse_event_ts(ts: &str) -> Option<DateTime<Utc>> {
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

/// Walk the sorted log and build closed decision episodes plus raw event
/// counts. Events with unparseable timestamps still count toward totals
/// but cannot move the state machine.
pub fn parse_episodes(events: &[DbInteraction]) -> (Vec<DecisionEpisode>, HashMap<String, usize>) {
    let mut episodes = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    struct OpenEpisode {
        start_ts: DateTime<Utc>,
        meetings: usize,
    }
    let mut current: Option<OpenEpisode> = None;

    for event in events {
        *counts.entry(event.event_type.clone()).or_insert(0) += 1;
        let Some(ts) = parse_event_ts(&event.event_ts) else {
            continue;
        };

        if event.event_type == "intro_sent" && current.is_none() {
            current = Some(OpenEpisode { start_ts: ts, meetings: 0 });
        }
        if event.event_type == "meeting_completed" {
            if let Some(open) = current.as_mut() {
                open.meetings += 1;
            }
        }
        if DECISION_EVENTS.contains(&event.event_type.as_str()) {
            if let Some(open) = current.take() {
                episodes.push(DecisionEpisode {
                    start_ts: open.start_ts,
                    end_ts: ts,
                    meetings: open.meetings,
                });
            }
        }
    }
    // A trailing open episode has no decision to measure: dropped.
    (episodes, counts)
}

// ---------------------------------------------------------------------------
// Metrics and rules
// ---------------------------------------------------------------------------

fn behavior_metrics(episodes: &[DecisionEpisode], counts: &HashMap<String, usize>) -> BehaviorMetrics {
    let durations: Vec<f64> = episodes.iter().map(|e| e.duration_days()).collect();
    let meetings: Vec<usize> = episodes.iter().map(|e| e.meetings).collect();

    let avg_time_to_decision_days = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };
    let avg_meetings_to_decision = if meetings.is_empty() {
        None
    } else {
        Some(meetings.iter().sum::<usize>() as f64 / meetings.len() as f64)
    };

    let sent = counts.get("email_sent").copied().unwrap_or(0);
    let replies = counts.get("email_reply").copied().unwrap_or(0);
    let response_rate = if sent > 0 {
        Some(replies as f64 / sent as f64)
    } else {
        None
    };

    let mut metrics = BehaviorMetrics {
        avg_time_to_decision_days,
        avg_meetings_to_decision,
        response_rate,
        followup_latency_hours: None,
        episodes_count: episodes.len(),
        ghosted_count: counts.get("ghosted").copied().unwrap_or(0),
        events_count: counts.values().sum(),
        priority_style: "unknown".to_string(),
        reliability: "unknown".to_string(),
    };
    let (priority_style, reliability) = priority_and_reliability(&metrics);
    metrics.priority_style = priority_style;
    metrics.reliability = reliability;
    metrics
}

fn priority_and_reliability(metrics: &BehaviorMetrics) -> (String, String) {
    let mut priority = "unknown";
    let mut reliability = "unknown";

    if let (Some(t), Some(m)) = (metrics.avg_time_to_decision_days, metrics.avg_meetings_to_decision) {
        if t <= 21.0 && m <= 2.0 {
            priority = "fast_decisive";
        } else if t > 30.0 && m >= 3.0 {
            priority = "slow_deliberate";
        }
    }

    if let Some(rr) = metrics.response_rate {
        if rr >= 0.6 && metrics.ghosted_count == 0 {
            reliability = "high_reliability";
        } else if rr < 0.3 || metrics.ghosted_count > 0 {
            reliability = "low_reliability";
        } else {
            reliability = "moderate_reliability";
        }
    }

    (priority.to_string(), reliability.to_string())
}

/// Confidence saturates with evidence: one data point means almost none.
fn confidence_from_count(n: usize) -> f64 {
    if n <= 1 {
        0.1
    } else if n <= 3 {
        0.4
    } else if n <= 6 {
        0.7
    } else {
        1.0
    }
}

fn axis_scores(metrics: &BehaviorMetrics) -> (AxisScores, AxisConfidence) {
    let episodes = metrics.episodes_count;
    let events = metrics.events_count;
    let t = metrics.avg_time_to_decision_days;
    let m = metrics.avg_meetings_to_decision;
    let rr = metrics.response_rate;
    let ghosted = metrics.ghosted_count;

    // Risk appetite: fast decisions with few meetings read as comfort
    // deciding on partial information
    let mut risk = 50.0;
    if let (Some(t), Some(m)) = (t, m) {
        if t <= 21.0 && m <= 2.0 {
            risk = 75.0;
        } else if t > 45.0 || m >= 4.0 {
            risk = 35.0;
        }
    }

    // Control orientation: an active, high-touch log suggests hands-on
    // involvement (term sheet clauses refine this elsewhere)
    let control = if events >= 10 { 65.0 } else { 50.0 };

    // Patience: long decision cycles without ghosting
    let mut patience = 50.0;
    if let Some(t) = t {
        if t > 45.0 && ghosted == 0 {
            patience = 75.0;
        } else if t < 14.0 && ghosted > 0 {
            patience = 35.0;
        }
    }

    // Stress behavior: ghosting under pressure drags this down
    let stress = if ghosted >= 2 { 40.0 } else { 70.0 };

    // Relationship style: responsiveness reads as relationship-oriented
    let mut style = 50.0;
    if let Some(rr) = rr {
        if rr >= 0.7 {
            style = 75.0;
        } else if rr < 0.3 {
            style = 35.0;
        }
    }

    // Conviction: fast, low-meeting decisions imply strong conviction
    let mut conviction = 50.0;
    if let (Some(t), Some(m)) = (t, m) {
        if t <= 21.0 && m <= 2.0 {
            conviction = 75.0;
        } else if t > 60.0 && m >= 4.0 {
            conviction = 35.0;
        }
    }

    let scores = AxisScores {
        risk_appetite: risk,
        control_orientation: control,
        patience,
        stress_behavior: stress,
        relationship_style: style,
        conviction_strength: conviction,
    };
    let confidence = AxisConfidence {
        risk_appetite: confidence_from_count(episodes),
        control_orientation: confidence_from_count(events),
        patience: confidence_from_count(episodes),
        stress_behavior: confidence_from_count(events),
        relationship_style: confidence_from_count(events),
        conviction_strength: confidence_from_count(episodes),
    };
    (scores, confidence)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute (and upsert) the behavior profile for one investor within a
/// company. Replaying the same log yields the same profile.
pub fn compute_behavior_profile(
    db: &NetworkDb,
    company_id: i64,
    investor_id: i64,
) -> Result<BehaviorProfile, DbError> {
    let events = db.interactions_for_entity(company_id, &EntityRef::Investor(investor_id))?;
    let (episodes, counts) = parse_episodes(&events);
    let metrics = behavior_metrics(&episodes, &counts);
    let (scores, confidence) = axis_scores(&metrics);

    let profile = BehaviorProfile {
        axis_scores: scores,
        confidence,
        behavior_metrics: metrics,
    };

    let now = Utc::now().to_rfc3339();
    db.upsert_behavior_profile(
        investor_id,
        company_id,
        &serde_json::to_string(&profile.axis_scores).unwrap_or_else(|_| "{}".to_string()),
        &serde_json::to_string(&profile.confidence).unwrap_or_else(|_| "{}".to_string()),
        &serde_json::to_string(&profile.behavior_metrics).unwrap_or_else(|_| "{}".to_string()),
        &now,
    )?;

    Ok(profile)
}
