//! Shared type definitions for the database layer.
//!
//! Row structs serialize with their column names untouched: these
//! documents are persisted and replayed, so the key names are part of the
//! storage contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Company {0} not found")]
    CompanyNotFound(i64),

    #[error("Investor {0} not found")]
    InvestorNotFound(i64),

    #[error("Scenario {0} not found")]
    ScenarioNotFound(i64),
}

/// A row from the `companies` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbCompany {
    pub id: i64,
    pub name: String,
    pub created_at: Option<String>,
}

/// A row from the `investors` table. Read-only input to the engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbInvestor {
    pub id: i64,
    pub company_id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub firm: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A row from the `connections` table: one imported contact belonging to
/// exactly one investor. Uncontrolled free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConnection {
    pub id: i64,
    pub investor_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub connected_on: Option<String>,
    pub created_at: Option<String>,
}

impl DbConnection {
    /// Display name: `full_name` when present, otherwise first + last.
    /// Empty string when no name is derivable (such rows are skipped by
    /// every consumer, never treated as errors).
    pub fn display_name(&self) -> String {
        let full = self.full_name.as_deref().unwrap_or("").trim();
        if !full.is_empty() {
            return full.to_string();
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        format!("{} {}", first, last).trim().to_string()
    }
}

/// A row from the `network_nodes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbNetworkNode {
    pub id: i64,
    pub company_id: i64,
    pub node_type: String,
    pub label: String,
    pub meta_json: Option<String>,
}

impl DbNetworkNode {
    /// Parse `meta_json`; malformed or absent JSON degrades to `{}`.
    pub fn meta(&self) -> serde_json::Value {
        self.meta_json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

/// A row from the `network_edges` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbNetworkEdge {
    pub id: i64,
    pub company_id: i64,
    pub from_node_id: i64,
    pub to_node_id: i64,
    pub edge_type: String,
    pub weight: f64,
    pub meta_json: Option<String>,
}

/// A row from the append-only `interactions` event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbInteraction {
    pub id: i64,
    pub company_id: i64,
    pub actor_type: Option<String>,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub entity_key: Option<String>,
    pub event_type: String,
    pub event_ts: String,
    pub meta_json: Option<String>,
}

/// A row from the `relationships` cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbRelationship {
    pub id: i64,
    pub company_id: i64,
    pub from_type: String,
    pub from_id: Option<i64>,
    pub from_key: Option<String>,
    pub to_type: String,
    pub to_id: Option<i64>,
    pub to_key: Option<String>,
    pub relationship_strength: Option<i64>,
    pub strength_factors: Option<String>,
    pub last_interaction_ts: Option<String>,
    pub updated_at: Option<String>,
}

/// A row from `investor_behavior_profiles`. The three JSON columns are
/// deserialized into typed documents by the behavior engine; the db layer
/// only moves strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbBehaviorProfileRow {
    pub investor_id: i64,
    pub company_id: i64,
    pub axis_scores: Option<String>,
    pub confidence: Option<String>,
    pub behavior_metrics: Option<String>,
    pub updated_at: Option<String>,
}

/// A row from `investor_clause_patterns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbClausePatternRow {
    pub company_id: i64,
    pub investor_id: i64,
    pub clause_stats_json: Option<String>,
    pub founder_friendliness_score: Option<i64>,
    pub control_risk_score: Option<i64>,
    pub updated_at: Option<String>,
}

/// A row from `investor_status_history` (append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStatusEntry {
    pub id: i64,
    pub company_id: i64,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub entity_key: Option<String>,
    pub status: String,
    pub ts: String,
    pub by_user: Option<String>,
}

/// A row from the `term_sheets` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbTermSheet {
    pub id: i64,
    pub company_id: i64,
    pub investor_id: i64,
    pub round_name: Option<String>,
    pub received_ts: Option<String>,
    pub parsed_terms_json: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// A row from the `scenarios` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbScenario {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub scenario_type: String,
    pub assumptions_json: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A row from the append-only `scenario_runs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbScenarioRun {
    pub id: i64,
    pub scenario_id: i64,
    pub company_id: i64,
    pub run_ts: String,
    pub results_json: Option<String>,
    pub confidence_score: Option<f64>,
    pub model_version: Option<String>,
}

/// A row from the `network_snapshots` table (one per company per month).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbNetworkSnapshot {
    pub id: i64,
    pub company_id: i64,
    pub snapshot_month: String,
    pub metrics_json: Option<String>,
    pub created_at: Option<String>,
}
