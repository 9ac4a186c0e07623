use rusqlite::{params, Row};

use super::*;

impl NetworkDb {
    // =========================================================================
    // Scenarios + forecast runs
    // =========================================================================

    /// Create a scenario definition, returning its id.
    pub fn insert_scenario(
        &self,
        company_id: i64,
        name: &str,
        scenario_type: &str,
        assumptions_json: Option<&str>,
        created_by: Option<&str>,
        now: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO scenarios
                (company_id, name, scenario_type, assumptions_json, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![company_id, name, scenario_type, assumptions_json, created_by, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a scenario, company-scoped.
    pub fn get_scenario(
        &self,
        company_id: i64,
        scenario_id: i64,
    ) -> Result<Option<DbScenario>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, name, scenario_type, assumptions_json,
                    created_by, created_at, updated_at
             FROM scenarios WHERE id = ?1 AND company_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![scenario_id, company_id], |row| {
            Ok(DbScenario {
                id: row.get(0)?,
                company_id: row.get(1)?,
                name: row.get(2)?,
                scenario_type: row.get(3)?,
                assumptions_json: row.get(4)?,
                created_by: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Append one forecast run. Runs are evidence of what the engine said
    /// at a point in time, inserted once and never updated.
    pub fn append_scenario_run(
        &self,
        scenario_id: i64,
        company_id: i64,
        run_ts: &str,
        results_json: &str,
        confidence_score: f64,
        model_version: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO scenario_runs
                (scenario_id, company_id, run_ts, results_json, confidence_score, model_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![scenario_id, company_id, run_ts, results_json, confidence_score, model_version],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Runs for one scenario, newest first.
    pub fn runs_for_scenario(
        &self,
        company_id: i64,
        scenario_id: i64,
    ) -> Result<Vec<DbScenarioRun>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scenario_id, company_id, run_ts, results_json, confidence_score, model_version
             FROM scenario_runs
             WHERE company_id = ?1 AND scenario_id = ?2
             ORDER BY run_ts DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![company_id, scenario_id], Self::map_run_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_run_row(row: &Row) -> rusqlite::Result<DbScenarioRun> {
        Ok(DbScenarioRun {
            id: row.get(0)?,
            scenario_id: row.get(1)?,
            company_id: row.get(2)?,
            run_ts: row.get(3)?,
            results_json: row.get(4)?,
            confidence_score: row.get(5)?,
            model_version: row.get(6)?,
        })
    }
}
