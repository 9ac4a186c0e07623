use rusqlite::{params, Row};

use super::*;

impl NetworkDb {
    // =========================================================================
    // Behavior profiles
    // =========================================================================

    /// Insert or update the behavior profile for (investor, company). The
    /// three documents arrive already serialized; this layer never inspects
    /// them.
    pub fn upsert_behavior_profile(
        &self,
        investor_id: i64,
        company_id: i64,
        axis_scores_json: &str,
        confidence_json: &str,
        behavior_metrics_json: &str,
        now: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO investor_behavior_profiles
                (investor_id, company_id, axis_scores, confidence, behavior_metrics, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(investor_id, company_id) DO UPDATE SET
                axis_scores = excluded.axis_scores,
                confidence = excluded.confidence,
                behavior_metrics = excluded.behavior_metrics,
                updated_at = excluded.updated_at",
            params![
                investor_id,
                company_id,
                axis_scores_json,
                confidence_json,
                behavior_metrics_json,
                now,
            ],
        )?;
        Ok(())
    }

    /// Stored behavior profile for (investor, company), if any.
    pub fn get_behavior_profile(
        &self,
        investor_id: i64,
        company_id: i64,
    ) -> Result<Option<DbBehaviorProfileRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT investor_id, company_id, axis_scores, confidence, behavior_metrics, updated_at
             FROM investor_behavior_profiles
             WHERE investor_id = ?1 AND company_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![investor_id, company_id], Self::map_profile_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn map_profile_row(row: &Row) -> rusqlite::Result<DbBehaviorProfileRow> {
        Ok(DbBehaviorProfileRow {
            investor_id: row.get(0)?,
            company_id: row.get(1)?,
            axis_scores: row.get(2)?,
            confidence: row.get(3)?,
            behavior_metrics: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
