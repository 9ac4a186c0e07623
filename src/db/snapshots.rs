use rusqlite::{params, Row};

use super::*;

impl NetworkDb {
    // =========================================================================
    // Network snapshots (one per company per month)
    // =========================================================================

    /// Insert or update the snapshot for (company, month).
    pub fn upsert_network_snapshot(
        &self,
        company_id: i64,
        snapshot_month: &str,
        metrics_json: &str,
        now: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO network_snapshots (company_id, snapshot_month, metrics_json, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(company_id, snapshot_month) DO UPDATE SET
                metrics_json = excluded.metrics_json,
                created_at = excluded.created_at",
            params![company_id, snapshot_month, metrics_json, now],
        )?;
        Ok(())
    }

    /// Most recent snapshots for a company, newest month first.
    pub fn recent_network_snapshots(
        &self,
        company_id: i64,
        limit: i64,
    ) -> Result<Vec<DbNetworkSnapshot>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, snapshot_month, metrics_json, created_at
             FROM network_snapshots
             WHERE company_id = ?1
             ORDER BY snapshot_month DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![company_id, limit], Self::map_snapshot_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_snapshot_row(row: &Row) -> rusqlite::Result<DbNetworkSnapshot> {
        Ok(DbNetworkSnapshot {
            id: row.get(0)?,
            company_id: row.get(1)?,
            snapshot_month: row.get(2)?,
            metrics_json: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
