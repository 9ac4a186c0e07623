use rusqlite::{params, Row};

use super::*;

/// Fields for a new term sheet row. `parsed_terms_json` is an object keyed
/// by the clause vocabulary; malformed documents are tolerated downstream.
#[derive(Debug, Clone, Default)]
pub struct NewTermSheet {
    pub round_name: Option<String>,
    pub received_ts: Option<String>,
    pub parsed_terms_json: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl NetworkDb {
    // =========================================================================
    // Term sheets + clause patterns
    // =========================================================================

    /// Insert a term sheet for (company, investor), returning its id.
    pub fn insert_term_sheet(
        &self,
        company_id: i64,
        investor_id: i64,
        sheet: &NewTermSheet,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO term_sheets
                (company_id, investor_id, round_name, received_ts, parsed_terms_json, source, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                company_id,
                investor_id,
                sheet.round_name,
                sheet.received_ts,
                sheet.parsed_terms_json,
                sheet.source,
                sheet.notes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All term sheets for a (company, investor) pair.
    pub fn term_sheets_for_investor(
        &self,
        company_id: i64,
        investor_id: i64,
    ) -> Result<Vec<DbTermSheet>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, investor_id, round_name, received_ts,
                    parsed_terms_json, source, notes
             FROM term_sheets WHERE company_id = ?1 AND investor_id = ?2",
        )?;
        let rows = stmt.query_map(params![company_id, investor_id], Self::map_term_sheet_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// True if at least one term sheet exists for the pair.
    pub fn has_term_sheet(&self, company_id: i64, investor_id: i64) -> Result<bool, DbError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM term_sheets WHERE company_id = ?1 AND investor_id = ?2)",
            params![company_id, investor_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert or update the aggregated clause patterns for (company,
    /// investor).
    pub fn upsert_clause_patterns(
        &self,
        company_id: i64,
        investor_id: i64,
        clause_stats_json: &str,
        founder_friendliness_score: i64,
        control_risk_score: i64,
        now: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO investor_clause_patterns
                (company_id, investor_id, clause_stats_json,
                 founder_friendliness_score, control_risk_score, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(company_id, investor_id) DO UPDATE SET
                clause_stats_json = excluded.clause_stats_json,
                founder_friendliness_score = excluded.founder_friendliness_score,
                control_risk_score = excluded.control_risk_score,
                updated_at = excluded.updated_at",
            params![
                company_id,
                investor_id,
                clause_stats_json,
                founder_friendliness_score,
                control_risk_score,
                now,
            ],
        )?;
        Ok(())
    }

    /// Stored clause patterns for (company, investor), if any.
    pub fn get_clause_patterns(
        &self,
        company_id: i64,
        investor_id: i64,
    ) -> Result<Option<DbClausePatternRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT company_id, investor_id, clause_stats_json,
                    founder_friendliness_score, control_risk_score, updated_at
             FROM investor_clause_patterns
             WHERE company_id = ?1 AND investor_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![company_id, investor_id], |row| {
            Ok(DbClausePatternRow {
                company_id: row.get(0)?,
                investor_id: row.get(1)?,
                clause_stats_json: row.get(2)?,
                founder_friendliness_score: row.get(3)?,
                control_risk_score: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn map_term_sheet_row(row: &Row) -> rusqlite::Result<DbTermSheet> {
        Ok(DbTermSheet {
            id: row.get(0)?,
            company_id: row.get(1)?,
            investor_id: row.get(2)?,
            round_name: row.get(3)?,
            received_ts: row.get(4)?,
            parsed_terms_json: row.get(5)?,
            source: row.get(6)?,
            notes: row.get(7)?,
        })
    }
}
