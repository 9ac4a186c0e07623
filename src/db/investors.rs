use rusqlite::{params, Row};

use super::*;
use crate::entity::EntityRef;

/// Fields for a new investor row. The import layer owns these records; the
/// engines only ever read them back.
#[derive(Debug, Clone, Default)]
pub struct NewInvestor {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub firm: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
}

impl NetworkDb {
    // =========================================================================
    // Investors
    // =========================================================================

    /// Insert an investor for a company, returning its id.
    pub fn insert_investor(
        &self,
        company_id: i64,
        investor: &NewInvestor,
        now: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO investors (
                company_id, full_name, email, phone, location, industry,
                firm, title, linkedin_url, notes, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                company_id,
                investor.full_name,
                investor.email,
                investor.phone,
                investor.location,
                investor.industry,
                investor.firm,
                investor.title,
                investor.linkedin_url,
                investor.notes,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up an investor by id.
    pub fn get_investor(&self, investor_id: i64) -> Result<Option<DbInvestor>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, full_name, email, phone, location, industry,
                    firm, title, linkedin_url, notes, created_at, updated_at
             FROM investors WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![investor_id], Self::map_investor_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Look up an investor by id; a missing row is a structural failure.
    pub fn require_investor(&self, investor_id: i64) -> Result<DbInvestor, DbError> {
        self.get_investor(investor_id)?
            .ok_or(DbError::InvestorNotFound(investor_id))
    }

    /// All investors of a company, ordered by name.
    pub fn investors_for_company(&self, company_id: i64) -> Result<Vec<DbInvestor>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, full_name, email, phone, location, industry,
                    firm, title, linkedin_url, notes, created_at, updated_at
             FROM investors WHERE company_id = ?1 ORDER BY full_name",
        )?;
        let rows = stmt.query_map(params![company_id], Self::map_investor_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_investor_row(row: &Row) -> rusqlite::Result<DbInvestor> {
        Ok(DbInvestor {
            id: row.get(0)?,
            company_id: row.get(1)?,
            full_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            location: row.get(5)?,
            industry: row.get(6)?,
            firm: row.get(7)?,
            title: row.get(8)?,
            linkedin_url: row.get(9)?,
            notes: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    // =========================================================================
    // Pipeline status history (append-only)
    // =========================================================================

    /// Append a pipeline-status entry for an entity. History is never
    /// rewritten; the latest row wins for scoring.
    pub fn append_status(
        &self,
        company_id: i64,
        entity: &EntityRef,
        status: &str,
        ts: &str,
        by_user: Option<&str>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO investor_status_history
                (company_id, entity_type, entity_id, entity_key, status, ts, by_user)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                company_id,
                entity.type_str(),
                entity.id(),
                entity.key(),
                status,
                ts,
                by_user,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Latest pipeline status for an entity, if any.
    pub fn latest_status(
        &self,
        company_id: i64,
        entity: &EntityRef,
    ) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT status FROM investor_status_history
             WHERE company_id = ?1 AND entity_type = ?2
               AND entity_id IS ?3 AND entity_key IS ?4
             ORDER BY ts DESC, id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(
            params![company_id, entity.type_str(), entity.id(), entity.key()],
            |row| row.get::<_, String>(0),
        )?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_insert_and_list_investors() {
        let db = test_db();
        let company_id = db.insert_company("Acme", "2026-01-01T00:00:00").unwrap();
        let inv = NewInvestor {
            full_name: "Dana Wells".into(),
            firm: Some("Wells Capital".into()),
            title: Some("Partner".into()),
            ..Default::default()
        };
        let id = db
            .insert_investor(company_id, &inv, "2026-01-01T00:00:00")
            .unwrap();
        let listed = db.investors_for_company(company_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].firm.as_deref(), Some("Wells Capital"));
    }

    #[test]
    fn test_latest_status_wins() {
        let db = test_db();
        let entity = EntityRef::Investor(5);
        db.append_status(1, &entity, "contacted", "2026-01-01T00:00:00", None)
            .unwrap();
        db.append_status(1, &entity, "meeting", "2026-02-01T00:00:00", Some("ana"))
            .unwrap();
        assert_eq!(db.latest_status(1, &entity).unwrap().as_deref(), Some("meeting"));

        // Candidate keys are matched on entity_key, not entity_id
        let cand = EntityRef::candidate("Jane Doe", "");
        assert_eq!(db.latest_status(1, &cand).unwrap(), None);
        db.append_status(1, &cand, "prospect", "2026-01-05T00:00:00", None)
            .unwrap();
        assert_eq!(db.latest_status(1, &cand).unwrap().as_deref(), Some("prospect"));
    }
}
