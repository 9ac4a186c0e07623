use rusqlite::params;

use super::*;

impl NetworkDb {
    // =========================================================================
    // Companies
    // =========================================================================

    /// Insert a company, returning its id.
    pub fn insert_company(&self, name: &str, created_at: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO companies (name, created_at) VALUES (?1, ?2)",
            params![name, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a company by id.
    pub fn get_company(&self, company_id: i64) -> Result<Option<DbCompany>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM companies WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![company_id], |row| {
            Ok(DbCompany {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Look up a company by id; a missing row is a structural failure.
    pub fn require_company(&self, company_id: i64) -> Result<DbCompany, DbError> {
        self.get_company(company_id)?
            .ok_or(DbError::CompanyNotFound(company_id))
    }

    /// All companies, newest first.
    pub fn list_companies(&self) -> Result<Vec<DbCompany>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM companies ORDER BY id DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(DbCompany {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
