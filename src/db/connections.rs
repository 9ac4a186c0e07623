use rusqlite::{params, Row};

use super::*;

/// Fields for one imported contact row. All free text; nothing is
/// validated or deduplicated at this layer.
#[derive(Debug, Clone, Default)]
pub struct NewConnection {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub connected_on: Option<String>,
}

impl NetworkDb {
    // =========================================================================
    // Connections (imported contacts)
    // =========================================================================

    /// Insert a connection belonging to an investor, returning its id.
    pub fn insert_connection(
        &self,
        investor_id: i64,
        connection: &NewConnection,
        now: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO connections (
                investor_id, first_name, last_name, full_name, company,
                position, location, linkedin_url, connected_on, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                investor_id,
                connection.first_name,
                connection.last_name,
                connection.full_name,
                connection.company,
                connection.position,
                connection.location,
                connection.linkedin_url,
                connection.connected_on,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All connections belonging to one investor.
    pub fn connections_for_investor(&self, investor_id: i64) -> Result<Vec<DbConnection>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, investor_id, first_name, last_name, full_name, company,
                    position, location, linkedin_url, connected_on, created_at
             FROM connections WHERE investor_id = ?1",
        )?;
        let rows = stmt.query_map(params![investor_id], Self::map_connection_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// All connections across a company's investors. Rows with no derivable
    /// name come back too; consumers skip them via `display_name()`.
    pub fn connections_for_company(&self, company_id: i64) -> Result<Vec<DbConnection>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.investor_id, c.first_name, c.last_name, c.full_name,
                    c.company, c.position, c.location, c.linkedin_url,
                    c.connected_on, c.created_at
             FROM connections c
             JOIN investors i ON i.id = c.investor_id
             WHERE i.company_id = ?1",
        )?;
        let rows = stmt.query_map(params![company_id], Self::map_connection_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_connection_row(row: &Row) -> rusqlite::Result<DbConnection> {
        Ok(DbConnection {
            id: row.get(0)?,
            investor_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            full_name: row.get(4)?,
            company: row.get(5)?,
            position: row.get(6)?,
            location: row.get(7)?,
            linkedin_url: row.get(8)?,
            connected_on: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}
