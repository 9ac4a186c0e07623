use rusqlite::{params, Row};

use super::*;
use crate::entity::EntityRef;

impl NetworkDb {
    // =========================================================================
    // Relationship strength cache
    // =========================================================================

    /// Insert or update the cached strength for a (from, to) pair. The row
    /// is keyed by the pair's derived (type, id, key) columns; recomputing
    /// overwrites the score fields in place.
    pub fn upsert_relationship(
        &self,
        company_id: i64,
        from: &EntityRef,
        to: &EntityRef,
        strength: i64,
        factors_json: &str,
        last_interaction_ts: Option<&str>,
        now: &str,
    ) -> Result<(), DbError> {
        let existing_id: Option<i64> = {
            let mut stmt = self.conn.prepare(
                "SELECT id FROM relationships
                 WHERE company_id = ?1
                   AND from_type = ?2 AND from_id IS ?3 AND from_key IS ?4
                   AND to_type = ?5 AND to_id IS ?6 AND to_key IS ?7",
            )?;
            let mut rows = stmt.query_map(
                params![
                    company_id,
                    from.type_str(),
                    from.id(),
                    from.key(),
                    to.type_str(),
                    to.id(),
                    to.key(),
                ],
                |row| row.get::<_, i64>(0),
            )?;
            match rows.next() {
                Some(row) => Some(row?),
                None => None,
            }
        };

        if let Some(id) = existing_id {
            self.conn.execute(
                "UPDATE relationships
                 SET relationship_strength = ?1, strength_factors = ?2,
                     last_interaction_ts = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![strength, factors_json, last_interaction_ts, now, id],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO relationships
                    (company_id, from_type, from_id, from_key, to_type, to_id, to_key,
                     relationship_strength, strength_factors, last_interaction_ts, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    company_id,
                    from.type_str(),
                    from.id(),
                    from.key(),
                    to.type_str(),
                    to.id(),
                    to.key(),
                    strength,
                    factors_json,
                    last_interaction_ts,
                    now,
                ],
            )?;
        }
        Ok(())
    }

    /// Cached strength row for a pair, if one exists.
    pub fn get_relationship(
        &self,
        company_id: i64,
        from: &EntityRef,
        to: &EntityRef,
    ) -> Result<Option<DbRelationship>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, from_type, from_id, from_key, to_type, to_id, to_key,
                    relationship_strength, strength_factors, last_interaction_ts, updated_at
             FROM relationships
             WHERE company_id = ?1
               AND from_type = ?2 AND from_id IS ?3 AND from_key IS ?4
               AND to_type = ?5 AND to_id IS ?6 AND to_key IS ?7",
        )?;
        let mut rows = stmt.query_map(
            params![
                company_id,
                from.type_str(),
                from.id(),
                from.key(),
                to.type_str(),
                to.id(),
                to.key(),
            ],
            Self::map_relationship_row,
        )?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn map_relationship_row(row: &Row) -> rusqlite::Result<DbRelationship> {
        Ok(DbRelationship {
            id: row.get(0)?,
            company_id: row.get(1)?,
            from_type: row.get(2)?,
            from_id: row.get(3)?,
            from_key: row.get(4)?,
            to_type: row.get(5)?,
            to_id: row.get(6)?,
            to_key: row.get(7)?,
            relationship_strength: row.get(8)?,
            strength_factors: row.get(9)?,
            last_interaction_ts: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_upsert_overwrites_not_duplicates() {
        let db = test_db();
        let from = EntityRef::Investor(1);
        let to = EntityRef::candidate("Jane Doe", "https://linkedin.com/in/janedoe");

        db.upsert_relationship(1, &from, &to, 40, "[]", None, "2026-01-01T00:00:00")
            .unwrap();
        db.upsert_relationship(1, &from, &to, 65, "[\"x\"]", Some("2026-01-02T00:00:00"), "2026-01-03T00:00:00")
            .unwrap();

        let count: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let row = db.get_relationship(1, &from, &to).unwrap().unwrap();
        assert_eq!(row.relationship_strength, Some(65));
        assert_eq!(row.last_interaction_ts.as_deref(), Some("2026-01-02T00:00:00"));
    }

    #[test]
    fn test_pair_key_is_directional() {
        let db = test_db();
        let from = EntityRef::Investor(1);
        let to = EntityRef::Org("company:1".into());
        db.upsert_relationship(1, &from, &to, 30, "[]", None, "2026-01-01T00:00:00")
            .unwrap();
        assert!(db.get_relationship(1, &to, &from).unwrap().is_none());
    }
}
