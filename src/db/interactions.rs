use rusqlite::{params, Row};

use super::*;
use crate::entity::EntityRef;

impl NetworkDb {
    // =========================================================================
    // Interaction event log (append-only)
    // =========================================================================

    /// Append one interaction event. The log is immutable: events are never
    /// updated or deleted, and every derived score can be replayed from it.
    pub fn append_interaction(
        &self,
        company_id: i64,
        actor_type: Option<&str>,
        entity: &EntityRef,
        event_type: &str,
        event_ts: &str,
        meta_json: Option<&str>,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO interactions
                (company_id, actor_type, entity_type, entity_id, entity_key,
                 event_type, event_ts, meta_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                company_id,
                actor_type,
                entity.type_str(),
                entity.id(),
                entity.key(),
                event_type,
                event_ts,
                meta_json,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All events for one entity, oldest first (episode parsing order).
    pub fn interactions_for_entity(
        &self,
        company_id: i64,
        entity: &EntityRef,
    ) -> Result<Vec<DbInteraction>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, actor_type, entity_type, entity_id, entity_key,
                    event_type, event_ts, meta_json
             FROM interactions
             WHERE company_id = ?1 AND entity_type = ?2
               AND entity_id IS ?3 AND entity_key IS ?4
             ORDER BY event_ts ASC, id ASC",
        )?;
        let rows = stmt.query_map(
            params![company_id, entity.type_str(), entity.id(), entity.key()],
            Self::map_interaction_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// All events touching either endpoint of a pair, in either direction.
    /// Used by the relationship strength engine to aggregate intensity and
    /// recency for the pair.
    pub fn interactions_for_pair(
        &self,
        company_id: i64,
        from: &EntityRef,
        to: &EntityRef,
    ) -> Result<Vec<DbInteraction>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, actor_type, entity_type, entity_id, entity_key,
                    event_type, event_ts, meta_json
             FROM interactions
             WHERE company_id = ?1
               AND ((entity_type = ?2 AND entity_id IS ?3 AND entity_key IS ?4)
                 OR (entity_type = ?5 AND entity_id IS ?6 AND entity_key IS ?7))
             ORDER BY event_ts ASC, id ASC",
        )?;
        let rows = stmt.query_map(
            params![
                company_id,
                from.type_str(),
                from.id(),
                from.key(),
                to.type_str(),
                to.id(),
                to.key(),
            ],
            Self::map_interaction_row,
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Count events of the given types within `[start, end)` for a company.
    pub fn count_events_between(
        &self,
        company_id: i64,
        start: &str,
        end: &str,
        event_types: &[&str],
    ) -> Result<i64, DbError> {
        if event_types.is_empty() {
            return Ok(0);
        }
        let placeholders = event_types
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT COUNT(*) FROM interactions
             WHERE company_id = ?1 AND event_ts >= ?2 AND event_ts < ?3
               AND event_type IN ({})",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<&dyn rusqlite::ToSql> = vec![&company_id, &start, &end];
        for t in event_types {
            values.push(t);
        }
        let count: i64 = stmt.query_row(values.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    fn map_interaction_row(row: &Row) -> rusqlite::Result<DbInteraction> {
        Ok(DbInteraction {
            id: row.get(0)?,
            company_id: row.get(1)?,
            actor_type: row.get(2)?,
            entity_type: row.get(3)?,
            entity_id: row.get(4)?,
            entity_key: row.get(5)?,
            event_type: row.get(6)?,
            event_ts: row.get(7)?,
            meta_json: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;

    #[test]
    fn test_interactions_ordered_and_scoped() {
        let db = test_db();
        let inv = EntityRef::Investor(1);
        db.append_interaction(1, Some("user"), &inv, "meeting_completed", "2026-02-01T00:00:00", None)
            .unwrap();
        db.append_interaction(1, Some("user"), &inv, "intro_sent", "2026-01-01T00:00:00", None)
            .unwrap();
        db.append_interaction(2, Some("user"), &inv, "intro_sent", "2026-01-15T00:00:00", None)
            .unwrap();

        let events = db.interactions_for_entity(1, &inv).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "intro_sent");
        assert_eq!(events[1].event_type, "meeting_completed");
    }

    #[test]
    fn test_pair_matches_either_endpoint() {
        let db = test_db();
        let inv = EntityRef::Investor(1);
        let cand = EntityRef::candidate("Jane Doe", "");
        db.append_interaction(1, None, &inv, "email_sent", "2026-01-01T00:00:00", None)
            .unwrap();
        db.append_interaction(1, None, &cand, "email_reply", "2026-01-02T00:00:00", None)
            .unwrap();
        db.append_interaction(1, None, &EntityRef::Investor(9), "email_sent", "2026-01-03T00:00:00", None)
            .unwrap();

        let events = db.interactions_for_pair(1, &inv, &cand).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_count_events_between_window() {
        let db = test_db();
        let inv = EntityRef::Investor(1);
        db.append_interaction(1, None, &inv, "intro_sent", "2026-03-05T00:00:00", None)
            .unwrap();
        db.append_interaction(1, None, &inv, "meeting_scheduled", "2026-03-20T00:00:00", None)
            .unwrap();
        db.append_interaction(1, None, &inv, "intro_sent", "2026-04-01T00:00:00", None)
            .unwrap();

        let count = db
            .count_events_between(
                1,
                "2026-03-01",
                "2026-04-01",
                &["intro_sent", "meeting_scheduled", "meeting_completed"],
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}
