use rusqlite::{params, Row};

use super::*;

impl NetworkDb {
    // =========================================================================
    // Access map graph (network_nodes / network_edges)
    // =========================================================================

    /// Delete a company's graph. Callers wrap this and the reinserts in one
    /// transaction so a crash can never leave a half-replaced graph.
    pub fn delete_company_graph(&self, company_id: i64) -> Result<(), DbError> {
        self.conn.execute(
            "DELETE FROM network_edges WHERE company_id = ?1",
            params![company_id],
        )?;
        self.conn.execute(
            "DELETE FROM network_nodes WHERE company_id = ?1",
            params![company_id],
        )?;
        Ok(())
    }

    /// Insert one graph node, returning its durable rowid.
    pub fn insert_graph_node(
        &self,
        company_id: i64,
        node_type: &str,
        label: &str,
        meta_json: Option<&str>,
        now: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO network_nodes (company_id, node_type, label, meta_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![company_id, node_type, label, meta_json, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert one graph edge between two stored node ids.
    pub fn insert_graph_edge(
        &self,
        company_id: i64,
        from_node_id: i64,
        to_node_id: i64,
        edge_type: &str,
        weight: f64,
        now: &str,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO network_edges
                (company_id, from_node_id, to_node_id, edge_type, weight, meta_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
            params![company_id, from_node_id, to_node_id, edge_type, weight, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All stored nodes for a company.
    pub fn graph_nodes_for_company(&self, company_id: i64) -> Result<Vec<DbNetworkNode>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, node_type, label, meta_json
             FROM network_nodes WHERE company_id = ?1",
        )?;
        let rows = stmt.query_map(params![company_id], Self::map_node_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Stored nodes of one type for a company.
    pub fn graph_nodes_of_type(
        &self,
        company_id: i64,
        node_type: &str,
    ) -> Result<Vec<DbNetworkNode>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, node_type, label, meta_json
             FROM network_nodes WHERE company_id = ?1 AND node_type = ?2",
        )?;
        let rows = stmt.query_map(params![company_id, node_type], Self::map_node_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// One stored node, company-scoped.
    pub fn get_graph_node(
        &self,
        company_id: i64,
        node_id: i64,
    ) -> Result<Option<DbNetworkNode>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, node_type, label, meta_json
             FROM network_nodes WHERE id = ?1 AND company_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![node_id, company_id], Self::map_node_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Stored nodes by id set, company-scoped.
    pub fn graph_nodes_by_ids(
        &self,
        company_id: i64,
        ids: &[i64],
    ) -> Result<Vec<DbNetworkNode>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT id, company_id, node_type, label, meta_json
             FROM network_nodes WHERE company_id = ?1 AND id IN ({})",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<&dyn rusqlite::ToSql> = vec![&company_id];
        for id in ids {
            values.push(id);
        }
        let rows = stmt.query_map(values.as_slice(), Self::map_node_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// All stored edges for a company.
    pub fn graph_edges_for_company(&self, company_id: i64) -> Result<Vec<DbNetworkEdge>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, from_node_id, to_node_id, edge_type, weight, meta_json
             FROM network_edges WHERE company_id = ?1",
        )?;
        let rows = stmt.query_map(params![company_id], Self::map_edge_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Edges touching a node in either direction.
    pub fn graph_edges_touching(
        &self,
        company_id: i64,
        node_id: i64,
    ) -> Result<Vec<DbNetworkEdge>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, from_node_id, to_node_id, edge_type, weight, meta_json
             FROM network_edges
             WHERE company_id = ?1 AND (from_node_id = ?2 OR to_node_id = ?2)",
        )?;
        let rows = stmt.query_map(params![company_id, node_id], Self::map_edge_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_node_row(row: &Row) -> rusqlite::Result<DbNetworkNode> {
        Ok(DbNetworkNode {
            id: row.get(0)?,
            company_id: row.get(1)?,
            node_type: row.get(2)?,
            label: row.get(3)?,
            meta_json: row.get(4)?,
        })
    }

    fn map_edge_row(row: &Row) -> rusqlite::Result<DbNetworkEdge> {
        Ok(DbNetworkEdge {
            id: row.get(0)?,
            company_id: row.get(1)?,
            from_node_id: row.get(2)?,
            to_node_id: row.get(3)?,
            edge_type: row.get(4)?,
            weight: row.get(5)?,
            meta_json: row.get(6)?,
        })
    }
}
