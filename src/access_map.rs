//! Access map builder: the tripartite investor / person / org graph.
//!
//! Inner ring: the company's investors. Outer: every distinct person found
//! across their imported connections (deduplicated by normalized name) and
//! every distinct organization. Direct edges connect investors to people,
//! weighted up when a person appears in several investors' networks;
//! person→org edges are navigational only.
//!
//! The stored graph is replaced wholesale on each build, inside a single
//! transaction. Node ids are only stable within one build.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::{DbError, DbNetworkEdge, NetworkDb};
use crate::normalize::normalize_name;

pub const NODE_TYPE_INVESTOR: &str = "investor";
pub const NODE_TYPE_PERSON: &str = "person";
pub const NODE_TYPE_ORG: &str = "org";
pub const EDGE_TYPE_DIRECT: &str = "direct";
pub const EDGE_TYPE_SECOND_DEGREE: &str = "second_degree";

/// Shared-person edges saturate at this weight.
const MAX_EDGE_WEIGHT: f64 = 5.0;

/// A graph node as exposed to callers; `meta` is already parsed (malformed
/// stored JSON degrades to `{}`).
#[derive(Debug, Clone, Serialize)]
pub struct MapNode {
    pub id: i64,
    pub company_id: i64,
    pub node_type: String,
    pub label: String,
    pub meta: serde_json::Value,
}

/// A graph edge as exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct MapEdge {
    pub id: i64,
    pub from_node_id: i64,
    pub to_node_id: i64,
    pub edge_type: String,
    pub weight: f64,
}

/// Build metrics for one company's map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub investor_count: usize,
    pub person_count: usize,
    pub org_count: usize,
}

/// A company's access map.
#[derive(Debug, Clone, Serialize)]
pub struct AccessMap {
    pub nodes: Vec<MapNode>,
    pub edges: Vec<MapEdge>,
    pub metrics: MapMetrics,
}

/// A node with its immediate neighborhood, for interactive drill-down.
#[derive(Debug, Clone, Serialize)]
pub struct NodeNeighborhood {
    pub center: Option<MapNode>,
    pub connections: Vec<MapNode>,
    pub edges: Vec<MapEdge>,
}

struct NodeSpec {
    node_type: &'static str,
    label: String,
    meta_json: String,
}

struct EdgeSpec {
    from: usize,
    to: usize,
    edge_type: &'static str,
    weight: f64,
}

/// Build (and optionally persist) the access map for a company.
///
/// When `store` is true the company's stored graph is replaced inside one
/// transaction: a crash can never leave a half-replaced graph. In-memory
/// build indexes map to durable rowids only during this call.
pub fn build_access_map(
    db: &NetworkDb,
    company_id: i64,
    store: bool,
    now: &str,
) -> Result<AccessMap, DbError> {
    let investors = db.investors_for_company(company_id)?;
    if investors.is_empty() {
        return Ok(AccessMap {
            nodes: Vec::new(),
            edges: Vec::new(),
            metrics: MapMetrics::default(),
        });
    }
    let connections = db.connections_for_company(company_id)?;

    let mut nodes: Vec<NodeSpec> = Vec::new();
    let mut edges: Vec<EdgeSpec> = Vec::new();

    // Inner ring: one node per investor
    let mut investor_node: HashMap<i64, usize> = HashMap::new();
    for inv in &investors {
        investor_node.insert(inv.id, nodes.len());
        nodes.push(NodeSpec {
            node_type: NODE_TYPE_INVESTOR,
            label: inv.full_name.clone(),
            meta_json: serde_json::json!({
                "firm": inv.firm,
                "title": inv.title,
                "investor_id": inv.id,
            })
            .to_string(),
        });
    }

    // Person key fallback: names that normalize to nothing (all punctuation)
    // still key on their raw lowercase form.
    let person_key = |label: &str| -> String {
        let norm = normalize_name(label);
        if norm.is_empty() {
            label.to_lowercase()
        } else {
            norm
        }
    };

    // How many investors each person / org is connected to (drives edge
    // weight and node meta). Nameless rows are skipped outright.
    let mut person_investors: HashMap<String, Vec<i64>> = HashMap::new();
    let mut person_labels: HashMap<String, String> = HashMap::new();
    let mut org_investors: HashMap<String, Vec<i64>> = HashMap::new();
    for conn in &connections {
        let label = conn.display_name();
        if label.is_empty() {
            continue;
        }
        let pk = person_key(&label);
        let entry = person_investors.entry(pk.clone()).or_default();
        if !entry.contains(&conn.investor_id) {
            entry.push(conn.investor_id);
        }
        person_labels.entry(pk).or_insert(label);

        let org = conn.company.as_deref().unwrap_or("").trim().to_lowercase();
        if !org.is_empty() {
            let entry = org_investors.entry(org).or_default();
            if !entry.contains(&conn.investor_id) {
                entry.push(conn.investor_id);
            }
        }
    }

    // Outer ring: people, keyed by normalized name, labeled with the first
    // observed display form
    let mut person_node: HashMap<String, usize> = HashMap::new();
    let mut person_keys: Vec<&String> = person_investors.keys().collect();
    person_keys.sort();
    for pk in person_keys {
        let shared = person_investors[pk].len();
        person_node.insert(pk.clone(), nodes.len());
        nodes.push(NodeSpec {
            node_type: NODE_TYPE_PERSON,
            label: person_labels.get(pk).cloned().unwrap_or_else(|| pk.clone()),
            meta_json: serde_json::json!({ "shared_investors_count": shared }).to_string(),
        });
    }

    // Outer ring: orgs
    let mut org_node: HashMap<String, usize> = HashMap::new();
    let mut org_keys: Vec<&String> = org_investors.keys().collect();
    org_keys.sort();
    for ok in org_keys {
        let shared = org_investors[ok].len();
        org_node.insert(ok.clone(), nodes.len());
        nodes.push(NodeSpec {
            node_type: NODE_TYPE_ORG,
            label: ok.clone(),
            meta_json: serde_json::json!({ "shared_investors_count": shared }).to_string(),
        });
    }

    // Edges: investor -> person (direct), boosted when the person is shared
    for conn in &connections {
        let label = conn.display_name();
        if label.is_empty() {
            continue;
        }
        let pk = person_key(&label);
        let (Some(&from), Some(&to)) = (investor_node.get(&conn.investor_id), person_node.get(&pk))
        else {
            continue;
        };
        let shared = person_investors.get(&pk).map(|v| v.len()).unwrap_or(1);
        let weight = (1.0 + (shared as f64 - 1.0) * 0.5).min(MAX_EDGE_WEIGHT);
        edges.push(EdgeSpec {
            from,
            to,
            edge_type: EDGE_TYPE_DIRECT,
            weight,
        });

        // person -> org (second_degree, navigational)
        let org = conn.company.as_deref().unwrap_or("").trim().to_lowercase();
        if !org.is_empty() {
            if let Some(&org_idx) = org_node.get(&org) {
                edges.push(EdgeSpec {
                    from: to,
                    to: org_idx,
                    edge_type: EDGE_TYPE_SECOND_DEGREE,
                    weight: 1.0,
                });
            }
        }
    }

    let metrics = MapMetrics {
        node_count: nodes.len(),
        edge_count: edges.len(),
        investor_count: investors.len(),
        person_count: person_node.len(),
        org_count: org_node.len(),
    };

    let (out_nodes, out_edges) = if store {
        store_access_map(db, company_id, &nodes, &edges, now)?
    } else {
        // Unstored build: indexes stand in for ids
        let out_nodes = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| node_view(i as i64, company_id, n))
            .collect();
        let out_edges = edges
            .iter()
            .map(|e| MapEdge {
                id: 0,
                from_node_id: e.from as i64,
                to_node_id: e.to as i64,
                edge_type: e.edge_type.to_string(),
                weight: e.weight,
            })
            .collect();
        (out_nodes, out_edges)
    };

    log::info!(
        "Access map for company {}: {} nodes, {} edges{}",
        company_id,
        metrics.node_count,
        metrics.edge_count,
        if store { " (stored)" } else { "" }
    );

    Ok(AccessMap {
        nodes: out_nodes,
        edges: out_edges,
        metrics,
    })
}

fn node_view(id: i64, company_id: i64, spec: &NodeSpec) -> MapNode {
    MapNode {
        id,
        company_id,
        node_type: spec.node_type.to_string(),
        label: spec.label.clone(),
        meta: serde_json::from_str(&spec.meta_json).unwrap_or_else(|_| serde_json::json!({})),
    }
}

/// Replace the stored graph for a company inside one transaction and map
/// build indexes to durable rowids.
fn store_access_map(
    db: &NetworkDb,
    company_id: i64,
    nodes: &[NodeSpec],
    edges: &[EdgeSpec],
    now: &str,
) -> Result<(Vec<MapNode>, Vec<MapEdge>), DbError> {
    db.with_transaction(|tx| {
        tx.delete_company_graph(company_id)?;

        let mut stored_ids = Vec::with_capacity(nodes.len());
        let mut out_nodes = Vec::with_capacity(nodes.len());
        for spec in nodes {
            let id = tx.insert_graph_node(
                company_id,
                spec.node_type,
                &spec.label,
                Some(&spec.meta_json),
                now,
            )?;
            stored_ids.push(id);
            out_nodes.push(node_view(id, company_id, spec));
        }

        let mut out_edges = Vec::with_capacity(edges.len());
        for spec in edges {
            let from_id = stored_ids[spec.from];
            let to_id = stored_ids[spec.to];
            let edge_id =
                tx.insert_graph_edge(company_id, from_id, to_id, spec.edge_type, spec.weight, now)?;
            out_edges.push(MapEdge {
                id: edge_id,
                from_node_id: from_id,
                to_node_id: to_id,
                edge_type: spec.edge_type.to_string(),
                weight: spec.weight,
            });
        }
        Ok((out_nodes, out_edges))
    })
}

/// Load the stored access map for a company.
pub fn load_access_map(db: &NetworkDb, company_id: i64) -> Result<AccessMap, DbError> {
    let nodes: Vec<MapNode> = db
        .graph_nodes_for_company(company_id)?
        .into_iter()
        .map(|n| MapNode {
            id: n.id,
            company_id: n.company_id,
            meta: n.meta(),
            node_type: n.node_type,
            label: n.label,
        })
        .collect();
    let edges: Vec<MapEdge> = db
        .graph_edges_for_company(company_id)?
        .into_iter()
        .map(edge_view)
        .collect();
    let metrics = MapMetrics {
        node_count: nodes.len(),
        edge_count: edges.len(),
        investor_count: nodes.iter().filter(|n| n.node_type == NODE_TYPE_INVESTOR).count(),
        person_count: nodes.iter().filter(|n| n.node_type == NODE_TYPE_PERSON).count(),
        org_count: nodes.iter().filter(|n| n.node_type == NODE_TYPE_ORG).count(),
    };
    Ok(AccessMap { nodes, edges, metrics })
}

fn edge_view(e: DbNetworkEdge) -> MapEdge {
    MapEdge {
        id: e.id,
        from_node_id: e.from_node_id,
        to_node_id: e.to_node_id,
        edge_type: e.edge_type,
        weight: e.weight,
    }
}

/// A node and its directly-adjacent nodes (either edge direction), for
/// interactive drill-down. An unknown node id yields an empty neighborhood
/// rather than an error.
pub fn get_node_connections(
    db: &NetworkDb,
    company_id: i64,
    node_id: i64,
) -> Result<NodeNeighborhood, DbError> {
    let Some(center_row) = db.get_graph_node(company_id, node_id)? else {
        return Ok(NodeNeighborhood {
            center: None,
            connections: Vec::new(),
            edges: Vec::new(),
        });
    };
    let center = MapNode {
        id: center_row.id,
        company_id: center_row.company_id,
        meta: center_row.meta(),
        node_type: center_row.node_type,
        label: center_row.label,
    };

    let edges: Vec<MapEdge> = db
        .graph_edges_touching(company_id, node_id)?
        .into_iter()
        .map(edge_view)
        .collect();

    let mut neighbor_ids: Vec<i64> = Vec::new();
    for e in &edges {
        for id in [e.from_node_id, e.to_node_id] {
            if id != node_id && !neighbor_ids.contains(&id) {
                neighbor_ids.push(id);
            }
        }
    }

    let connections = db
        .graph_nodes_by_ids(company_id, &neighbor_ids)?
        .into_iter()
        .map(|n| MapNode {
            id: n.id,
            company_id: n.company_id,
            meta: n.meta(),
            node_type: n.node_type,
            label: n.label,
        })
        .collect();

    Ok(NodeNeighborhood {
        center: Some(center),
        connections,
        edges,
    })
}

/// All investor nodes for a company: the traversal entry points for the
/// interactive view.
pub fn get_all_investors_for_solar(db: &NetworkDb, company_id: i64) -> Result<Vec<MapNode>, DbError> {
    Ok(db
        .graph_nodes_of_type(company_id, NODE_TYPE_INVESTOR)?
        .into_iter()
        .map(|n| MapNode {
            id: n.id,
            company_id: n.company_id,
            meta: n.meta(),
            node_type: n.node_type,
            label: n.label,
        })
        .collect())
}
