//! Cross-investor overlap analytics.
//!
//! A person or org "overlaps" when it is reachable through at least two
//! distinct investors' connection lists. People are identified by
//! normalized name, so free-text variants of the same person count once.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::{DbConnection, DbError, NetworkDb};
use crate::normalize::normalize_name;

/// Minimum distinct investor networks for something to count as overlap.
const OVERLAP_MIN_INVESTORS: usize = 2;

/// Size of the top-overlap leaderboards.
const TOP_OVERLAP_LIMIT: usize = 20;

/// Shared-person detail lists are capped for display.
const SHARED_DETAIL_LIMIT: usize = 20;

/// One leaderboard entry: a person or org and how many distinct investor
/// networks it appears in.
#[derive(Debug, Clone, Serialize)]
pub struct OverlapEntry {
    pub label: String,
    pub count: usize,
}

/// Overlap analytics for one company.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlapIntelligence {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub unique_people_count: usize,
    pub unique_org_count: usize,
    pub overlap_people_count: usize,
    pub overlap_org_count: usize,
    pub overlap_percentage: f64,
    pub top_overlapping_people: Vec<OverlapEntry>,
    pub top_overlapping_orgs: Vec<OverlapEntry>,
    pub collapse_count: usize,
    pub collapse_rate: f64,
}

/// An investor row in the overlap matrix header.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixInvestor {
    pub id: i64,
    pub full_name: String,
    pub firm: Option<String>,
    pub connection_count: usize,
}

/// A shared person in a pairwise detail list.
#[derive(Debug, Clone, Serialize)]
pub struct SharedPerson {
    pub name: String,
    pub company: String,
    pub position: String,
}

/// Symmetric investor × investor overlap matrix.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InvestorOverlapMatrix {
    pub investors: Vec<MatrixInvestor>,
    pub matrix: Vec<Vec<usize>>,
    /// Keyed `"{i}-{j}"` with i < j (matrix indexes), capped for display.
    pub shared_connections: HashMap<String, Vec<SharedPerson>>,
}

fn person_key(conn: &DbConnection) -> Option<String> {
    let label = conn.display_name();
    if label.is_empty() {
        return None;
    }
    let norm = normalize_name(&label);
    Some(if norm.is_empty() { label.to_lowercase() } else { norm })
}

/// Compute overlap analytics for a company from its investors and
/// connections. Zero- and one-investor companies report 0% overlap.
pub fn compute_overlap_intelligence(
    db: &NetworkDb,
    company_id: i64,
) -> Result<OverlapIntelligence, DbError> {
    let investors = db.investors_for_company(company_id)?;
    if investors.is_empty() {
        return Ok(OverlapIntelligence::default());
    }
    let connections = db.connections_for_company(company_id)?;

    let mut person_to_investors: HashMap<String, Vec<i64>> = HashMap::new();
    let mut person_labels: HashMap<String, String> = HashMap::new();
    let mut org_to_investors: HashMap<String, Vec<i64>> = HashMap::new();
    let mut named_connection_count = 0usize;

    for conn in &connections {
        let Some(pk) = person_key(conn) else { continue };
        named_connection_count += 1;
        let entry = person_to_investors.entry(pk.clone()).or_default();
        if !entry.contains(&conn.investor_id) {
            entry.push(conn.investor_id);
        }
        person_labels.entry(pk).or_insert_with(|| conn.display_name());

        let org = conn.company.as_deref().unwrap_or("").trim().to_lowercase();
        if !org.is_empty() {
            let entry = org_to_investors.entry(org).or_default();
            if !entry.contains(&conn.investor_id) {
                entry.push(conn.investor_id);
            }
        }
    }

    let unique_people_count = person_to_investors.len();
    let unique_org_count = org_to_investors.len();

    let mut overlap_people: Vec<(&String, usize)> = person_to_investors
        .iter()
        .filter(|(_, invs)| invs.len() >= OVERLAP_MIN_INVESTORS)
        .map(|(k, invs)| (k, invs.len()))
        .collect();
    let mut overlap_orgs: Vec<(&String, usize)> = org_to_investors
        .iter()
        .filter(|(_, invs)| invs.len() >= OVERLAP_MIN_INVESTORS)
        .map(|(k, invs)| (k, invs.len()))
        .collect();

    let overlap_people_count = overlap_people.len();
    let overlap_org_count = overlap_orgs.len();

    let total_unique = unique_people_count + unique_org_count;
    let total_overlap = overlap_people_count + overlap_org_count;
    let overlap_percentage = if total_unique > 0 {
        total_overlap as f64 / total_unique as f64 * 100.0
    } else {
        0.0
    };

    // Leaderboards: most-shared first, label as tiebreak for determinism
    overlap_people.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    overlap_orgs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let top_overlapping_people = overlap_people
        .iter()
        .take(TOP_OVERLAP_LIMIT)
        .map(|(k, count)| OverlapEntry {
            label: person_labels.get(*k).cloned().unwrap_or_else(|| (*k).clone()),
            count: *count,
        })
        .collect();
    let top_overlapping_orgs = overlap_orgs
        .iter()
        .take(TOP_OVERLAP_LIMIT)
        .map(|(k, count)| OverlapEntry {
            label: (*k).clone(),
            count: *count,
        })
        .collect();

    // Collapse: the share of the people network that has gone from
    // second-degree to first-degree reachability
    let collapse_count = overlap_people_count;
    let collapse_rate = if unique_people_count > 0 {
        collapse_count as f64 / unique_people_count as f64 * 100.0
    } else {
        0.0
    };

    Ok(OverlapIntelligence {
        total_nodes: investors.len() + unique_people_count + unique_org_count,
        total_edges: named_connection_count,
        unique_people_count,
        unique_org_count,
        overlap_people_count,
        overlap_org_count,
        overlap_percentage: round1(overlap_percentage),
        top_overlapping_people,
        top_overlapping_orgs,
        collapse_count,
        collapse_rate: round1(collapse_rate),
    })
}

/// Compute the pairwise overlap matrix between a company's investors.
/// Below two investors there is nothing to intersect: the matrix is empty.
pub fn compute_investor_overlap_matrix(
    db: &NetworkDb,
    company_id: i64,
) -> Result<InvestorOverlapMatrix, DbError> {
    let investor_rows = db.investors_for_company(company_id)?;
    let connections = db.connections_for_company(company_id)?;

    let mut connection_counts: HashMap<i64, usize> = HashMap::new();
    let mut person_to_investors: HashMap<String, Vec<i64>> = HashMap::new();
    let mut person_details: HashMap<String, SharedPerson> = HashMap::new();

    for conn in &connections {
        let Some(pk) = person_key(conn) else { continue };
        *connection_counts.entry(conn.investor_id).or_insert(0) += 1;
        let entry = person_to_investors.entry(pk.clone()).or_default();
        if !entry.contains(&conn.investor_id) {
            entry.push(conn.investor_id);
        }
        person_details.entry(pk).or_insert_with(|| SharedPerson {
            name: conn.display_name(),
            company: conn.company.as_deref().unwrap_or("").to_string(),
            position: conn.position.as_deref().unwrap_or("").to_string(),
        });
    }

    let investors: Vec<MatrixInvestor> = investor_rows
        .iter()
        .map(|inv| MatrixInvestor {
            id: inv.id,
            full_name: inv.full_name.clone(),
            firm: inv.firm.clone(),
            connection_count: connection_counts.get(&inv.id).copied().unwrap_or(0),
        })
        .collect();

    if investors.len() < 2 {
        return Ok(InvestorOverlapMatrix {
            investors,
            ..Default::default()
        });
    }

    let index_of: HashMap<i64, usize> = investors
        .iter()
        .enumerate()
        .map(|(idx, inv)| (inv.id, idx))
        .collect();

    let n = investors.len();
    let mut matrix = vec![vec![0usize; n]; n];
    let mut shared_connections: HashMap<String, Vec<SharedPerson>> = HashMap::new();

    for (pk, inv_ids) in &person_to_investors {
        if inv_ids.len() < OVERLAP_MIN_INVESTORS {
            continue;
        }
        for a in 0..inv_ids.len() {
            for b in (a + 1)..inv_ids.len() {
                let (Some(&idx_a), Some(&idx_b)) =
                    (index_of.get(&inv_ids[a]), index_of.get(&inv_ids[b]))
                else {
                    continue;
                };
                matrix[idx_a][idx_b] += 1;
                matrix[idx_b][idx_a] += 1;

                let (lo, hi) = if idx_a < idx_b { (idx_a, idx_b) } else { (idx_b, idx_a) };
                let detail = shared_connections.entry(format!("{}-{}", lo, hi)).or_default();
                if detail.len() < SHARED_DETAIL_LIMIT {
                    if let Some(person) = person_details.get(pk) {
                        detail.push(person.clone());
                    }
                }
            }
        }
    }

    Ok(InvestorOverlapMatrix {
        investors,
        matrix,
        shared_connections,
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connections::NewConnection;
    use crate::db::investors::NewInvestor;
    use crate::db::test_utils::test_db;

    const NOW: &str = "2026-01-01T00:00:00";

    fn add_investor(db: &NetworkDb, company_id: i64, name: &str) -> i64 {
        db.insert_investor(
            company_id,
            &NewInvestor { full_name: name.into(), ..Default::default() },
            NOW,
        )
        .unwrap()
    }

    fn add_connection(db: &NetworkDb, investor_id: i64, name: &str, company: &str) {
        db.insert_connection(
            investor_id,
            &NewConnection {
                full_name: Some(name.to_string()),
                company: if company.is_empty() { None } else { Some(company.to_string()) },
                position: Some("Partner".into()),
                ..Default::default()
            },
            NOW,
        )
        .unwrap();
    }

    #[test]
    fn test_zero_and_one_investor_overlap_is_zero() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", NOW).unwrap();
        let stats = compute_overlap_intelligence(&db, company_id).unwrap();
        assert_eq!(stats.overlap_percentage, 0.0);

        let inv = add_investor(&db, company_id, "Investor A");
        add_connection(&db, inv, "Jane Doe", "Acme Capital");
        add_connection(&db, inv, "Jane Doe", "Acme Capital");
        let stats = compute_overlap_intelligence(&db, company_id).unwrap();
        // Same person twice in ONE list is not overlap
        assert_eq!(stats.overlap_people_count, 0);
        assert_eq!(stats.overlap_percentage, 0.0);
        assert_eq!(stats.unique_people_count, 1);
    }

    #[test]
    fn test_overlap_counts_normalized_identities() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", NOW).unwrap();
        let inv_a = add_investor(&db, company_id, "Investor A");
        let inv_b = add_investor(&db, company_id, "Investor B");
        // Same person under two spellings, same org under two casings
        add_connection(&db, inv_a, "Jane Doe", "Acme Capital");
        add_connection(&db, inv_b, "Jane M. Doe", "ACME CAPITAL");
        add_connection(&db, inv_a, "Solo Person", "Elsewhere Inc");

        let stats = compute_overlap_intelligence(&db, company_id).unwrap();
        assert_eq!(stats.unique_people_count, 2);
        assert_eq!(stats.unique_org_count, 2);
        assert_eq!(stats.overlap_people_count, 1);
        assert_eq!(stats.overlap_org_count, 1);
        // (1 + 1) / (2 + 2) = 50%
        assert_eq!(stats.overlap_percentage, 50.0);
        // 1 of 2 people collapsed to first-degree
        assert_eq!(stats.collapse_rate, 50.0);
        assert_eq!(stats.top_overlapping_people.len(), 1);
        assert_eq!(stats.top_overlapping_people[0].count, 2);
        assert!(stats.overlap_percentage >= 0.0 && stats.overlap_percentage <= 100.0);
    }

    #[test]
    fn test_matrix_symmetric_with_details() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", NOW).unwrap();
        let inv_a = add_investor(&db, company_id, "Investor A");
        let inv_b = add_investor(&db, company_id, "Investor B");
        let inv_c = add_investor(&db, company_id, "Investor C");
        add_connection(&db, inv_a, "Jane Doe", "Acme Capital");
        add_connection(&db, inv_b, "jane doe", "Acme Capital");
        add_connection(&db, inv_c, "Unrelated Person", "Other Org");

        let result = compute_investor_overlap_matrix(&db, company_id).unwrap();
        assert_eq!(result.investors.len(), 3);
        let idx_a = result.investors.iter().position(|i| i.id == inv_a).unwrap();
        let idx_b = result.investors.iter().position(|i| i.id == inv_b).unwrap();
        let idx_c = result.investors.iter().position(|i| i.id == inv_c).unwrap();

        assert_eq!(result.matrix[idx_a][idx_b], 1);
        assert_eq!(result.matrix[idx_b][idx_a], 1);
        assert_eq!(result.matrix[idx_a][idx_c], 0);
        assert_eq!(result.matrix[idx_a][idx_a], 0);

        let (lo, hi) = if idx_a < idx_b { (idx_a, idx_b) } else { (idx_b, idx_a) };
        let detail = result.shared_connections.get(&format!("{}-{}", lo, hi)).unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0].name, "Jane Doe");
    }

    #[test]
    fn test_matrix_below_two_investors_is_empty() {
        let db = test_db();
        let company_id = db.insert_company("Startup Co", NOW).unwrap();
        add_investor(&db, company_id, "Only One");
        let result = compute_investor_overlap_matrix(&db, company_id).unwrap();
        assert_eq!(result.investors.len(), 1);
        assert!(result.matrix.is_empty());
        assert!(result.shared_connections.is_empty());
    }
}
