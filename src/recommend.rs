//! Company-scoped investor candidate recommendations.
//!
//! Every imported connection is scored as a candidate against five
//! independent signal categories, merged with its duplicates across source
//! investors, gated on multi-signal agreement, and deduplicated against the
//! investors the company already has. Each surviving candidate carries its
//! fired signals and human-readable reasons so the ranking is explainable.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::db::{DbConnection, DbError, DbInvestor, NetworkDb};
use crate::entity::candidate_key;
use crate::fit;
use crate::normalize::{
    extract_firm_type_tokens, matches_title_pattern, normalize_name, tokenize_industry,
    tokenize_location, FIRM_TYPE_TOKENS,
};

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Multi-signal gate: keep a candidate only if this many distinct signal
/// categories fired.
pub const MIN_SIGNAL_CATEGORIES: usize = 2;

/// Dedup: drop a candidate whose (firm, title) matches an existing investor
/// and whose name similarity reaches this threshold.
pub const FUZZY_NAME_THRESHOLD: f64 = 0.88;

/// Max number of suggested investors returned per company.
pub const DEFAULT_TOP_N: usize = 100;

const PTS_INDUSTRY: f64 = 4.0;
const PTS_LOCATION: f64 = 3.0;
const PTS_FIRM_TYPE: f64 = 3.0;
const PTS_FIRM_SIMILAR: f64 = 2.0;
const PTS_TITLE_PATTERN: f64 = 3.0;
const PTS_COMPANY_IN_NETWORK: f64 = 5.0;

/// A company counts as "in the network" once this many connections work
/// there, company-wide.
const COMPANY_IN_NETWORK_MIN: usize = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The five independent signal categories. The gate counts distinct
/// categories, not rule firings: a category that fires twice (firm_type
/// can) still counts once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Industry,
    Location,
    FirmType,
    TitlePattern,
    CompanyInNetwork,
}

/// A candidate derived from one connection row. Transient; candidates are
/// never persisted as rows of their own.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub name: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub linkedin_url: String,
    pub source_investor_id: Option<i64>,
}

/// Profile of a company's existing investor base: the token sets candidates
/// are matched against.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub industry_tokens: Vec<String>,
    pub location_tokens: HashSet<String>,
    pub firm_type_tokens: Vec<&'static str>,
    pub titles: HashSet<String>,
    pub investor_firms_lower: HashSet<String>,
}

/// One scored (pre-merge) candidate.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub signals: BTreeSet<SignalCategory>,
    pub reasons: Vec<String>,
}

/// A candidate after identity merging across source investors.
#[derive(Debug, Clone)]
pub struct MergedCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub signals: BTreeSet<SignalCategory>,
    pub reasons: Vec<String>,
    pub source_investor_ids: BTreeSet<i64>,
}

/// One ranked recommendation, as exposed to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub name: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub linkedin_url: String,
    pub score: f64,
    pub signals: Vec<SignalCategory>,
    pub reasons: Vec<String>,
    pub source_investor_id: Option<i64>,
    pub shared_investors_count: usize,
    pub shared_org_count: usize,
}

/// Full pipeline result for one company.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub recommendations: Vec<Recommendation>,
    pub company_name: String,
    pub investor_count: usize,
    pub connection_count: usize,
    pub profile: CompanyProfile,
}

/// Pipeline tuning knobs; `Default` matches production behavior.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub top_n: usize,
    pub min_signal_categories: usize,
    pub fuzzy_threshold: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_signal_categories: MIN_SIGNAL_CATEGORIES,
            fuzzy_threshold: FUZZY_NAME_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile building
// ---------------------------------------------------------------------------

/// Harvest the token sets from a company's own investors.
pub fn build_company_profile(investors: &[DbInvestor]) -> CompanyProfile {
    let mut profile = CompanyProfile::default();
    for inv in investors {
        if let Some(industry) = inv.industry.as_deref() {
            for token in tokenize_industry(industry) {
                if !profile.industry_tokens.contains(&token) {
                    profile.industry_tokens.push(token);
                }
            }
        }
        if let Some(location) = inv.location.as_deref() {
            for token in tokenize_location(location) {
                profile.location_tokens.insert(token);
            }
        }
        if let Some(firm) = inv.firm.as_deref() {
            for token in extract_firm_type_tokens(firm) {
                if !profile.firm_type_tokens.contains(&token) {
                    profile.firm_type_tokens.push(token);
                }
            }
            let firm_lower = firm.trim().to_lowercase();
            if !firm_lower.is_empty() {
                profile.investor_firms_lower.insert(firm_lower);
            }
        }
        if let Some(title) = inv.title.as_deref() {
            let t = title.trim().to_lowercase();
            if !t.is_empty() {
                profile.titles.insert(t);
            }
        }
    }
    profile
}

/// Map lowercase company name -> number of connections at that company.
pub fn connection_company_counts(connections: &[DbConnection]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for conn in connections {
        let company = conn.company.as_deref().unwrap_or("").trim();
        if company.is_empty() {
            continue;
        }
        *counts.entry(company.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Signal scoring
// ---------------------------------------------------------------------------

/// Score each connection as a candidate. Connections with no derivable
/// name are silently skipped. Only fired categories appear in `signals`.
pub fn score_candidates(
    connections: &[DbConnection],
    profile: &CompanyProfile,
    company_counts: &HashMap<String, usize>,
) -> Vec<ScoredCandidate> {
    let common_companies: HashSet<&str> = company_counts
        .iter()
        .filter(|(_, count)| **count >= COMPANY_IN_NETWORK_MIN)
        .map(|(name, _)| name.as_str())
        .collect();

    let mut results = Vec::new();
    for conn in connections {
        let name = conn.display_name();
        if name.is_empty() {
            continue;
        }

        let candidate = Candidate {
            name,
            company: conn.company.as_deref().unwrap_or("").trim().to_string(),
            position: conn.position.as_deref().unwrap_or("").trim().to_string(),
            location: conn.location.as_deref().unwrap_or("").trim().to_string(),
            linkedin_url: conn.linkedin_url.as_deref().unwrap_or("").trim().to_string(),
            source_investor_id: Some(conn.investor_id),
        };

        let mut signals = BTreeSet::new();
        let mut reasons = Vec::new();
        let mut score = 0.0;

        // industry: a profile industry token appears in "position company"
        let text = format!(" {} {} ", candidate.position, candidate.company).to_lowercase();
        for token in &profile.industry_tokens {
            if text.contains(token.as_str()) {
                signals.insert(SignalCategory::Industry);
                reasons.push(format!("Industry: {}", token));
                score += PTS_INDUSTRY;
                break;
            }
        }

        // location: candidate tokens intersect the profile's
        if !candidate.location.is_empty() && !profile.location_tokens.is_empty() {
            let loc_tokens = tokenize_location(&candidate.location);
            if loc_tokens.iter().any(|t| profile.location_tokens.contains(t)) {
                signals.insert(SignalCategory::Location);
                reasons.push("Location match".to_string());
                score += PTS_LOCATION;
            }
        }

        // firm_type: candidate company looks like an investor org, and/or
        // overlaps an existing investor firm name. Two rules, one category.
        if !candidate.company.is_empty() {
            let company_lower = candidate.company.to_lowercase();
            for token in FIRM_TYPE_TOKENS {
                if company_lower.contains(token) {
                    signals.insert(SignalCategory::FirmType);
                    reasons.push(format!("Firm type: {}", token));
                    score += PTS_FIRM_TYPE;
                    break;
                }
            }
            for firm in &profile.investor_firms_lower {
                if firm.len() > 4 && (company_lower.contains(firm.as_str()) || firm.contains(&company_lower)) {
                    if signals.insert(SignalCategory::FirmType) {
                        reasons.push("Similar to existing firm".to_string());
                    }
                    score += PTS_FIRM_SIMILAR;
                    break;
                }
            }
        }

        // title_pattern: investor-like role
        if !candidate.position.is_empty() && matches_title_pattern(&candidate.position) {
            signals.insert(SignalCategory::TitlePattern);
            reasons.push("Investor-like title".to_string());
            score += PTS_TITLE_PATTERN;
        }

        // company_in_network: the candidate's company shows up repeatedly
        if !candidate.company.is_empty() {
            let key = candidate.company.to_lowercase();
            if common_companies.contains(key.as_str()) {
                signals.insert(SignalCategory::CompanyInNetwork);
                let count = company_counts.get(&key).copied().unwrap_or(0);
                reasons.push(format!("Company in network ({} connections)", count));
                score += PTS_COMPANY_IN_NETWORK;
            }
        }

        results.push(ScoredCandidate {
            candidate,
            score,
            signals,
            reasons,
        });
    }
    results
}

// ---------------------------------------------------------------------------
// Merge, gate, dedup
// ---------------------------------------------------------------------------

/// Merge candidates that are the same person imported by different
/// investors. Identity key = normalized name + lowercased LinkedIn URL;
/// merging keeps the max score, unions fired signals, appends novel
/// reasons, and records every contributing source investor.
pub fn merge_by_identity(scored: Vec<ScoredCandidate>) -> Vec<MergedCandidate> {
    use std::collections::hash_map::Entry;

    let mut by_key: HashMap<String, MergedCandidate> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for item in scored {
        if normalize_name(&item.candidate.name).is_empty() {
            continue;
        }
        let key = candidate_key(&item.candidate.name, &item.candidate.linkedin_url);
        match by_key.entry(key) {
            Entry::Vacant(slot) => {
                let mut source_investor_ids = BTreeSet::new();
                if let Some(id) = item.candidate.source_investor_id {
                    source_investor_ids.insert(id);
                }
                order.push(slot.key().clone());
                slot.insert(MergedCandidate {
                    candidate: item.candidate,
                    score: item.score,
                    signals: item.signals,
                    reasons: item.reasons,
                    source_investor_ids,
                });
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if item.score > existing.score {
                    existing.score = item.score;
                }
                existing.signals.extend(item.signals.iter().copied());
                for reason in item.reasons {
                    if !existing.reasons.contains(&reason) {
                        existing.reasons.push(reason);
                    }
                }
                if let Some(id) = item.candidate.source_investor_id {
                    existing.source_investor_ids.insert(id);
                }
            }
        }
    }

    order.into_iter().filter_map(|k| by_key.remove(&k)).collect()
}

/// Keep only candidates whose distinct fired categories reach the gate.
pub fn apply_multi_signal_gate(
    merged: Vec<MergedCandidate>,
    min_categories: usize,
) -> Vec<MergedCandidate> {
    merged
        .into_iter()
        .filter(|c| c.signals.len() >= min_categories)
        .collect()
}

struct ExistingIndexes {
    normalized_names: HashSet<String>,
    linkedin_urls: HashSet<String>,
    firm_title_names: HashMap<(String, String), Vec<String>>,
}

fn build_existing_indexes(existing: &[DbInvestor]) -> ExistingIndexes {
    let mut normalized_names = HashSet::new();
    let mut linkedin_urls = HashSet::new();
    let mut firm_title_names: HashMap<(String, String), Vec<String>> = HashMap::new();

    for inv in existing {
        let name = inv.full_name.trim();
        if !name.is_empty() {
            normalized_names.insert(normalize_name(name));
        }
        if let Some(url) = inv.linkedin_url.as_deref() {
            let url = url.trim().to_lowercase();
            if !url.is_empty() {
                linkedin_urls.insert(url);
            }
        }
        let firm = inv.firm.as_deref().unwrap_or("").trim().to_lowercase();
        let title = inv.title.as_deref().unwrap_or("").trim().to_lowercase();
        if !firm.is_empty() || !title.is_empty() {
            firm_title_names
                .entry((firm, title))
                .or_default()
                .push(normalize_name(name));
        }
    }

    ExistingIndexes {
        normalized_names,
        linkedin_urls,
        firm_title_names,
    }
}

/// Remove candidates that match an existing investor: LinkedIn URL
/// (case-insensitive), normalized name, or (firm, title) plus fuzzy name
/// similarity at the threshold.
pub fn apply_dedup(
    merged: Vec<MergedCandidate>,
    existing: &[DbInvestor],
    fuzzy_threshold: f64,
) -> Vec<MergedCandidate> {
    let indexes = build_existing_indexes(existing);

    merged
        .into_iter()
        .filter(|item| {
            let c = &item.candidate;
            let url = c.linkedin_url.trim().to_lowercase();
            if !url.is_empty() && indexes.linkedin_urls.contains(&url) {
                return false;
            }
            let norm = normalize_name(&c.name);
            if !norm.is_empty() && indexes.normalized_names.contains(&norm) {
                return false;
            }
            let key = (c.company.to_lowercase(), c.position.to_lowercase());
            if let Some(existing_norms) = indexes.firm_title_names.get(&key) {
                if existing_norms
                    .iter()
                    .any(|ex| strsim::normalized_levenshtein(&norm, ex) >= fuzzy_threshold)
                {
                    return false;
                }
            }
            true
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Full recommendation pipeline for one company: load, profile, score,
/// merge, gate, dedup, rank.
pub fn run_pipeline(
    db: &NetworkDb,
    company_id: i64,
    opts: &PipelineOptions,
) -> Result<PipelineOutcome, DbError> {
    let company = db.require_company(company_id)?;
    let investors = db.investors_for_company(company_id)?;
    if investors.is_empty() {
        return Ok(PipelineOutcome {
            recommendations: Vec::new(),
            company_name: company.name,
            investor_count: 0,
            connection_count: 0,
            profile: CompanyProfile::default(),
        });
    }

    let connections = db.connections_for_company(company_id)?;
    let profile = build_company_profile(&investors);
    let company_counts = connection_company_counts(&connections);

    let scored = score_candidates(&connections, &profile, &company_counts);
    let merged = merge_by_identity(scored);
    let gated = apply_multi_signal_gate(merged, opts.min_signal_categories);
    let mut deduped = apply_dedup(gated, &investors, opts.fuzzy_threshold);

    deduped.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate.name.to_lowercase().cmp(&b.candidate.name.to_lowercase()))
    });

    let common_companies: HashSet<String> = company_counts
        .iter()
        .filter(|(_, count)| **count >= COMPANY_IN_NETWORK_MIN)
        .map(|(name, _)| name.clone())
        .collect();

    let recommendations = deduped
        .into_iter()
        .take(opts.top_n)
        .map(|item| {
            let shared_investors_count = item.source_investor_ids.len();
            let company_lower = item.candidate.company.to_lowercase();
            let shared_org_count =
                usize::from(!company_lower.is_empty() && common_companies.contains(&company_lower));
            Recommendation {
                name: item.candidate.name.clone(),
                company: item.candidate.company.clone(),
                position: item.candidate.position.clone(),
                location: item.candidate.location.clone(),
                linkedin_url: item.candidate.linkedin_url.clone(),
                score: (item.score * 10.0).round() / 10.0,
                signals: item.signals.into_iter().collect(),
                reasons: item.reasons,
                source_investor_id: item.candidate.source_investor_id,
                shared_investors_count,
                shared_org_count,
            }
        })
        .collect();

    log::info!(
        "Recommendation pipeline for company {}: {} investors, {} connections",
        company_id,
        investors.len(),
        connections.len()
    );

    Ok(PipelineOutcome {
        recommendations,
        company_name: company.name,
        investor_count: investors.len(),
        connection_count: connections.len(),
        profile,
    })
}

/// A recommendation enriched with its independent fit score.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedInvestor {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub fit_score: i64,
    pub fit_factors: Vec<String>,
    pub fit_breakdown: fit::FitBreakdown,
}

/// Ranked suggestions with fit enrichment, the composed operation the
/// presentation layer consumes.
pub fn suggested_investors(
    db: &NetworkDb,
    company_id: i64,
    top_n: usize,
) -> Result<Vec<SuggestedInvestor>, DbError> {
    let outcome = run_pipeline(db, company_id, &PipelineOptions { top_n, ..Default::default() })?;
    let profile = outcome.profile;
    Ok(outcome
        .recommendations
        .into_iter()
        .map(|rec| {
            let fit = fit::compute_fit_score(
                &fit::FitCandidate {
                    company: rec.company.clone(),
                    position: rec.position.clone(),
                    location: rec.location.clone(),
                },
                &profile,
                rec.shared_investors_count,
                rec.shared_org_count,
            );
            SuggestedInvestor {
                recommendation: rec,
                fit_score: fit.fit_score,
                fit_factors: fit.factors,
                fit_breakdown: fit.breakdown,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connections::NewConnection;
    use crate::db::investors::NewInvestor;
    use crate::db::test_utils::test_db;

    fn conn_row(investor_id: i64, name: &str, company: &str, position: &str, location: &str) -> DbConnection {
        DbConnection {
            id: 0,
            investor_id,
            first_name: None,
            last_name: None,
            full_name: Some(name.to_string()),
            company: Some(company.to_string()),
            position: Some(position.to_string()),
            location: Some(location.to_string()),
            linkedin_url: None,
            connected_on: None,
            created_at: None,
        }
    }

    fn investor(id: i64, name: &str, firm: &str, title: &str) -> DbInvestor {
        DbInvestor {
            id,
            company_id: 1,
            full_name: name.to_string(),
            email: None,
            phone: None,
            location: None,
            industry: None,
            firm: Some(firm.to_string()),
            title: Some(title.to_string()),
            linkedin_url: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_gate_requires_two_categories() {
        let profile = CompanyProfile::default();
        let counts = HashMap::new();
        // Title pattern is the only category that can fire with an empty profile
        let rows = vec![conn_row(1, "Solo Signal", "Widgets Inc", "Partner", "")];
        let scored = score_candidates(&rows, &profile, &counts);
        let merged = merge_by_identity(scored);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].signals.len(), 1);
        assert!(apply_multi_signal_gate(merged, MIN_SIGNAL_CATEGORIES).is_empty());
    }

    #[test]
    fn test_firm_type_can_score_twice_but_counts_once() {
        let mut profile = CompanyProfile::default();
        profile.investor_firms_lower.insert("acme capital".to_string());
        let counts = HashMap::new();
        let rows = vec![conn_row(1, "Jane Doe", "Acme Capital", "", "")];
        let scored = score_candidates(&rows, &profile, &counts);
        assert_eq!(scored.len(), 1);
        // Vocabulary rule (+3) and fuzzy-firm rule (+2) both fire
        assert_eq!(scored[0].score, PTS_FIRM_TYPE + PTS_FIRM_SIMILAR);
        assert_eq!(scored[0].signals.len(), 1);
        assert!(scored[0].signals.contains(&SignalCategory::FirmType));
    }

    #[test]
    fn test_nameless_connection_skipped() {
        let profile = CompanyProfile::default();
        let counts = HashMap::new();
        let mut row = conn_row(1, "", "Acme Capital", "Partner", "");
        row.full_name = None;
        let scored = score_candidates(&[row], &profile, &counts);
        assert!(scored.is_empty());
    }

    #[test]
    fn test_merge_keeps_max_score_and_unions() {
        let a = ScoredCandidate {
            candidate: Candidate {
                name: "Jane Doe".into(),
                company: "Acme Capital".into(),
                position: "VP".into(),
                location: "NYC".into(),
                linkedin_url: "".into(),
                source_investor_id: Some(1),
            },
            score: 6.0,
            signals: [SignalCategory::FirmType].into_iter().collect(),
            reasons: vec!["Firm type: capital".into()],
        };
        let b = ScoredCandidate {
            candidate: Candidate {
                name: "Jane M. Doe".into(),
                company: "acme capital".into(),
                position: "Partner".into(),
                location: "New York".into(),
                linkedin_url: "".into(),
                source_investor_id: Some(2),
            },
            score: 9.0,
            signals: [SignalCategory::FirmType, SignalCategory::TitlePattern]
                .into_iter()
                .collect(),
            reasons: vec!["Firm type: capital".into(), "Investor-like title".into()],
        };
        let merged = merge_by_identity(vec![a, b]);
        assert_eq!(merged.len(), 1);
        let m = &merged[0];
        assert_eq!(m.score, 9.0);
        assert_eq!(m.signals.len(), 2);
        assert_eq!(m.source_investor_ids.len(), 2);
        // Duplicate reason appended once
        assert_eq!(
            m.reasons.iter().filter(|r| r.as_str() == "Firm type: capital").count(),
            1
        );
    }

    #[test]
    fn test_dedup_linkedin_url_always_excludes() {
        let mut existing = investor(1, "Someone Else", "Elsewhere Fund", "Partner");
        existing.linkedin_url = Some("https://linkedin.com/in/janedoe".into());
        let merged = vec![MergedCandidate {
            candidate: Candidate {
                name: "Jane Doe".into(),
                company: "Acme Capital".into(),
                position: "Partner".into(),
                location: "".into(),
                linkedin_url: "HTTPS://LINKEDIN.COM/IN/JANEDOE".into(),
                source_investor_id: Some(1),
            },
            score: 99.0,
            signals: BTreeSet::new(),
            reasons: Vec::new(),
            source_investor_ids: BTreeSet::new(),
        }];
        assert!(apply_dedup(merged, &[existing], FUZZY_NAME_THRESHOLD).is_empty());
    }

    #[test]
    fn test_dedup_normalized_name() {
        let existing = investor(1, "Nicholas A. De Noyer", "Fund", "Partner");
        let merged = vec![MergedCandidate {
            candidate: Candidate {
                name: "nicholas de noyer".into(),
                company: "Other Corp".into(),
                position: "Engineer".into(),
                location: "".into(),
                linkedin_url: "".into(),
                source_investor_id: None,
            },
            score: 10.0,
            signals: BTreeSet::new(),
            reasons: Vec::new(),
            source_investor_ids: BTreeSet::new(),
        }];
        assert!(apply_dedup(merged, &[existing], FUZZY_NAME_THRESHOLD).is_empty());
    }

    #[test]
    fn test_dedup_firm_title_fuzzy() {
        let existing = investor(1, "Katherine Mercer", "Summit Partners", "Managing Director");
        let make = |name: &str| MergedCandidate {
            candidate: Candidate {
                name: name.into(),
                company: "Summit Partners".into(),
                position: "Managing Director".into(),
                location: "".into(),
                linkedin_url: "".into(),
                source_investor_id: None,
            },
            score: 10.0,
            signals: BTreeSet::new(),
            reasons: Vec::new(),
            source_investor_ids: BTreeSet::new(),
        };
        // Near-identical name at the same firm+title is a duplicate
        let dropped = apply_dedup(vec![make("Katherine Mercerr")], &[existing.clone()], FUZZY_NAME_THRESHOLD);
        assert!(dropped.is_empty());
        // A clearly different person at the same firm+title survives
        let kept = apply_dedup(vec![make("Robert Chang")], &[existing], FUZZY_NAME_THRESHOLD);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_pipeline_merges_same_person_across_investors() {
        let db = test_db();
        let now = "2026-01-01T00:00:00";
        let company_id = db.insert_company("Startup Co", now).unwrap();
        let inv_a = db
            .insert_investor(
                company_id,
                &NewInvestor { full_name: "Investor A".into(), ..Default::default() },
                now,
            )
            .unwrap();
        let inv_b = db
            .insert_investor(
                company_id,
                &NewInvestor { full_name: "Investor B".into(), ..Default::default() },
                now,
            )
            .unwrap();

        db.insert_connection(
            inv_a,
            &NewConnection {
                full_name: Some("Jane Doe".into()),
                company: Some("Acme Capital".into()),
                position: Some("VP".into()),
                location: Some("NYC".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        db.insert_connection(
            inv_b,
            &NewConnection {
                full_name: Some("Jane Doe".into()),
                company: Some("acme capital".into()),
                position: Some("Partner".into()),
                location: Some("New York".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let outcome = run_pipeline(&db, company_id, &PipelineOptions::default()).unwrap();
        assert_eq!(outcome.recommendations.len(), 1);
        let rec = &outcome.recommendations[0];
        assert_eq!(rec.shared_investors_count, 2);
        assert!(rec.signals.contains(&SignalCategory::FirmType));
        assert!(rec.signals.contains(&SignalCategory::TitlePattern));
        // "acme capital" appears twice company-wide
        assert!(rec.signals.contains(&SignalCategory::CompanyInNetwork));
        assert_eq!(rec.shared_org_count, 1);

        // Fit enrichment picks up the two-network tier
        let suggested = suggested_investors(&db, company_id, 25).unwrap();
        assert_eq!(suggested.len(), 1);
        assert!(suggested[0]
            .fit_factors
            .iter()
            .any(|f| f.contains("2 investor networks")));
    }

    #[test]
    fn test_pipeline_missing_company_is_error() {
        let db = test_db();
        assert!(run_pipeline(&db, 404, &PipelineOptions::default()).is_err());
    }

    #[test]
    fn test_gated_output_has_min_categories() {
        let db = test_db();
        let now = "2026-01-01T00:00:00";
        let company_id = db.insert_company("Startup Co", now).unwrap();
        let inv = db
            .insert_investor(
                company_id,
                &NewInvestor {
                    full_name: "Investor A".into(),
                    industry: Some("FinTech".into()),
                    location: Some("Boston, MA".into()),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        // One candidate with a single weak signal, one with several
        db.insert_connection(
            inv,
            &NewConnection {
                full_name: Some("Weak Signal".into()),
                company: Some("Widgets Inc".into()),
                position: Some("Partner".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        db.insert_connection(
            inv,
            &NewConnection {
                full_name: Some("Strong Match".into()),
                company: Some("FinTech Ventures".into()),
                position: Some("Managing Director".into()),
                location: Some("Boston".into()),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let outcome = run_pipeline(&db, company_id, &PipelineOptions::default()).unwrap();
        for rec in &outcome.recommendations {
            assert!(rec.signals.len() >= MIN_SIGNAL_CATEGORIES);
        }
        assert!(outcome.recommendations.iter().any(|r| r.name == "Strong Match"));
        assert!(!outcome.recommendations.iter().any(|r| r.name == "Weak Signal"));
    }
}
