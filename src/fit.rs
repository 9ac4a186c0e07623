//! Candidate fit scoring: an independent, explainable 0–100 rating.
//!
//! Deliberately weighted differently from the pipeline's raw relevance
//! score: the pipeline asks whether enough independent signals fired,
//! fit asks how good the candidate is overall. Four capped sub-scores sum
//! to a 100-point scale.

use serde::Serialize;

use crate::normalize::{matches_title_pattern, tokenize_location, FIRM_TYPE_TOKENS};
use crate::recommend::CompanyProfile;

const MAX_SIMILARITY_PTS: f64 = 30.0;
const MAX_NETWORK_PTS: f64 = 35.0;
const MAX_LOCATION_PTS: f64 = 20.0;
const MAX_RECENCY_PTS: f64 = 15.0;

/// Max number of factor strings surfaced to the caller.
const MAX_FACTORS: usize = 6;

/// The candidate fields fit scoring reads.
#[derive(Debug, Clone, Default)]
pub struct FitCandidate {
    pub company: String,
    pub position: String,
    pub location: String,
}

/// Per-dimension points, for display.
#[derive(Debug, Clone, Serialize)]
pub struct FitBreakdown {
    pub similarity: f64,
    pub network: f64,
    pub location: f64,
    pub recency: f64,
}

/// Fit result: score, explanation, breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct FitScore {
    pub fit_score: i64,
    pub factors: Vec<String>,
    pub breakdown: FitBreakdown,
}

/// 0–10 pts: candidate title/company overlap with profile industry tokens.
fn industry_overlap_score(position: &str, company: &str, profile: &CompanyProfile) -> f64 {
    if profile.industry_tokens.is_empty() {
        return 0.0;
    }
    let text = format!(" {} {} ", position, company).to_lowercase();
    let matches = profile
        .industry_tokens
        .iter()
        .filter(|t| text.contains(t.as_str()))
        .count();
    if matches == 0 {
        return 0.0;
    }
    (3.0 + matches as f64 * 2.0).min(10.0)
}

/// 0 or 10 pts: investor-like title.
fn title_pattern_score(position: &str) -> f64 {
    if !position.is_empty() && matches_title_pattern(position) {
        10.0
    } else {
        0.0
    }
}

/// 0–10 pts: candidate company looks like an investor org, or overlaps an
/// existing investor firm name.
fn firm_type_score(company: &str, profile: &CompanyProfile) -> f64 {
    if company.is_empty() {
        return 0.0;
    }
    let company_lower = company.trim().to_lowercase();
    let mut pts: f64 = 0.0;
    if FIRM_TYPE_TOKENS.iter().any(|t| company_lower.contains(t)) {
        pts += 5.0;
    }
    if profile
        .investor_firms_lower
        .iter()
        .any(|f| f.len() > 4 && (company_lower.contains(f.as_str()) || f.contains(&company_lower)))
    {
        pts += 5.0;
    }
    pts.min(10.0)
}

fn similarity_score(candidate: &FitCandidate, profile: &CompanyProfile) -> (f64, Vec<String>) {
    let ind_pts = industry_overlap_score(&candidate.position, &candidate.company, profile);
    let title_pts = title_pattern_score(&candidate.position);
    let firm_pts = firm_type_score(&candidate.company, profile);
    let pts = (ind_pts + title_pts + firm_pts).min(MAX_SIMILARITY_PTS);

    let mut factors = Vec::new();
    if ind_pts > 0.0 {
        factors.push("Industry overlap with your investors".to_string());
    }
    if title_pts > 0.0 {
        factors.push("Investor-like title".to_string());
    }
    if firm_pts > 0.0 {
        factors.push("Firm type / similar to your investors".to_string());
    }
    (pts, factors)
}

fn network_score(shared_investors_count: usize, shared_org_count: usize) -> (f64, Vec<String>) {
    let mut pts: f64 = 0.0;
    let mut factors = Vec::new();

    match shared_investors_count {
        0 => {}
        1 => {
            pts += 5.0;
            factors.push("In 1 investor's network".to_string());
        }
        2 => {
            pts += 12.0;
            factors.push("Seen in 2 investor networks".to_string());
        }
        n => {
            pts += 20.0;
            factors.push(format!("Seen in {} investor networks", n));
        }
    }

    match shared_org_count {
        0 => {}
        1 => {
            pts += 7.0;
            factors.push("Company in network".to_string());
        }
        _ => {
            pts += 15.0;
            factors.push("Company appears across network".to_string());
        }
    }

    (pts.min(MAX_NETWORK_PTS), factors)
}

fn location_score(candidate_location: &str, profile: &CompanyProfile) -> (f64, Vec<String>) {
    if candidate_location.trim().is_empty() || profile.location_tokens.is_empty() {
        return (0.0, Vec::new());
    }
    let tokens = tokenize_location(candidate_location);
    if tokens.iter().any(|t| profile.location_tokens.contains(t)) {
        (
            MAX_LOCATION_PTS,
            vec!["Location match with your investors".to_string()],
        )
    } else {
        (0.0, Vec::new())
    }
}

/// Neutral 50% of max: candidates are not yet onboarded, so no interaction
/// timestamp signal exists for them.
fn recency_score() -> (f64, Vec<String>) {
    (MAX_RECENCY_PTS * 0.5, Vec::new())
}

/// Compute the fit score for a candidate against a company profile.
pub fn compute_fit_score(
    candidate: &FitCandidate,
    profile: &CompanyProfile,
    shared_investors_count: usize,
    shared_org_count: usize,
) -> FitScore {
    let (sim_pts, sim_factors) = similarity_score(candidate, profile);
    let (net_pts, net_factors) = network_score(shared_investors_count, shared_org_count);
    let (loc_pts, loc_factors) = location_score(&candidate.location, profile);
    let (rec_pts, rec_factors) = recency_score();

    let total = sim_pts + net_pts + loc_pts + rec_pts;
    let max_pts = MAX_SIMILARITY_PTS + MAX_NETWORK_PTS + MAX_LOCATION_PTS + MAX_RECENCY_PTS;
    let fit_score = ((total / max_pts) * 100.0).clamp(0.0, 100.0).round() as i64;

    let mut factors: Vec<String> = sim_factors;
    factors.extend(net_factors);
    factors.extend(loc_factors);
    factors.extend(rec_factors);
    factors.truncate(MAX_FACTORS);

    FitScore {
        fit_score,
        factors,
        breakdown: FitBreakdown {
            similarity: round1(sim_pts),
            network: round1(net_pts),
            location: round1(loc_pts),
            recency: round1(rec_pts),
        },
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(industry: &[&str], locations: &[&str], firms: &[&str]) -> CompanyProfile {
        let mut profile = CompanyProfile::default();
        profile.industry_tokens = industry.iter().map(|s| s.to_string()).collect();
        for l in locations {
            profile.location_tokens.insert(l.to_string());
        }
        for f in firms {
            profile.investor_firms_lower.insert(f.to_string());
        }
        profile
    }

    #[test]
    fn test_score_bounds() {
        // Max everything
        let profile = profile_with(&["fintech", "saas", "ai", "ml"], &["boston"], &["summit partners"]);
        let candidate = FitCandidate {
            company: "Summit Partners FinTech SaaS AI ML Capital".into(),
            position: "Managing Director".into(),
            location: "Boston".into(),
        };
        let fit = compute_fit_score(&candidate, &profile, 5, 3);
        assert!(fit.fit_score <= 100);
        assert!(fit.fit_score >= 0);
        assert!(fit.factors.len() <= 6);

        // Min everything: recency placeholder still contributes
        let empty = compute_fit_score(&FitCandidate::default(), &CompanyProfile::default(), 0, 0);
        assert!(empty.fit_score > 0);
        assert!(empty.fit_score <= 100);
        assert_eq!(empty.breakdown.recency, 7.5);
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let profile = profile_with(&["fintech"], &["nyc"], &[]);
        let candidate = FitCandidate {
            company: "FinTech Ventures".into(),
            position: "Partner".into(),
            location: "NYC".into(),
        };
        let fit = compute_fit_score(&candidate, &profile, 2, 1);
        let sum = fit.breakdown.similarity
            + fit.breakdown.network
            + fit.breakdown.location
            + fit.breakdown.recency;
        assert_eq!(fit.fit_score, (sum).round() as i64);
    }

    #[test]
    fn test_network_tiers() {
        assert_eq!(network_score(1, 0).0, 5.0);
        assert_eq!(network_score(2, 0).0, 12.0);
        assert_eq!(network_score(3, 0).0, 20.0);
        assert_eq!(network_score(7, 0).0, 20.0);
        assert_eq!(network_score(0, 1).0, 7.0);
        assert_eq!(network_score(0, 2).0, 15.0);
        // Combined, capped at 35
        assert_eq!(network_score(3, 2).0, 35.0);
        assert!(network_score(2, 0).1[0].contains("2 investor networks"));
    }

    #[test]
    fn test_industry_overlap_saturates() {
        let profile = profile_with(&["fintech", "payments", "saas", "lending"], &[], &[]);
        let candidate = FitCandidate {
            company: "FinTech Payments SaaS Lending Corp".into(),
            position: "".into(),
            location: "".into(),
        };
        // 4 matches: 3 + 8 = 11, capped at 10
        let pts = industry_overlap_score(&candidate.position, &candidate.company, &profile);
        assert_eq!(pts, 10.0);
    }

    #[test]
    fn test_location_is_flat_award() {
        let profile = profile_with(&[], &["boston", "ma"], &[]);
        let (pts, factors) = location_score("Boston, MA", &profile);
        assert_eq!(pts, MAX_LOCATION_PTS);
        assert_eq!(factors.len(), 1);
        let (none, _) = location_score("Lisbon", &profile);
        assert_eq!(none, 0.0);
    }
}
