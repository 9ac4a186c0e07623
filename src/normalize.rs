//! Name and token normalization primitives.
//!
//! Everything downstream (recommendation merging, overlap counting, graph
//! person nodes, relationship addressing) treats two free-text names that
//! normalize to the same key as the same person, so `normalize_name` has to
//! be deterministic and stable across imports.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Company-name words that suggest an investment firm (lowercase, matched
/// as substrings).
pub const FIRM_TYPE_TOKENS: &[&str] = &[
    "capital",
    "partners",
    "ventures",
    "venture",
    "equity",
    "fund",
    "group",
    "holdings",
    "investments",
    "private equity",
    "vc",
    "venture capital",
    "growth",
    "advisors",
    "advisory",
];

/// Title fragments that suggest an investor-like role (lowercase, matched
/// as substrings).
pub const TITLE_PATTERNS: &[&str] = &[
    "partner",
    "principal",
    "vp",
    "vice president",
    "md",
    "managing director",
    "director",
    "investor",
    "associate",
    "analyst",
    "head of",
    "managing partner",
];

/// Produce a stable key for name matching and dedup.
///
/// Lowercases, strips accents and punctuation, drops single-letter middle
/// initials, collapses whitespace, and removes the remaining spaces.
/// `"Nicholas A. De Noyer"` and `"nicholas de noyer"` both key to
/// `"nicholasdenoyer"`.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    // NFKD decompose, drop combining marks, then drop punctuation. Keeping
    // whitespace here so the middle-initial pass still sees word boundaries.
    let stripped: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let parts: Vec<&str> = stripped.split_whitespace().collect();
    let last = parts.len().saturating_sub(1);
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if part.chars().count() > 1 || i == 0 || i == last {
            key.push_str(part);
        }
    }
    key
}

/// Location tokens for matching: the whole lowercased string plus each
/// trimmed comma-separated part.
pub fn tokenize_location(location: &str) -> Vec<String> {
    let s = location.trim().to_lowercase();
    if s.is_empty() {
        return Vec::new();
    }
    let mut tokens = vec![s.clone()];
    for part in s.split(',') {
        let t = part.trim();
        if !t.is_empty() && !tokens.iter().any(|x| x == t) {
            tokens.push(t.to_string());
        }
    }
    tokens
}

/// Industry-like tokens: split on `/`, `,`, `|`; keep trimmed lowercase
/// tokens longer than one character.
pub fn tokenize_industry(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for part in text.split(['/', ',', '|']) {
        let t = part.trim().to_lowercase();
        if t.chars().count() > 1 && !tokens.contains(&t) {
            tokens.push(t);
        }
    }
    tokens
}

/// Firm-type vocabulary members that appear in `company_name` (lowercase
/// substring test).
pub fn extract_firm_type_tokens(company_name: &str) -> Vec<&'static str> {
    let s = company_name.trim().to_lowercase();
    if s.is_empty() {
        return Vec::new();
    }
    FIRM_TYPE_TOKENS
        .iter()
        .copied()
        .filter(|t| s.contains(t))
        .collect()
}

/// True if `title` contains any investor-like title fragment.
pub fn matches_title_pattern(title: &str) -> bool {
    let t = title.trim().to_lowercase();
    if t.is_empty() {
        return false;
    }
    TITLE_PATTERNS.iter().any(|p| t.contains(p))
}
