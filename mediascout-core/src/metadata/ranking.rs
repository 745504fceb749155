//! Ordering of metadata search results for a parsed title.

use std::cmp::Ordering;

use mediascout_model::{Candidate, ParsedTitle};

/// Lowercase alphanumerics with every other run of characters collapsed to a
/// single space. `IT: Welcome to Derry` and `it welcome to derry` compare
/// equal.
pub fn normalize_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How a candidate's year compares with the parsed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRank {
    /// The filename had no year.
    NotApplicable,
    /// Same year.
    Match,
    /// Different year.
    Mismatch,
    /// The candidate has no year.
    Unknown,
}

impl YearRank {
    fn of(query_year: Option<u16>, candidate_year: Option<u16>) -> Self {
        match (query_year, candidate_year) {
            (None, _) => YearRank::NotApplicable,
            (Some(_), None) => YearRank::Unknown,
            (Some(q), Some(c)) if q == c => YearRank::Match,
            (Some(_), Some(_)) => YearRank::Mismatch,
        }
    }

    fn is_match(self) -> bool {
        self == YearRank::Match
    }
}

/// Sort key computed for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRank {
    /// Normalized titles are equal.
    pub exact_title: bool,
    /// Year comparison.
    pub year: YearRank,
    /// Position in the service's own relevance order.
    pub service_order: usize,
}

impl CandidateRank {
    /// `Greater` means `self` should be listed first.
    fn cmp_best(&self, other: &Self) -> Ordering {
        self.exact_title
            .cmp(&other.exact_title)
            .then_with(|| {
                // Year only separates candidates that already match exactly.
                if self.exact_title && other.exact_title {
                    self.year.is_match().cmp(&other.year.is_match())
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| other.service_order.cmp(&self.service_order))
    }
}

fn is_exact(query: &str, candidate: &Candidate) -> bool {
    if query.is_empty() {
        return false;
    }
    normalize_title(&candidate.title) == query
        || candidate
            .original_title
            .as_deref()
            .is_some_and(|original| normalize_title(original) == query)
}

/// Rank `results` (given in service relevance order) for `query` and keep at
/// most `limit` of them.
pub fn rank_candidates(
    query: &ParsedTitle,
    results: Vec<Candidate>,
    limit: usize,
) -> Vec<Candidate> {
    let normalized = normalize_title(&query.title);

    let mut ranked: Vec<(CandidateRank, Candidate)> = results
        .into_iter()
        .enumerate()
        .map(|(service_order, candidate)| {
            let rank = CandidateRank {
                exact_title: is_exact(&normalized, &candidate),
                year: YearRank::of(query.year, candidate.year),
                service_order,
            };
            (rank, candidate)
        })
        .collect();

    ranked.sort_by(|(a, _), (b, _)| a.cmp_best(b).reverse());
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate)
        .collect()
}
