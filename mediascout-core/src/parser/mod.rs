//! Filename to title inference.
//!
//! The parser is pure and total: any stem yields a [`ParsedTitle`], in the
//! worst case the normalized stem itself with no year.
//!
//! Year tie-break:
//! - When the name carries technical tags (`1080p`, `BluRay`, `x264`, ...) the
//!   year is the last year-shaped token before the first tag, or failing that
//!   the last year-shaped token anywhere.
//! - Without technical tags only a bracketed year (`(1999)`) is taken. A bare
//!   trailing number stays in the title, so `Blade Runner 2049` is left alone.
//! - A year-shaped first token is never a year: `2012` is the title.

/// Tag vocabulary.
pub mod rules;

use mediascout_model::ParsedTitle;
use once_cell::sync::Lazy;
use tracing::debug;

pub use rules::{TagKind, TagRule, TagRules};
use rules::year_token;

static DEFAULT_PARSER: Lazy<TitleParser> = Lazy::new(TitleParser::default);

/// Parse a filename stem with the built-in tag vocabulary.
pub fn parse(stem: &str) -> ParsedTitle {
    DEFAULT_PARSER.parse(stem)
}

/// Infers a title and year from a filename stem.
#[derive(Debug, Clone, Default)]
pub struct TitleParser {
    rules: TagRules,
}

impl TitleParser {
    /// A parser using the built-in tag vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser using a custom tag vocabulary.
    pub fn with_rules(rules: TagRules) -> Self {
        Self { rules }
    }

    /// The tag vocabulary in use.
    pub fn rules(&self) -> &TagRules {
        &self.rules
    }

    /// Infer a title and year. Never fails.
    pub fn parse(&self, stem: &str) -> ParsedTitle {
        let normalized = normalize_separators(stem);
        let tokens: Vec<&str> = normalized.split(' ').collect();
        let first_tag = tokens
            .iter()
            .position(|token| self.rules.classify(token).is_some());

        if let Some((year_idx, year)) = pick_year(&tokens, first_tag) {
            let cut = first_tag.map_or(year_idx, |tag| tag.min(year_idx));
            let title = join_title(&tokens[..cut]);
            if !title.is_empty() {
                return ParsedTitle::new(title, Some(year));
            }
            debug!(
                stem,
                year, "year candidate would empty the title, keeping it"
            );
        }

        let title = join_title(&tokens[..first_tag.unwrap_or(tokens.len())]);
        if title.is_empty() {
            return ParsedTitle::new(normalized, None);
        }
        ParsedTitle::new(title, None)
    }
}

/// `.` `_` and whitespace runs become single spaces.
pub fn normalize_separators(stem: &str) -> String {
    stem.split(|c: char| c == '.' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn pick_year(
    tokens: &[&str],
    first_tag: Option<usize>,
) -> Option<(usize, u16)> {
    // The first token is never a year: something has to remain as the title.
    let candidates: Vec<_> = tokens
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, token)| year_token(token).map(|y| (idx, y)))
        .collect();

    let chosen = match first_tag {
        Some(tag) => candidates
            .iter()
            .rev()
            .find(|(idx, _)| *idx < tag)
            .or_else(|| candidates.last()),
        None => candidates.iter().rev().find(|(_, y)| y.bracketed),
    };

    chosen.map(|(idx, y)| (*idx, y.year))
}

fn join_title(tokens: &[&str]) -> String {
    tokens
        .join(" ")
        .trim_end_matches(|c: char| {
            c.is_whitespace()
                || matches!(c, '-' | '–' | ',' | ':' | ';' | '(' | '[' | '{' | '+' | '~')
        })
        .trim_start_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}
