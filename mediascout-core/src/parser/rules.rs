//! Technical-tag vocabulary used to find where the title ends.
//!
//! Rules are tried in order; the first one that matches a token wins. Adding a
//! vocabulary means pushing another [`TagRule`], the tie-break logic in the
//! parser never needs to change.

use once_cell::sync::Lazy;
use regex::Regex;

/// Category of a technical tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `1080p`, `4k`, ...
    Resolution,
    /// `BluRay`, `WEB-DL`, ...
    Source,
    /// `x264`, `HEVC`, ...
    Codec,
    /// `DTS`, `AC3`, ...
    Audio,
    /// `PROPER`, `Extended`, ...
    Edition,
}

/// One category with the token pattern that identifies it.
#[derive(Debug, Clone)]
pub struct TagRule {
    kind: TagKind,
    pattern: Regex,
}

impl TagRule {
    /// Patterns are matched against a whole token, case-insensitively.
    pub fn new(kind: TagKind, pattern: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("(?i)^(?:{pattern})$"))?;
        Ok(Self { kind, pattern })
    }

    /// The category this rule assigns.
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    fn matches(&self, token: &str) -> bool {
        self.pattern.is_match(token)
    }
}

static BUILTIN_RULES: Lazy<Vec<TagRule>> = Lazy::new(|| {
    [
        (
            TagKind::Resolution,
            r"2160p|1440p|1080[pi]|720p|576[pi]|480[pi]|360p|4k|uhd",
        ),
        (
            TagKind::Source,
            r"blu-?ray|bdrip|brrip|bdremux|remux|dvdrip|dvdscr|dvd5|dvd9|webrip|web-?dl|hdtv|hdrip|hdcam|telesync|amzn|nf",
        ),
        (
            TagKind::Codec,
            r"[xh]26[45]|hevc|avc|xvid|divx|10-?bit|8-?bit|hdr|hdr10\+?|dovi",
        ),
        (
            TagKind::Audio,
            r"aac|e?ac3|dts(?:-hd|-x|-ma)?|truehd|atmos|flac|mp3|ddp?[257]?",
        ),
        (
            TagKind::Edition,
            r"proper|repack|unrated|extended|remastered|uncut|internal|limited|imax",
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        TagRule::new(kind, pattern).expect("builtin tag regex should compile")
    })
    .collect()
});

/// Ordered set of tag rules.
#[derive(Debug, Clone)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TagRules {
    /// The built-in vocabulary.
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
        }
    }

    /// No rules at all; nothing is a tag.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule, tried after the existing ones.
    pub fn push(&mut self, rule: TagRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify one normalized token.
    ///
    /// `x264-SPARKS` style tokens (a tag carrying a release-group suffix) are
    /// classified by the part before the last dash.
    pub fn classify(&self, token: &str) -> Option<TagKind> {
        let bare = strip_brackets(token);
        if bare.is_empty() {
            return None;
        }

        if let Some(kind) = self.match_token(bare) {
            return Some(kind);
        }

        match bare.rsplit_once('-') {
            Some((head, group)) if !head.is_empty() && !group.is_empty() => {
                self.match_token(head)
            }
            _ => None,
        }
    }

    fn match_token(&self, token: &str) -> Option<TagKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(token))
            .map(TagRule::kind)
    }
}

pub(crate) fn strip_brackets(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']' | '{' | '}'))
}

/// A token that looks like a release year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct YearToken {
    pub year: u16,
    /// Written as `(1999)` or `[1999]`.
    pub bracketed: bool,
}

pub(crate) fn year_token(token: &str) -> Option<YearToken> {
    let bracketed = (token.starts_with('(') && token.ends_with(')'))
        || (token.starts_with('[') && token.ends_with(']'));
    let digits = if bracketed {
        &token[1..token.len() - 1]
    } else {
        token
    };

    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: u16 = digits.parse().ok()?;
    (1900..=2099)
        .contains(&year)
        .then_some(YearToken { year, bracketed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_builtin_vocabularies() {
        let rules = TagRules::builtin();
        assert_eq!(rules.classify("1080p"), Some(TagKind::Resolution));
        assert_eq!(rules.classify("BluRay"), Some(TagKind::Source));
        assert_eq!(rules.classify("WEB-DL"), Some(TagKind::Source));
        assert_eq!(rules.classify("x265"), Some(TagKind::Codec));
        assert_eq!(rules.classify("DTS-HD"), Some(TagKind::Audio));
        assert_eq!(rules.classify("REPACK"), Some(TagKind::Edition));
        assert_eq!(rules.classify("[720p]"), Some(TagKind::Resolution));
        assert_eq!(rules.classify("Matrix"), None);
    }

    #[test]
    fn release_group_suffix_is_classified_by_its_head() {
        let rules = TagRules::builtin();
        assert_eq!(rules.classify("x264-SPARKS"), Some(TagKind::Codec));
        assert_eq!(rules.classify("WEB-DL-NTb"), Some(TagKind::Source));
        assert_eq!(rules.classify("Spider-Man"), None);
    }

    #[test]
    fn custom_rules_extend_the_vocabulary() {
        let mut rules = TagRules::builtin();
        assert_eq!(rules.classify("VOSTFR"), None);
        rules.push(TagRule::new(TagKind::Audio, "vostfr|multi").unwrap());
        assert_eq!(rules.classify("VOSTFR"), Some(TagKind::Audio));
    }

    #[test]
    fn year_tokens() {
        assert_eq!(
            year_token("1999"),
            Some(YearToken {
                year: 1999,
                bracketed: false
            })
        );
        assert_eq!(
            year_token("(2010)"),
            Some(YearToken {
                year: 2010,
                bracketed: true
            })
        );
        assert_eq!(year_token("1899"), None);
        assert_eq!(year_token("2100"), None);
        assert_eq!(year_token("12345"), None);
        assert_eq!(year_token("(2010"), None);
    }
}
