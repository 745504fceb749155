use std::fmt;

/// Title and optional release year inferred from a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedTitle {
    /// Cleaned title used as the search query.
    pub title: String,
    /// Release year, when one could be told apart from the title.
    pub year: Option<u16>,
}

impl ParsedTitle {
    /// Build a parsed title.
    pub fn new(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }

    /// A blank title cannot be searched for.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

impl fmt::Display for ParsedTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}
