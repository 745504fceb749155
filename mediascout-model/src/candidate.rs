/// One metadata-service search result for a parsed title.
///
/// Produced by the metadata client, ranked once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// The service's record id.
    pub external_id: u64,
    /// Localized title.
    pub title: String,
    /// Title in the original language, when the service has one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub original_title: Option<String>,
    /// Release year.
    pub year: Option<u16>,
    /// Service-relative artwork path (e.g. `/abc.jpg`) or an absolute URL.
    pub poster_reference: Option<String>,
    /// The service's popularity measure.
    pub popularity_score: f64,
    /// Plot summary.
    #[cfg_attr(feature = "serde", serde(default))]
    pub overview: Option<String>,
}

impl Candidate {
    /// Whether a non-blank poster reference is present.
    pub fn has_poster(&self) -> bool {
        self.poster_reference
            .as_deref()
            .map(str::trim)
            .is_some_and(|path| !path.is_empty())
    }
}

/// An alternative poster for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PosterOption {
    /// Service-relative artwork path.
    pub path: String,
    /// Small preview for the picker.
    pub thumb_url: String,
    /// Full-size artwork.
    pub full_url: String,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_may_be_absent() {
        let candidate: Candidate = serde_json::from_value(json!({
            "external_id": 603,
            "title": "The Matrix",
            "year": 1999,
            "poster_reference": "/matrix.jpg",
            "popularity_score": 12.5,
        }))
        .unwrap();

        assert_eq!(candidate.original_title, None);
        assert_eq!(candidate.overview, None);
        assert!(candidate.has_poster());
    }

    #[test]
    fn blank_poster_reference_is_no_poster() {
        let candidate: Candidate = serde_json::from_value(json!({
            "external_id": 1,
            "title": "Untitled",
            "year": null,
            "poster_reference": "  ",
            "popularity_score": 0.0,
        }))
        .unwrap();
        assert!(!candidate.has_poster());
    }
}
