//! Scan → parse → lookup → select → write orchestration.
//!
//! Everything is request scoped: a [`CandidateSets`] value is built for one
//! operator request and dropped with it. Per-file failures are recorded next to
//! the file they concern and never abort the batch.

/// Per-file state machine.
pub mod state;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use mediascout_model::{
    Candidate, MediaFile, Outcome, OutcomeStatus, ParsedTitle, PosterOption,
    Selection,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cover::CoverWriter;
use crate::error::{Result, ScoutError};
use crate::metadata::MetadataProvider;
use crate::parser::TitleParser;
use crate::scanner;

pub use state::{FileEvent, FileState, InvalidTransition};

/// Reason recorded on writes that never started because the request was
/// cancelled.
pub const CANCELLED: &str = "cancelled";

/// Concurrency bounds for lookups and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Metadata lookups in flight at once.
    pub lookup_concurrency: usize,
    /// Cover writes in flight at once.
    pub write_concurrency: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            lookup_concurrency: 4,
            write_concurrency: 4,
        }
    }
}

/// Ranked candidates for one needs-cover file.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSet {
    /// The file needing a cover.
    pub media_file: MediaFile,
    /// Title and year used for the lookup.
    pub parsed: ParsedTitle,
    /// Ranked matches, best first.
    pub candidates: Vec<Candidate>,
    /// Where the file is in the flow.
    pub state: FileState,
    /// Why the list is empty when the lookup failed.
    pub note: Option<String>,
}

impl CandidateSet {
    fn new(media_file: MediaFile, parsed: ParsedTitle) -> Self {
        Self {
            media_file,
            parsed,
            candidates: Vec::new(),
            state: FileState::PendingScan,
            note: None,
        }
    }

    /// Apply `event` to the file's state.
    pub fn advance(&mut self, event: FileEvent) -> std::result::Result<(), InvalidTransition> {
        self.state = self.state.apply(event)?;
        Ok(())
    }
}

/// Candidate sets in the order the files were given.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CandidateSets {
    sets: Vec<CandidateSet>,
}

impl CandidateSets {
    /// The set for the file at `path`.
    pub fn get(&self, path: &Path) -> Option<&CandidateSet> {
        self.sets.iter().find(|set| set.media_file.path == path)
    }

    /// Sets in input order.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateSet> {
        self.sets.iter()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether there are no files.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Take the sets out in input order.
    pub fn into_vec(self) -> Vec<CandidateSet> {
        self.sets
    }
}

impl IntoIterator for CandidateSets {
    type Item = CandidateSet;
    type IntoIter = std::vec::IntoIter<CandidateSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

/// Parses, looks up and writes covers for one request at a time.
#[derive(Clone)]
pub struct SelectionWorkflow {
    parser: TitleParser,
    provider: Arc<dyn MetadataProvider>,
    writer: CoverWriter,
    options: WorkflowOptions,
}

impl fmt::Debug for SelectionWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionWorkflow")
            .field("parser", &self.parser)
            .field("writer", &self.writer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SelectionWorkflow {
    /// Wire the workflow's collaborators.
    pub fn new(
        parser: TitleParser,
        provider: Arc<dyn MetadataProvider>,
        writer: CoverWriter,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            parser,
            provider,
            writer,
            options,
        }
    }

    /// The title parser.
    pub fn parser(&self) -> &TitleParser {
        &self.parser
    }

    /// The metadata provider.
    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Parse and look up every file, a few at a time.
    pub async fn build_candidate_sets(&self, media_files: Vec<MediaFile>) -> CandidateSets {
        let total = media_files.len();
        let sets: Vec<CandidateSet> = stream::iter(media_files)
            .map(|media_file| self.lookup(media_file))
            .buffered(self.options.lookup_concurrency.max(1))
            .collect()
            .await;

        let unmatched = sets.iter().filter(|s| s.candidates.is_empty()).count();
        info!(
            "Built candidates for {} files ({} without matches)",
            total, unmatched
        );
        CandidateSets { sets }
    }

    async fn lookup(&self, media_file: MediaFile) -> CandidateSet {
        let parsed = self.parser.parse(&media_file.stem);
        let mut set = CandidateSet::new(media_file, parsed);

        match self.provider.search(&set.parsed).await {
            Ok(candidates) => {
                debug!(
                    "{} candidates for {} ({})",
                    candidates.len(),
                    set.media_file,
                    set.parsed
                );
                set.candidates = candidates;
            }
            Err(e) => {
                warn!("Lookup for {} failed: {}", set.media_file, e);
                set.note = Some(format!("no matches available: {e}"));
            }
        }

        for event in [FileEvent::CandidatesFound, FileEvent::Presented] {
            if let Err(e) = set.advance(event) {
                warn!("{}: {}", set.media_file, e);
            }
        }
        set
    }

    /// Scan `directory` and build candidate sets for its needs-cover files.
    pub async fn candidates_for_directory(
        &self,
        directory: &Path,
        extensions: &[String],
    ) -> Result<CandidateSets> {
        let media_files = scan_blocking(directory.to_path_buf(), extensions.to_vec()).await?;
        Ok(self.build_candidate_sets(media_files).await)
    }

    /// Free-text search, ranked like a filename lookup.
    pub async fn search(&self, title: &ParsedTitle) -> Result<Vec<Candidate>> {
        self.provider.search(title).await
    }

    /// Details for one movie plus its alternative posters.
    ///
    /// Missing posters are not an error; the list is just empty.
    pub async fn movie_with_posters(
        &self,
        external_id: u64,
    ) -> Result<(Candidate, Vec<PosterOption>)> {
        let (details, posters) = tokio::join!(
            self.provider.movie_details(external_id),
            self.provider.posters(external_id)
        );
        let posters = posters.unwrap_or_else(|e| {
            warn!("No posters for movie {}: {}", external_id, e);
            Vec::new()
        });
        Ok((details?, posters))
    }

    /// Carry out operator decisions. Returns one outcome per selection, in
    /// input order.
    ///
    /// Once `cancel` fires, writes already in flight finish and the rest are
    /// reported as skipped.
    pub async fn apply_selections(
        &self,
        selections: Vec<Selection>,
        cancel: &CancellationToken,
    ) -> Vec<Outcome> {
        let outcomes: Vec<Outcome> = stream::iter(selections)
            .map(|selection| self.apply_one(selection, cancel))
            .buffered(self.options.write_concurrency.max(1))
            .collect()
            .await;

        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        info!(
            "Applied {} selections: {} written, {} failed, {} skipped",
            outcomes.len(),
            count(OutcomeStatus::Written),
            count(OutcomeStatus::Failed),
            count(OutcomeStatus::Skipped)
        );
        outcomes
    }

    async fn apply_one(&self, selection: Selection, cancel: &CancellationToken) -> Outcome {
        let Selection {
            media_file,
            chosen_candidate,
        } = selection;

        let Some(candidate) = chosen_candidate else {
            debug!("{}: skipped by operator", media_file);
            return Outcome::skipped(media_file, None);
        };
        if cancel.is_cancelled() {
            debug!("Not writing {}: request cancelled", media_file);
            return Outcome::skipped(media_file, Some(CANCELLED.to_string()));
        }

        debug!(
            "{}: writing cover from {} ({})",
            media_file, candidate.title, candidate.external_id
        );
        self.writer.write(&media_file, &candidate).await
    }
}

async fn scan_blocking(directory: PathBuf, extensions: Vec<String>) -> Result<Vec<MediaFile>> {
    tokio::task::spawn_blocking(move || {
        scanner::scan(&directory, &extensions).map(|files| files.collect::<Vec<_>>())
    })
    .await
    .map_err(|e| ScoutError::Internal(format!("scan task failed: {e}")))?
}
