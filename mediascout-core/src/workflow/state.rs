use std::fmt;

/// Where one media file is in the scan → select → write flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Found by the scan, not yet looked up.
    PendingScan,
    /// Lookup finished.
    CandidatesReady,
    /// Shown to the operator.
    AwaitingSelection,
    /// A cover is being fetched and written.
    Downloading,
    /// Cover written or file skipped.
    Done,
}

/// Things that move a file between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    /// Lookup finished, with or without matches.
    CandidatesFound,
    /// Candidates were shown to the operator.
    Presented,
    /// The operator picked a candidate.
    Selected,
    /// The operator skipped the file.
    Skipped,
    /// The cover was written.
    Written,
    /// Fetching or writing the cover failed.
    WriteFailed,
}

/// An event that is not allowed in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while {state}")]
pub struct InvalidTransition {
    /// State the file was in.
    pub state: FileState,
    /// The rejected event.
    pub event: FileEvent,
}

impl FileState {
    /// The state after `event`, or an error if it does not apply.
    pub fn apply(self, event: FileEvent) -> Result<FileState, InvalidTransition> {
        use FileEvent::*;
        use FileState::*;

        match (self, event) {
            (PendingScan, CandidatesFound) => Ok(CandidatesReady),
            (CandidatesReady, Presented) => Ok(AwaitingSelection),
            (AwaitingSelection, Selected) => Ok(Downloading),
            (AwaitingSelection, Skipped) => Ok(Done),
            (Downloading, Written) => Ok(Done),
            (Downloading, WriteFailed) => Ok(AwaitingSelection),
            (state, event) => Err(InvalidTransition { state, event }),
        }
    }

    /// Whether the file needs no further work.
    pub fn is_terminal(self) -> bool {
        self == FileState::Done
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileState::PendingScan => "pending_scan",
            FileState::CandidatesReady => "candidates_ready",
            FileState::AwaitingSelection => "awaiting_selection",
            FileState::Downloading => "downloading",
            FileState::Done => "done",
        })
    }
}
