//! Pipeline status and progress as a value object.
//!
//! Every transition is a pure function of the current state and one event.
//! The orchestrator owns the only live `PipelineState` and replaces it with
//! the result of [`transition`] for each event it accepts.

use std::fmt;

/// Identifies one file's parse operation; strictly increasing per orchestrator
pub type OperationId = u64;

/// Progress shown while the preview runs
pub const DETECTING_PROGRESS: f64 = 5.0;
/// Progress when full parsing starts
pub const PARSING_FLOOR: f64 = 10.0;
/// Highest progress before completion
pub const PARSING_CEILING: f64 = 99.0;
/// Share of the bar covered by bytes consumed
const PARSING_SPAN: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Detecting,
    Parsing,
    Success,
    Error,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStatus::Idle => "idle",
            PipelineStatus::Detecting => "detecting",
            PipelineStatus::Parsing => "parsing",
            PipelineStatus::Success => "success",
            PipelineStatus::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub status: PipelineStatus,
    /// Percentage in [0, 100], non-decreasing within one operation
    pub progress: f64,
    pub operation: Option<OperationId>,
    pub has_header: Option<bool>,
    pub error: Option<String>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::idle()
    }
}

impl PipelineState {
    pub fn idle() -> Self {
        Self {
            status: PipelineStatus::Idle,
            progress: 0.0,
            operation: None,
            has_header: None,
            error: None,
        }
    }

    /// Shorthand for `transition(self, event)`
    pub fn apply(&self, event: &PipelineEvent) -> Self {
        transition(self, event)
    }

    /// Whether `op` is the operation this state belongs to
    pub fn is_current(&self, op: OperationId) -> bool {
        self.operation == Some(op)
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A new file was presented; starts a fresh lifecycle
    FileSelected { op: OperationId },
    /// The file failed validation before any parsing
    InputRejected { op: OperationId, message: String },
    PreviewParsed { op: OperationId, has_header: bool },
    PreviewFailed { op: OperationId, message: String },
    /// Bytes consumed so far out of `total`
    RowsParsed {
        op: OperationId,
        cursor: u64,
        total: u64,
    },
    ParseCompleted { op: OperationId },
    ParseFailed { op: OperationId, message: String },
    /// The active file was cleared
    Cleared,
}

impl PipelineEvent {
    pub fn operation(&self) -> Option<OperationId> {
        match self {
            PipelineEvent::FileSelected { op }
            | PipelineEvent::InputRejected { op, .. }
            | PipelineEvent::PreviewParsed { op, .. }
            | PipelineEvent::PreviewFailed { op, .. }
            | PipelineEvent::RowsParsed { op, .. }
            | PipelineEvent::ParseCompleted { op }
            | PipelineEvent::ParseFailed { op, .. } => Some(*op),
            PipelineEvent::Cleared => None,
        }
    }
}

/// Progress for `cursor` bytes consumed out of `total`, within [10, 99]
pub fn parsing_progress(cursor: u64, total: u64) -> f64 {
    if total == 0 {
        return PARSING_FLOOR;
    }
    let fraction = cursor as f64 / total as f64;
    (PARSING_FLOOR + fraction * PARSING_SPAN).clamp(PARSING_FLOOR, PARSING_CEILING)
}

/// Compute the state that follows `state` after `event`
///
/// Events tagged with an operation other than the current one are stale and
/// leave the state untouched, as do events that do not apply to the current
/// status (a row arriving while detecting, a second completion, ...).
pub fn transition(state: &PipelineState, event: &PipelineEvent) -> PipelineState {
    use PipelineStatus::*;

    match event {
        PipelineEvent::FileSelected { op } => PipelineState {
            status: Detecting,
            progress: DETECTING_PROGRESS,
            operation: Some(*op),
            has_header: None,
            error: None,
        },
        PipelineEvent::Cleared => PipelineState::idle(),
        _ => {
            let Some(op) = event.operation() else {
                return state.clone();
            };
            if !state.is_current(op) {
                return state.clone();
            }
            apply_current(state, event)
        }
    }
}

fn apply_current(state: &PipelineState, event: &PipelineEvent) -> PipelineState {
    use PipelineStatus::*;

    match (state.status, event) {
        (Detecting, PipelineEvent::InputRejected { message, .. })
        | (Detecting, PipelineEvent::PreviewFailed { message, .. })
        | (Parsing, PipelineEvent::ParseFailed { message, .. }) => PipelineState {
            status: Error,
            error: Some(message.clone()),
            ..state.clone()
        },
        (Detecting, PipelineEvent::PreviewParsed { has_header, .. }) => PipelineState {
            status: Parsing,
            progress: state.progress.max(PARSING_FLOOR),
            has_header: Some(*has_header),
            ..state.clone()
        },
        (Parsing, PipelineEvent::RowsParsed { cursor, total, .. }) => PipelineState {
            progress: state.progress.max(parsing_progress(*cursor, *total)),
            ..state.clone()
        },
        (Parsing, PipelineEvent::ParseCompleted { .. }) => PipelineState {
            status: Success,
            progress: 100.0,
            ..state.clone()
        },
        _ => state.clone(),
    }
}
