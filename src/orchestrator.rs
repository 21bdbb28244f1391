//! Sequences preview, parse and grouping for the active file.
//!
//! The orchestrator is the only writer of [`PipelineState`]. Each selected
//! file gets a fresh operation id and its own parse worker; messages from
//! any other id are dropped, so a superseded file can never leak rows or
//! status into the one that replaced it.

use crossbeam_channel::{never, select, unbounded, Receiver};
use std::path::Path;
use std::thread::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::driver::{CancelToken, DriverMessage, DriverOutcome, DriverSettings, ParseDriver};
use crate::error_handling::PipelineError;
use crate::grouping::{count_identifiers, group_into_serial_blocks};
use crate::input::{FileInput, InputLimits};
use crate::model::{ParseIssue, ParsedFileResult, SerialBlock};
use crate::platform::Ctrl;
use crate::state::{transition, OperationId, PipelineEvent, PipelineState, PipelineStatus};
use crate::stats::ProcessingStats;

/// Everything delivered for a successfully parsed file
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub file: String,
    pub result: ParsedFileResult,
    pub blocks: Vec<SerialBlock>,
    pub stats: ProcessingStats,
}

/// Receives what the pipeline produces
pub trait Presenter {
    /// A new operation started for `path`
    fn on_file_selected(&mut self, _op: OperationId, _path: &Path) {}

    /// Called after every accepted state change
    fn on_state(&mut self, _state: &PipelineState) {}

    /// A tolerated parse problem of the active file
    fn on_issue(&mut self, _issue: &ParseIssue) {}

    fn on_result(&mut self, output: &PipelineOutput);

    fn on_error(&mut self, error: &PipelineError);

    fn on_cleared(&mut self) {}

    /// Someone asked for the current status (SIGUSR1 / SIGINFO)
    fn on_status_request(&mut self, _state: &PipelineState) {}
}

/// How [`PipelineOrchestrator::wait`] came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Success,
    Error,
    /// Interrupted by a shutdown request; the pipeline is idle again
    Cancelled,
    /// Nothing was in flight
    Idle,
}

struct ActiveOperation {
    id: OperationId,
    file: String,
    cancel: CancelToken,
    worker: Option<JoinHandle<DriverOutcome>>,
    /// Disconnects once the worker has exited, however it exited
    rx: Receiver<(OperationId, DriverMessage)>,
}

enum Wake {
    Driver(OperationId, DriverMessage),
    Shutdown,
    StatusRequest,
    ControlClosed,
    Disconnected,
}

pub struct PipelineOrchestrator<P: Presenter> {
    settings: DriverSettings,
    limits: InputLimits,
    presenter: P,
    state: PipelineState,
    last_op: OperationId,
    active: Option<ActiveOperation>,
    output: Option<PipelineOutput>,
}

impl<P: Presenter> PipelineOrchestrator<P> {
    pub fn new(settings: DriverSettings, limits: InputLimits, presenter: P) -> Self {
        Self {
            settings,
            limits,
            presenter,
            state: PipelineState::idle(),
            last_op: 0,
            active: None,
            output: None,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Result of the last successful file, until another file or a clear replaces it
    pub fn output(&self) -> Option<&PipelineOutput> {
        self.output.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Start processing `path`, superseding whatever was in flight
    pub fn select_file<Q: AsRef<Path>>(&mut self, path: Q) -> OperationId {
        let path = path.as_ref();
        self.supersede();
        self.output = None;

        self.last_op += 1;
        let op = self.last_op;
        info!(op, file = %path.display(), "file selected");
        self.presenter.on_file_selected(op, path);
        self.apply(PipelineEvent::FileSelected { op });

        let input = match FileInput::open(path, &self.limits) {
            Ok(input) => input,
            Err(err) => {
                debug!(op, error = %err, "input rejected");
                self.apply(PipelineEvent::InputRejected {
                    op,
                    message: err.message().to_string(),
                });
                self.presenter.on_error(&err);
                return op;
            }
        };

        let cancel = CancelToken::new();
        let file = input.name().to_string();
        let driver = ParseDriver::new(input, self.settings, cancel.clone());
        // The worker holds the only sender
        let (tx, rx) = unbounded();
        match driver.spawn(op, tx) {
            Ok(worker) => {
                self.active = Some(ActiveOperation {
                    id: op,
                    file,
                    cancel,
                    worker: Some(worker),
                    rx,
                });
            }
            Err(e) => {
                let err = PipelineError::PreviewFailure(format!("Failed to start parser: {}", e));
                self.apply(PipelineEvent::PreviewFailed {
                    op,
                    message: err.message().to_string(),
                });
                self.presenter.on_error(&err);
            }
        }
        op
    }

    /// Drop the active file and everything derived from it
    pub fn clear(&mut self) {
        self.supersede();
        self.output = None;
        self.apply(PipelineEvent::Cleared);
        self.presenter.on_cleared();
    }

    /// Select `path` and block until it settles
    pub fn process<Q: AsRef<Path>>(&mut self, path: Q, ctrl: Option<&Receiver<Ctrl>>) -> Settled {
        self.select_file(path);
        self.wait(ctrl)
    }

    /// Handle driver messages until the active file settles
    ///
    /// A `Ctrl::Shutdown` on `ctrl` cancels the active file and returns
    /// [`Settled::Cancelled`].
    pub fn wait(&mut self, ctrl: Option<&Receiver<Ctrl>>) -> Settled {
        let mut ctrl = ctrl.cloned().unwrap_or_else(never);

        while let Some(rx) = self.active.as_ref().map(|a| a.rx.clone()) {
            let wake = select! {
                recv(rx) -> msg => match msg {
                    Ok((op, message)) => Wake::Driver(op, message),
                    Err(_) => Wake::Disconnected,
                },
                recv(ctrl) -> msg => match msg {
                    Ok(Ctrl::Shutdown { .. }) => Wake::Shutdown,
                    Ok(Ctrl::PrintStats) => Wake::StatusRequest,
                    Err(_) => Wake::ControlClosed,
                },
            };

            match wake {
                Wake::Driver(op, message) => self.handle_message(op, message),
                Wake::Shutdown => {
                    info!("shutdown requested, cancelling active file");
                    self.clear();
                    return Settled::Cancelled;
                }
                Wake::StatusRequest => self.presenter.on_status_request(&self.state),
                Wake::ControlClosed => ctrl = never(),
                Wake::Disconnected => self.worker_lost(),
            }
        }

        match self.state.status {
            PipelineStatus::Success => Settled::Success,
            PipelineStatus::Error => Settled::Error,
            _ => Settled::Idle,
        }
    }

    /// Apply one tagged driver message; messages of other operations are dropped
    pub fn handle_message(&mut self, op: OperationId, message: DriverMessage) {
        if self.active.as_ref().map(|a| a.id) != Some(op) {
            trace!(op, "dropping message of superseded operation");
            return;
        }

        match message {
            DriverMessage::Preview(decision) => self.apply(PipelineEvent::PreviewParsed {
                op,
                has_header: decision.has_header,
            }),
            DriverMessage::Progress { cursor, total } => {
                self.apply(PipelineEvent::RowsParsed { op, cursor, total })
            }
            DriverMessage::Issue(issue) => self.presenter.on_issue(&issue),
            DriverMessage::PreviewFailed(message) => {
                self.finish_active();
                self.apply(PipelineEvent::PreviewFailed {
                    op,
                    message: message.clone(),
                });
                self.presenter
                    .on_error(&PipelineError::PreviewFailure(message));
            }
            DriverMessage::Failed(message) => {
                self.finish_active();
                self.apply(PipelineEvent::ParseFailed {
                    op,
                    message: message.clone(),
                });
                self.presenter.on_error(&PipelineError::ParseFailure(message));
            }
            DriverMessage::Completed { result, mut stats } => {
                let file = self.finish_active().unwrap_or_default();
                let blocks = group_into_serial_blocks(result.rows());
                let (with_number, _) = count_identifiers(result.rows());
                stats.record_grouping(with_number, &blocks);
                debug!(op, blocks = blocks.len(), "grouping done");

                self.apply(PipelineEvent::ParseCompleted { op });
                let output = PipelineOutput {
                    file,
                    result,
                    blocks,
                    stats,
                };
                self.presenter.on_result(&output);
                self.output = Some(output);
            }
        }
    }

    /// The worker went away without a final message (it panicked)
    fn worker_lost(&mut self) {
        let Some(op) = self.active.as_ref().map(|a| a.id) else {
            return;
        };
        self.finish_active();
        let message = "Parser stopped unexpectedly".to_string();
        let error = if self.state.status == PipelineStatus::Detecting {
            self.apply(PipelineEvent::PreviewFailed {
                op,
                message: message.clone(),
            });
            PipelineError::PreviewFailure(message)
        } else {
            self.apply(PipelineEvent::ParseFailed {
                op,
                message: message.clone(),
            });
            PipelineError::ParseFailure(message)
        };
        self.presenter.on_error(&error);
    }

    fn apply(&mut self, event: PipelineEvent) {
        let next = transition(&self.state, &event);
        if next != self.state {
            self.state = next;
            self.presenter.on_state(&self.state);
        }
    }

    /// Cancel the active operation; its worker winds down on its own
    fn supersede(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            debug!(op = active.id, file = %active.file, "operation superseded");
        }
    }

    /// The active operation reported its last message; reap its worker
    fn finish_active(&mut self) -> Option<String> {
        let mut active = self.active.take()?;
        if let Some(worker) = active.worker.take() {
            if worker.join().is_err() {
                warn!(op = active.id, "parse worker panicked");
            }
        }
        Some(active.file)
    }
}

impl<P: Presenter> Drop for PipelineOrchestrator<P> {
    fn drop(&mut self) {
        self.supersede();
    }
}
