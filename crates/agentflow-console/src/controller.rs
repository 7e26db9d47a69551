//! Stream-driven view controller.
//!
//! Owns the per-run [`ViewState`] and at most one open
//! [`StreamConnection`]. Items are applied one at a time, in arrival order,
//! by whoever drives the controller (the canvas tick loop or the headless
//! runner); nothing here is shared across tasks.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use agentflow_network::{StreamConnection, StreamConnector, StreamError, StreamItem};
use agentflow_protocol::{NodeStatus, StreamEvent};
use agentflow_state::{Applied, ViewState};

const MAX_LOG_ENTRIES: usize = 500;

/// Items applied per [`StreamController::pump`] call, so a fast producer
/// cannot keep the caller from redrawing.
pub const PUMP_BUDGET: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Run,
    Event,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub category: LogCategory,
    pub message: String,
}

/// How the last run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The terminal node reported `complete`.
    Completed,
    /// The stream failed before the terminal event.
    Failed(String),
}

pub struct StreamController<C> {
    connector: C,
    terminal_node: String,
    view: ViewState,
    connection: Option<StreamConnection>,
    run_id: Option<Uuid>,
    runs_started: u64,
    events_applied: u64,
    last_outcome: Option<RunOutcome>,
    log: VecDeque<LogEntry>,
}

impl<C: StreamConnector> StreamController<C> {
    pub fn new(connector: C, terminal_node: impl Into<String>) -> Self {
        Self {
            connector,
            terminal_node: terminal_node.into(),
            view: ViewState::new(),
            connection: None,
            run_id: None,
            runs_started: 0,
            events_applied: 0,
            last_outcome: None,
            log: VecDeque::new(),
        }
    }

    /// Begin a run: clear node state and open the stream.
    ///
    /// Returns `false` without touching anything when a stream is already open.
    pub fn start(&mut self) -> bool {
        if self.is_streaming() {
            tracing::debug!(run_id = ?self.run_id, "start ignored, stream already open");
            return false;
        }

        let run_id = Uuid::new_v4();
        self.view.reset();
        self.events_applied = 0;
        self.last_outcome = None;
        self.run_id = Some(run_id);
        self.runs_started += 1;
        self.connection = Some(self.connector.connect());

        let endpoint = self.connector.endpoint();
        tracing::info!(run_id = %run_id, endpoint = %endpoint, "simulation started");
        self.push_log(LogCategory::Run, format!("Simulation started ({endpoint})"));
        true
    }

    /// Apply one stream event. Ignored unless a stream is open.
    pub fn on_event(&mut self, event: StreamEvent) -> Option<Applied> {
        if !self.is_streaming() {
            tracing::trace!(node = %event.node, "event ignored, no open stream");
            return None;
        }

        let applied = self.view.apply(&event);
        self.events_applied += 1;
        tracing::debug!(
            run_id = ?self.run_id,
            node = %event.node,
            status = %event.status,
            deactivated = applied.deactivated.len(),
            "event applied"
        );
        self.push_log(LogCategory::Event, describe_event(&event));

        if event.is_terminal(&self.terminal_node) {
            self.finish(RunOutcome::Completed);
        }
        Some(applied)
    }

    /// Treat any stream failure as the end of the run.
    pub fn on_error(&mut self, err: StreamError) {
        if !self.is_streaming() {
            tracing::trace!(error = %err, "error ignored, no open stream");
            return;
        }
        tracing::warn!(run_id = ?self.run_id, error = %err, "event stream failed");
        self.push_log(LogCategory::Error, format!("Stream failed: {err}"));
        self.finish(RunOutcome::Failed(err.to_string()));
    }

    pub fn dispatch(&mut self, item: StreamItem) {
        match item {
            StreamItem::Event(event) => {
                self.on_event(event);
            }
            StreamItem::Error(err) => self.on_error(err),
        }
    }

    /// Apply items already buffered on the open stream, at most
    /// [`PUMP_BUDGET`] of them. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        self.pump_at_most(PUMP_BUDGET)
    }

    pub fn pump_at_most(&mut self, budget: usize) -> usize {
        let mut handled = 0;
        while handled < budget {
            let Some(item) = self.connection.as_mut().and_then(|c| c.try_next()) else {
                break;
            };
            self.dispatch(item);
            handled += 1;
        }
        handled
    }

    /// Wait for the next item of the open stream; `None` when no stream is open.
    pub async fn next_item(&mut self) -> Option<StreamItem> {
        match self.connection.as_mut() {
            Some(conn) => conn.next().await,
            None => None,
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
        match &outcome {
            RunOutcome::Completed => {
                tracing::info!(run_id = ?self.run_id, events = self.events_applied, "simulation complete");
                self.push_log(LogCategory::Run, "Simulation complete".to_string());
            }
            RunOutcome::Failed(_) => {
                self.push_log(LogCategory::Run, "Simulation stopped".to_string());
            }
        }
        self.last_outcome = Some(outcome);
    }

    fn push_log(&mut self, category: LogCategory, message: String) {
        self.log.push_back(LogEntry {
            timestamp: Utc::now(),
            category,
            message,
        });
        while self.log.len() > MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.connection.is_some()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn terminal_node(&self) -> &str {
        &self.terminal_node
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn log(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + ExactSizeIterator {
        self.log.iter()
    }
}

fn describe_event(event: &StreamEvent) -> String {
    let mut line = format!("{} -> {}", event.node, event.status);
    if event.status == NodeStatus::Active {
        if let Some(tool) = &event.tool {
            line.push_str(&format!(" [{tool}]"));
        }
    }
    if !event.message.is_empty() {
        line.push_str(": ");
        line.push_str(&event.message);
    }
    line
}
