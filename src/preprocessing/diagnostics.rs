//! Structured diagnostics.
//!
//! Stages never write to a global logger. They report discrete
//! [`PipelineEvent`]s to a caller-supplied [`DiagnosticSink`], and the caller
//! decides whether events are dropped, collected, or forwarded to `log`.

use std::fmt;
use std::sync::Mutex;

/// A discrete pipeline event.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// Column roles were inferred.
    SchemaInferred {
        numeric: usize,
        categorical: usize,
        target: Option<String>,
    },
    /// A stage finished fitting.
    StageFitted { stage: &'static str, columns: usize },
    /// Missing entries of a column were filled.
    MissingImputed { column: String, count: usize },
    /// Values of a numeric column were clipped into the fitted bounds.
    ValuesClipped { column: String, count: usize },
    /// A numeric column had zero variance in training and is emitted as zeros.
    DegenerateColumn { column: String },
    /// A categorical level not seen during fit was encoded as all zeros.
    UnseenCategory {
        column: String,
        level: String,
        count: usize,
    },
    /// The stratified split was computed.
    SplitComputed { train: usize, test: usize },
    /// A table was transformed into a feature matrix.
    TransformCompleted { rows: usize, columns: usize },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::SchemaInferred {
                numeric,
                categorical,
                target,
            } => write!(
                f,
                "schema inferred: {} numeric, {} categorical, target {:?}",
                numeric, categorical, target
            ),
            PipelineEvent::StageFitted { stage, columns } => {
                write!(f, "{} fitted on {} column(s)", stage, columns)
            }
            PipelineEvent::MissingImputed { column, count } => {
                write!(f, "imputed {} missing value(s) in '{}'", count, column)
            }
            PipelineEvent::ValuesClipped { column, count } => {
                write!(f, "clipped {} value(s) in '{}'", count, column)
            }
            PipelineEvent::DegenerateColumn { column } => {
                write!(f, "column '{}' has zero variance, emitting zeros", column)
            }
            PipelineEvent::UnseenCategory {
                column,
                level,
                count,
            } => write!(
                f,
                "unseen level '{}' in '{}' ({} row(s)), encoded as all zeros",
                level, column, count
            ),
            PipelineEvent::SplitComputed { train, test } => {
                write!(f, "split computed: {} train, {} test", train, test)
            }
            PipelineEvent::TransformCompleted { rows, columns } => {
                write!(f, "transformed {} row(s) into {} column(s)", rows, columns)
            }
        }
    }
}

/// Receiver of pipeline events.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: PipelineEvent);
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: PipelineEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<PipelineEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, event: PipelineEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Forwards events to the `log` facade under the `tabprep` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::UnseenCategory { .. } | PipelineEvent::DegenerateColumn { .. } => {
                log::warn!(target: "tabprep", "{}", event)
            }
            PipelineEvent::MissingImputed { .. } | PipelineEvent::ValuesClipped { .. } => {
                log::debug!(target: "tabprep", "{}", event)
            }
            _ => log::info!(target: "tabprep", "{}", event),
        }
    }
}
