//! Observation hooks for analysis runs.
//!
//! An analyzer reports its state transitions, streamed tokens and fallback
//! decisions to an optional [`EventHandler`]. Handlers see the same run that
//! `tracing` logs, in a form suited to progress displays and tests.

use std::sync::Arc;

use crate::analyzer::PipelineState;

/// Events emitted during one analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The pipeline entered a new state.
    StateChanged {
        /// The state just entered.
        state: PipelineState,
    },
    /// A chunk arrived from a streaming backend.
    Token {
        /// The chunk text, exactly as received.
        chunk: String,
    },
    /// Canned output replaced (part of) the model's result.
    FallbackApplied {
        /// Display form of the absorbed error.
        reason: String,
    },
    /// The analysis produced its result.
    Done {
        /// Whether the result came from the model rather than fallback.
        validated: bool,
        /// Wall time of the whole analysis in milliseconds.
        elapsed_ms: u64,
    },
}

/// Receives [`Event`]s from an analyzer.
///
/// Called synchronously on the analyzing task, so implementations should
/// return quickly.
///
/// # Example
///
/// ```
/// use readme_digest::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::Token { chunk } => print!("{}", chunk),
///             Event::StateChanged { state } => println!("[state] {}", state),
///             Event::FallbackApplied { reason } => println!("[fallback] {}", reason),
///             Event::Done { elapsed_ms, .. } => println!("[done] {}ms", elapsed_ms),
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// ```
/// use readme_digest::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::Token { chunk } = event {
///         print!("{}", chunk);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}

/// Handler that records every event, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Recorder {
    events: std::sync::Mutex<Vec<Event>>,
}

#[cfg(test)]
impl Recorder {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn states(&self) -> Vec<PipelineState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StateChanged { state } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Token { chunk } => Some(chunk),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl EventHandler for Recorder {
    fn on_event(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}
