use crate::game::judgment::{MissCause, TimingGrade};
use crate::game::session::EndReason;
use crate::game::style::BeatCue;
use log::debug;
use std::sync::{Arc, Mutex};

/// Discrete signal for the audio layer. The core never waits on a reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    Beat(BeatCue),
    Hit(TimingGrade),
    Miss(MissCause),
    /// Notes the sweeper expired in one pass.
    Expired(u32),
    SessionEnded(EndReason),
}

/// Receives feedback signals. Implementations must not block: they run on
/// the engine thread between session mutations.
pub trait FeedbackSink: Send {
    fn emit(&mut self, feedback: &Feedback);
}

/// Logs signals instead of sounding them.
#[derive(Debug, Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn emit(&mut self, feedback: &Feedback) {
        match feedback {
            Feedback::Beat(cue) => debug!("cue {:?}", cue),
            other => debug!("feedback {:?}", other),
        }
    }
}

/// Drops every signal.
#[derive(Debug, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn emit(&mut self, _feedback: &Feedback) {}
}

/// Collects signals into a shared buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Feedback>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<Feedback> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl FeedbackSink for RecordingSink {
    fn emit(&mut self, feedback: &Feedback) {
        match self.events.lock() {
            Ok(mut events) => events.push(feedback.clone()),
            Err(poisoned) => poisoned.into_inner().push(feedback.clone()),
        }
    }
}
