//! Beat-timing and scoring core for a tap/gesture rhythm game.
//!
//! The [`game`] module holds the deterministic rules: note spawning, gesture
//! classification, judgment, expiry and the session state they share. The
//! [`core`] module runs those rules in real time: a clock, the tick and
//! sweep timers, and an engine thread that owns the session and serializes
//! every mutation.

pub mod config;
pub mod core;
pub mod error;
pub mod game;

pub use crate::config::{GameConfig, SessionConfig, StyleChoice};
pub use crate::core::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::core::engine::{Engine, EngineHandle, TransportMode};
pub use crate::core::feedback::{Feedback, FeedbackSink};
pub use crate::error::{Error, Result};
pub use crate::game::note::{GestureType, Note, Resolution};
pub use crate::game::scores::{Rank, SessionResult};
pub use crate::game::session::{EndReason, Game, GameEvent, Phase, Session};
pub use crate::game::snapshot::{NoteView, SessionSnapshot};
pub use crate::game::style::MusicStyle;
