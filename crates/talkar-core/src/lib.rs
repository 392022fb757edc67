//! # talkar-core
//!
//! Core types and primitives for the TalkAR experience interpreter.
//! This crate contains foundational types shared across all TalkAR crates:
//! colors, vectors, durations, easing functions, configuration and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod math;
pub mod time;
pub mod types;

pub use config::*;

pub use color::Color;
pub use error::{TalkarError, TalkarResult};
pub use math::Vec3;
pub use time::{Duration, Timestamp};
pub use types::Easing;
