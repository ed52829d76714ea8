//! Learning rules
//!
//! Pure functions that turn feedback into pattern knowledge:
//! - immediate lessons from a single outcome
//! - reflection over a recent window of outcomes

pub mod lessons;
pub mod reflection;

pub use lessons::{derive_lessons, extract_immediate_lessons, PatternLesson};
pub use reflection::{analyze, incorporate, recent_feedback, Analysis};
