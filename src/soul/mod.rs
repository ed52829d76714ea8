//! Soul module - the persisted, self-improving knowledge of the architect
//!
//! The soul is a single JSON document that accumulates sales feedback and
//! the patterns learned from it. It integrates:
//! - Profile data model (identity, mandate, knowledge, feedback history)
//! - Store (load with structural repair, atomic save)
//! - Engine (feedback ingest, reflection cycles)
//! - Views (ICP recommendations, statistics)

pub mod engine;
pub mod profile;
pub mod store;
pub mod view;

pub use engine::SoulEngine;
pub use profile::{FeedbackInput, FeedbackRecord, Knowledge, Outcome, Profile};
pub use store::{LoadError, SoulStore};
pub use view::{IcpSummary, SoulStats};

use anyhow::Result;

/// Print soul statistics
pub fn show_stats(engine: &SoulEngine) -> Result<()> {
    println!("System Statistics:");
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);
    Ok(())
}

/// Print current ICP recommendations
pub fn show_recommendations(engine: &SoulEngine) -> Result<()> {
    println!("Current ICP Recommendations:");
    println!(
        "{}",
        serde_json::to_string_pretty(&engine.current_recommendations())?
    );
    Ok(())
}
