//! ICP Architect Library
//!
//! A feedback-to-pattern learning engine with:
//! - A persisted soul file that survives partial or corrupt documents
//! - Immediate lessons from every recorded sales outcome
//! - Periodic reflection cycles that raise confidence as deals are won
//! - Mock lead sourcing and a CRM import bridge driven by the learned ICP
//! - Optional local-model lead analysis and an HTTP dashboard
//!
//! # Example
//!
//! ```no_run
//! use icp_architect::SoulEngine;
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut engine = SoulEngine::open("config/soul_file.json")?;
//!     engine.add_feedback(&json!({
//!         "lead_data": {"company_size": "10-50", "industry": "SaaS"},
//!         "outcome": "won",
//!         "revenue": 75000
//!     }))?;
//!     if let Some(analysis) = engine.run_reflection_cycle(7)? {
//!         println!("win rate {:.2}", analysis.win_rate);
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod soul;
pub mod learning;
pub mod config;

// Collaborators
pub mod leads;
pub mod agent;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use soul::{
    FeedbackInput,
    FeedbackRecord,
    IcpSummary,
    LoadError,
    Outcome,
    Profile,
    SoulEngine,
    SoulStats,
    SoulStore,
};

pub use learning::Analysis;

pub use leads::{Lead, LeadSourcer};

pub use agent::{LeadAnalysis, OllamaClient};

pub use config::Config;

pub use server::{
    ServerState,
    start as start_server,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Feedback-to-pattern ICP learning engine", NAME, VERSION)
}
