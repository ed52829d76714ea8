//! Lead pipeline collaborators
//!
//! Simulated lead sourcing driven by the learned ICP, and a CRM bridge that
//! feeds closed deals back into the soul.

pub mod crm;
pub mod sourcing;

pub use crm::{process_outcomes, CrmOutcome};
pub use sourcing::{Lead, LeadSourcer, Recommendation};
