//! Read-only projections of the profile

use serde::{Deserialize, Serialize};

use super::profile::{Knowledge, Profile};

/// How many of the most recent patterns are surfaced as signals
pub const SURFACED_PATTERNS: usize = 5;

/// Ideal Customer Profile recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpSummary {
    /// Most recent positive patterns, oldest first
    pub target_signals: Vec<String>,
    /// Most recent negative patterns, oldest first
    pub avoid_signals: Vec<String>,
    pub whale_indicators: Vec<String>,
    pub confidence_level: f64,
    pub based_on_examples: u64,
}

impl IcpSummary {
    pub fn from_knowledge(knowledge: &Knowledge) -> Self {
        Self {
            target_signals: last_n(&knowledge.positive_patterns, SURFACED_PATTERNS),
            avoid_signals: last_n(&knowledge.negative_patterns, SURFACED_PATTERNS),
            whale_indicators: knowledge.whale_signals.clone(),
            confidence_level: knowledge.confidence_score,
            based_on_examples: knowledge.total_learning_examples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoulStats {
    pub total_feedback_entries: usize,
    pub evolution_cycles: u64,
    pub patterns_learned: usize,
    pub creation_date: String,
    pub last_updated: String,
}

impl SoulStats {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            total_feedback_entries: profile.feedback_history.len(),
            evolution_cycles: profile.evolution_cycles,
            patterns_learned: profile.current_knowledge.patterns_learned(),
            creation_date: profile.created_date.clone(),
            last_updated: profile.last_updated.clone(),
        }
    }
}

fn last_n(items: &[String], n: usize) -> Vec<String> {
    items[items.len().saturating_sub(n)..].to_vec()
}
