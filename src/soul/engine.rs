//! Soul Engine - the feedback-to-pattern learning core
//!
//! Owns one profile and the store it came from. Every mutating call
//! (feedback ingest, reflection) works on a copy and only replaces the
//! in-memory profile once that copy is saved, so a failed save leaves the
//! engine exactly as it was.
//!
//! The engine is not internally synchronized. Callers sharing one engine
//! across tasks must serialize access themselves (the HTTP server wraps it
//! in a mutex).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

use super::profile::{FeedbackInput, FeedbackRecord, Profile};
use super::store::SoulStore;
use super::view::{IcpSummary, SoulStats};
use crate::learning::{self, Analysis};

pub struct SoulEngine {
    store: SoulStore,
    profile: Profile,
}

impl SoulEngine {
    /// Open (or create) the soul file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_store(SoulStore::new(path))
    }

    pub fn with_store(store: SoulStore) -> Result<Self> {
        let profile = store.load_or_create()?;
        Ok(Self { store, profile })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Direct access for maintenance and tests; call `save` afterwards
    pub fn profile_mut(&mut self) -> &mut Profile {
        &mut self.profile
    }

    pub fn store(&self) -> &SoulStore {
        &self.store
    }

    pub fn save(&mut self) -> Result<()> {
        self.commit(|_| ())
    }

    /// Log one outcome from loosely-typed JSON
    ///
    /// Never rejects input; see [`FeedbackInput::from_value`].
    pub fn add_feedback(&mut self, outcome_data: &Value) -> Result<FeedbackRecord> {
        self.record_feedback(FeedbackInput::from_value(outcome_data))
    }

    /// Log one outcome and learn its immediate lessons
    pub fn record_feedback(&mut self, input: FeedbackInput) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::new(input, Utc::now());

        let learned = self.commit(|profile| {
            profile.feedback_history.push(record.clone());
            profile.current_knowledge.total_learning_examples =
                profile.feedback_history.len() as u64;
            learning::extract_immediate_lessons(&record, &mut profile.current_knowledge)
        })?;

        for lesson in &learned {
            debug!("Learned {:?}", lesson);
        }
        info!(
            "Recorded '{}' feedback ({} new patterns, {} total examples)",
            record.outcome,
            learned.len(),
            self.profile.current_knowledge.total_learning_examples
        );
        Ok(record)
    }

    /// Analyze the last `days` days of feedback and fold the result in
    ///
    /// Returns None, without touching the profile, when the window is empty.
    pub fn run_reflection_cycle(&mut self, days: i64) -> Result<Option<Analysis>> {
        self.run_reflection_cycle_at(days, Utc::now())
    }

    pub fn run_reflection_cycle_at(
        &mut self,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Analysis>> {
        let analysis = {
            let recent = learning::recent_feedback(&self.profile.feedback_history, days, now);
            if recent.is_empty() {
                debug!("No feedback in the last {} days, skipping reflection", days);
                return Ok(None);
            }
            learning::analyze(&recent)
        };

        self.commit(|profile| {
            learning::incorporate(&analysis, &mut profile.current_knowledge);
            profile.evolution_cycles += 1;
        })?;

        info!(
            "Reflection cycle {} complete: win rate {:.1}% over {} examples, confidence now {:.3}",
            self.profile.evolution_cycles,
            analysis.win_rate * 100.0,
            analysis.examples_analyzed,
            self.profile.current_knowledge.confidence_score
        );
        Ok(Some(analysis))
    }

    /// Apply `change` to a copy of the profile, save it, then adopt it
    fn commit<T>(&mut self, change: impl FnOnce(&mut Profile) -> T) -> Result<T> {
        let mut next = self.profile.clone();
        let outcome = change(&mut next);
        self.store.save(&mut next)?;
        self.profile = next;
        Ok(outcome)
    }

    /// Current ICP recommendations
    pub fn current_recommendations(&self) -> IcpSummary {
        IcpSummary::from_knowledge(&self.profile.current_knowledge)
    }

    pub fn stats(&self) -> SoulStats {
        SoulStats::from_profile(&self.profile)
    }
}
