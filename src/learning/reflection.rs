//! Reflection cycle - batch analysis of a recent feedback window
//!
//! Functions here take the clock as a parameter so the window can be
//! tested without touching system time.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::soul::profile::{FeedbackRecord, Knowledge};

/// Hard ceiling for `confidence_score`
pub const MAX_CONFIDENCE: f64 = 0.95;
/// Ceiling for the gain of a single cycle
pub const MAX_CONFIDENCE_IMPACT: f64 = 0.1;
/// Confidence gained per unit of win rate
pub const CONFIDENCE_PER_WIN_RATE: f64 = 0.05;

/// Result of analyzing one window, computed before incorporation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub win_rate: f64,
    /// At most one `recent_wins_{N}` tag
    pub significant_patterns: Vec<String>,
    pub confidence_impact: f64,
    /// Size of the analyzed window
    pub examples_analyzed: usize,
}

/// Records strictly newer than `now - days`
///
/// Records whose timestamp cannot be parsed are skipped.
pub fn recent_feedback(
    history: &[FeedbackRecord],
    days: i64,
    now: DateTime<Utc>,
) -> Vec<&FeedbackRecord> {
    // An out-of-range window either covers everything or nothing
    let cutoff = TimeDelta::try_days(days).and_then(|window| now.checked_sub_signed(window));

    history
        .iter()
        .filter(|record| match record.recorded_at() {
            Some(at) => cutoff.map_or(days > 0, |cutoff| at > cutoff),
            None => {
                warn!("Skipping feedback with unreadable timestamp {:?}", record.timestamp);
                false
            }
        })
        .collect()
}

pub fn analyze(recent: &[&FeedbackRecord]) -> Analysis {
    let total = recent.len();
    let wins = recent.iter().filter(|r| r.outcome.is_favorable()).count();

    let win_rate = if total > 0 {
        wins as f64 / total as f64
    } else {
        0.0
    };

    let significant_patterns = if wins > 0 {
        vec![format!("recent_wins_{}", wins)]
    } else {
        Vec::new()
    };

    Analysis {
        win_rate,
        significant_patterns,
        confidence_impact: (win_rate * CONFIDENCE_PER_WIN_RATE).min(MAX_CONFIDENCE_IMPACT),
        examples_analyzed: total,
    }
}

/// Fold an analysis into long-lived knowledge
pub fn incorporate(analysis: &Analysis, knowledge: &mut Knowledge) {
    knowledge.confidence_score =
        (knowledge.confidence_score + analysis.confidence_impact).min(MAX_CONFIDENCE);

    for pattern in &analysis.significant_patterns {
        knowledge.add_positive_pattern(pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soul::profile::{format_timestamp, FeedbackInput};

    fn at(outcome: &str, when: DateTime<Utc>) -> FeedbackRecord {
        FeedbackRecord::new(FeedbackInput::new(outcome), when)
    }

    #[test]
    fn test_window_is_strict_and_skips_bad_stamps() {
        let now = Utc::now();
        let mut bad = at("won", now);
        bad.timestamp = "yesterday-ish".to_string();
        let history = vec![
            at("won", now - TimeDelta::days(30)),
            at("won", now - TimeDelta::days(7)),
            at("lost", now - TimeDelta::days(6)),
            at("won", now + TimeDelta::days(1)),
            bad,
        ];

        let recent = recent_feedback(&history, 7, now);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, format_timestamp(now - TimeDelta::days(6)));
    }

    #[test]
    fn test_absurd_windows_do_not_panic() {
        let now = Utc::now();
        let history = vec![at("won", now)];
        assert_eq!(recent_feedback(&history, i64::MAX, now).len(), 1);
        assert!(recent_feedback(&history, i64::MIN, now).is_empty());
    }

    #[test]
    fn test_analyze_half_wins() {
        let now = Utc::now();
        let history = vec![at("won", now), at("lost", now)];
        let recent: Vec<&FeedbackRecord> = history.iter().collect();

        let analysis = analyze(&recent);
        assert_eq!(analysis.win_rate, 0.5);
        assert!((analysis.confidence_impact - 0.025).abs() < 1e-12);
        assert_eq!(analysis.significant_patterns, vec!["recent_wins_1"]);
        assert_eq!(analysis.examples_analyzed, 2);
    }

    #[test]
    fn test_whale_counts_as_win_and_no_wins_no_tag() {
        let now = Utc::now();
        let history = vec![at("whale", now), at("churned", now)];
        let recent: Vec<&FeedbackRecord> = history.iter().collect();
        assert_eq!(analyze(&recent).win_rate, 0.5);

        let losses = vec![at("lost", now)];
        let recent: Vec<&FeedbackRecord> = losses.iter().collect();
        let analysis = analyze(&recent);
        assert_eq!(analysis.win_rate, 0.0);
        assert!(analysis.significant_patterns.is_empty());
        assert_eq!(analysis.confidence_impact, 0.0);
    }

    #[test]
    fn test_incorporate_caps_confidence() {
        let mut knowledge = Knowledge {
            confidence_score: 0.93,
            ..Knowledge::default()
        };
        let analysis = Analysis {
            win_rate: 1.0,
            significant_patterns: vec!["recent_wins_3".into()],
            confidence_impact: 0.05,
            examples_analyzed: 3,
        };

        incorporate(&analysis, &mut knowledge);
        incorporate(&analysis, &mut knowledge);

        assert_eq!(knowledge.confidence_score, MAX_CONFIDENCE);
        assert_eq!(knowledge.positive_patterns, vec!["recent_wins_3"]);
    }
}
