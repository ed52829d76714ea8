//! CRM bridge - turn closed-deal exports into soul feedback
//!
//! Reads outcomes from an exported JSON file or uses a canned sample.
//! There is no live CRM connection.

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::soul::SoulEngine;

/// One closed deal as exported from a CRM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmOutcome {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default = "default_outcome")]
    pub outcome: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default = "default_response_time")]
    pub response_time_hours: f64,
    #[serde(default)]
    pub deal_size: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub close_date: Option<String>,
}

fn default_outcome() -> String {
    "unknown".to_string()
}

fn default_response_time() -> f64 {
    48.0
}

impl CrmOutcome {
    pub fn closed_on(&self) -> Option<NaiveDate> {
        self.close_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}

/// Canned sample used when no export file is given
pub fn sample_outcomes(today: NaiveDate) -> Vec<CrmOutcome> {
    let days_ago = |n: i64| {
        today
            .checked_sub_signed(TimeDelta::days(n))
            .map(|d| d.format("%Y-%m-%d").to_string())
    };

    vec![
        CrmOutcome {
            company: "TechStart Inc".to_string(),
            company_size: "10-50".to_string(),
            industry: "SaaS".to_string(),
            outcome: "won".to_string(),
            revenue: 75_000.0,
            response_time_hours: 2.0,
            deal_size: Some("medium".to_string()),
            close_date: days_ago(5),
        },
        CrmOutcome {
            company: "BigCorp Ltd".to_string(),
            company_size: "1000+".to_string(),
            industry: "Manufacturing".to_string(),
            outcome: "lost".to_string(),
            revenue: 0.0,
            response_time_hours: 72.0,
            deal_size: Some("large".to_string()),
            close_date: days_ago(10),
        },
    ]
}

/// Read a JSON array of outcomes from an export file
pub fn load_outcomes(path: &Path) -> Result<Vec<CrmOutcome>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CRM export {}", path.display()))?;
    let outcomes: Vec<CrmOutcome> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse CRM export {}", path.display()))?;
    debug!("Read {} outcomes from {}", outcomes.len(), path.display());
    Ok(outcomes)
}

/// Outcomes closed within the last `days_back` days
///
/// Outcomes without a readable close date are kept.
pub fn recent_outcomes(
    outcomes: Vec<CrmOutcome>,
    days_back: i64,
    today: NaiveDate,
) -> Vec<CrmOutcome> {
    let cutoff = today.checked_sub_signed(TimeDelta::try_days(days_back).unwrap_or(TimeDelta::MAX));
    outcomes
        .into_iter()
        .filter(|o| match (o.closed_on(), cutoff) {
            (Some(closed), Some(cutoff)) => closed >= cutoff,
            _ => true,
        })
        .collect()
}

/// Shape an outcome as `add_feedback` input
pub fn to_feedback(outcome: &CrmOutcome) -> Value {
    json!({
        "lead_data": {
            "company_size": outcome.company_size,
            "industry": outcome.industry,
            "response_time_hours": outcome.response_time_hours,
            "company_name": outcome.company,
        },
        "outcome": outcome.outcome,
        "revenue": outcome.revenue,
        "intangible_signals": [],
    })
}

/// Feed every outcome into the soul, returning how many were processed
pub fn process_outcomes(engine: &mut SoulEngine, outcomes: &[CrmOutcome]) -> Result<usize> {
    for outcome in outcomes {
        engine.add_feedback(&to_feedback(outcome))?;
    }
    info!("Processed {} CRM outcomes", outcomes.len());
    Ok(outcomes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_sample_dates() {
        let sample = sample_outcomes(today());
        assert_eq!(sample[0].close_date.as_deref(), Some("2024-06-25"));
        assert_eq!(sample[1].close_date.as_deref(), Some("2024-06-20"));
    }

    #[test]
    fn test_recent_outcomes_window() {
        let sample = sample_outcomes(today());
        assert_eq!(recent_outcomes(sample.clone(), 7, today()).len(), 1);
        assert_eq!(recent_outcomes(sample.clone(), 30, today()).len(), 2);

        let mut undated = sample[1].clone();
        undated.close_date = None;
        assert_eq!(recent_outcomes(vec![undated], 1, today()).len(), 1);
    }

    #[test]
    fn test_export_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, r#"[{"company": "Solo", "outcome": "won"}]"#).unwrap();

        let outcomes = load_outcomes(&path).unwrap();
        assert_eq!(outcomes[0].response_time_hours, 48.0);
        assert_eq!(outcomes[0].revenue, 0.0);
        assert!(outcomes[0].close_date.is_none());
    }

    #[test]
    fn test_process_outcomes_learns() {
        let dir = TempDir::new().unwrap();
        let mut engine = SoulEngine::open(dir.path().join("soul_file.json")).unwrap();

        let processed = process_outcomes(&mut engine, &sample_outcomes(today())).unwrap();

        assert_eq!(processed, 2);
        let knowledge = &engine.profile().current_knowledge;
        assert_eq!(knowledge.positive_patterns, vec!["company_size_10-50_positive"]);
        assert_eq!(knowledge.negative_patterns, vec!["industry_Manufacturing_caution"]);
        assert_eq!(knowledge.whale_signals, vec!["high_ticket_positive"]);
        let lead = &engine.profile().feedback_history[0].lead_data;
        assert_eq!(lead["company_name"], "TechStart Inc");
        assert_eq!(lead["response_time_hours"], 2.0);
    }
}
