//! Immediate lessons drawn from a single feedback record

use serde::{Deserialize, Serialize};

use crate::soul::profile::{FeedbackRecord, Knowledge, Outcome};

/// Revenue above which a won deal counts as high-ticket
pub const HIGH_TICKET_REVENUE: f64 = 50_000.0;

pub const HIGH_TICKET_SIGNAL: &str = "high_ticket_positive";

/// A pattern derived from one outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum PatternLesson {
    Positive(String),
    Negative(String),
    WhaleSignal(String),
}

impl PatternLesson {
    pub fn pattern(&self) -> &str {
        match self {
            PatternLesson::Positive(p)
            | PatternLesson::Negative(p)
            | PatternLesson::WhaleSignal(p) => p,
        }
    }
}

/// Derive the lessons a single record teaches. Pure.
pub fn derive_lessons(record: &FeedbackRecord) -> Vec<PatternLesson> {
    let mut lessons = Vec::new();

    match record.outcome {
        Outcome::Won => {
            if let Some(size) = record.lead_attribute("company_size") {
                lessons.push(PatternLesson::Positive(format!(
                    "company_size_{}_positive",
                    size
                )));
            }
            if record.revenue > HIGH_TICKET_REVENUE {
                lessons.push(PatternLesson::WhaleSignal(HIGH_TICKET_SIGNAL.to_string()));
            }
        }
        Outcome::Lost => {
            if let Some(industry) = record.lead_attribute("industry") {
                lessons.push(PatternLesson::Negative(format!(
                    "industry_{}_caution",
                    industry
                )));
            }
        }
        _ => {}
    }

    lessons
}

/// Fold lessons into knowledge, returning only those that were new
pub fn apply_lessons(lessons: Vec<PatternLesson>, knowledge: &mut Knowledge) -> Vec<PatternLesson> {
    lessons
        .into_iter()
        .filter(|lesson| match lesson {
            PatternLesson::Positive(p) => knowledge.add_positive_pattern(p),
            PatternLesson::Negative(p) => knowledge.add_negative_pattern(p),
            PatternLesson::WhaleSignal(p) => knowledge.add_whale_signal(p),
        })
        .collect()
}

/// Derive and apply in one step
pub fn extract_immediate_lessons(
    record: &FeedbackRecord,
    knowledge: &mut Knowledge,
) -> Vec<PatternLesson> {
    apply_lessons(derive_lessons(record), knowledge)
}
