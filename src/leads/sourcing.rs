//! Mock lead generation steered by the learned ICP
//!
//! No external sourcing APIs are called. Leads are templated from the
//! current target/avoid signals and scored by how well they match them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::soul::profile::format_timestamp;
use crate::soul::view::IcpSummary;

/// Recommendation bucket for a scored lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    High,
    Medium,
    Low,
}

impl Recommendation {
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            Recommendation::High
        } else if confidence > 0.5 {
            Recommendation::Medium
        } else {
            Recommendation::Low
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::High => write!(f, "HIGH"),
            Recommendation::Medium => write!(f, "MEDIUM"),
            Recommendation::Low => write!(f, "LOW"),
        }
    }
}

/// A generated lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    pub company_name: String,
    pub company_size: String,
    pub industry: String,
    pub revenue_potential: f64,
    /// ICP match in [0.0, 1.0]
    pub confidence_score: f64,
    pub generated_at: String,
    /// Set by [`LeadSourcer::score_leads`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Company template chosen from the target signals
struct Archetype {
    company_size: &'static str,
    industry: &'static str,
    revenue_potential: f64,
}

static ARCHETYPES: [(&str, Archetype); 2] = [
    (
        "10-50",
        Archetype {
            company_size: "10-50",
            industry: "SaaS",
            revenue_potential: 75_000.0,
        },
    ),
    (
        "50-100",
        Archetype {
            company_size: "50-100",
            industry: "FinTech",
            revenue_potential: 120_000.0,
        },
    ),
];

static FALLBACK: Archetype = Archetype {
    company_size: "100-500",
    industry: "Tech",
    revenue_potential: 50_000.0,
};

const AVOIDED_INDUSTRY: &str = "Manufacturing";
const SAFE_INDUSTRY: &str = "SaaS";
const PREFERRED_INDUSTRIES: [&str; 2] = ["saas", "fintech"];

#[derive(Debug, Clone, Default)]
pub struct LeadSourcer;

impl LeadSourcer {
    pub fn new() -> Self {
        Self
    }

    /// Generate `count` leads shaped by the ICP
    pub fn generate_leads(&self, count: usize, icp: &IcpSummary) -> Vec<Lead> {
        debug!(
            "Targeting {:?}, avoiding {:?}",
            icp.target_signals, icp.avoid_signals
        );

        let leads: Vec<Lead> = (0..count)
            .map(|i| self.create_lead(i, &icp.target_signals, &icp.avoid_signals))
            .collect();

        info!("Generated {} leads from ICP patterns", leads.len());
        leads
    }

    fn create_lead(&self, index: usize, target_signals: &[String], avoid_signals: &[String]) -> Lead {
        let archetype = ARCHETYPES
            .iter()
            .find(|(marker, _)| target_signals.iter().any(|s| s.contains(marker)))
            .map(|(_, archetype)| archetype)
            .unwrap_or(&FALLBACK);

        let industry = if avoid_signals.iter().any(|s| s.contains(AVOIDED_INDUSTRY)) {
            SAFE_INDUSTRY
        } else {
            archetype.industry
        };

        Lead {
            lead_id: format!("lead_{}", index),
            company_name: format!("Acme{}{}", industry, index),
            company_size: archetype.company_size.to_string(),
            industry: industry.to_string(),
            revenue_potential: archetype.revenue_potential,
            confidence_score: lead_confidence(archetype.company_size, industry, target_signals),
            generated_at: format_timestamp(Utc::now()),
            recommendation: None,
        }
    }

    /// Bucket each lead and sort by confidence, best first
    pub fn score_leads(&self, mut leads: Vec<Lead>) -> Vec<Lead> {
        for lead in &mut leads {
            lead.recommendation = Some(Recommendation::for_confidence(lead.confidence_score));
        }
        leads.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        leads
    }
}

/// ICP match score for a lead profile
pub fn lead_confidence(company_size: &str, industry: &str, target_signals: &[String]) -> f64 {
    let mut confidence: f64 = 0.5;

    if target_signals.iter().any(|s| s.contains(company_size)) {
        confidence += 0.3;
    }
    if PREFERRED_INDUSTRIES.contains(&industry.to_lowercase().as_str()) {
        confidence += 0.2;
    }

    confidence.min(1.0)
}
