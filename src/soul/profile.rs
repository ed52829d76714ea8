//! Soul profile - the persisted knowledge document
//!
//! One JSON document per deployment holds the architect's identity, its
//! static mandate, the learned pattern lists and the full feedback history.
//! Field names match the on-disk format so existing soul files load as-is.
//! Keys this version does not know about are kept in `extra` maps and
//! written back untouched.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_NAME: &str = "ICP Architect";
pub const DEFAULT_ROLE: &str = "Senior Lead Strategist & Evolution Specialist";
pub const DEFAULT_VIBE: &str = "Analytical, proactive, obsessed with high-value whale leads";

/// The persisted root record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub role: String,
    pub vibe: String,
    pub core_mandate: CoreMandate,
    pub operating_principles: OperatingPrinciples,
    /// Mutable learned state
    pub current_knowledge: Knowledge,
    /// Append-only, oldest first
    pub feedback_history: Vec<FeedbackRecord>,
    /// Completed reflection cycles
    pub evolution_cycles: u64,
    pub created_date: String,
    /// Refreshed on every save
    pub last_updated: String,
    /// Unrecognized top-level keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Build a fresh profile with the canonical defaults
    pub fn new(now: DateTime<Utc>) -> Self {
        let stamp = format_timestamp(now);
        Self {
            name: DEFAULT_NAME.to_string(),
            role: DEFAULT_ROLE.to_string(),
            vibe: DEFAULT_VIBE.to_string(),
            core_mandate: CoreMandate::default(),
            operating_principles: OperatingPrinciples::default(),
            current_knowledge: Knowledge::default(),
            feedback_history: Vec::new(),
            evolution_cycles: 0,
            created_date: stamp.clone(),
            last_updated: stamp,
            extra: Map::new(),
        }
    }

    /// Mark the profile as updated at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = format_timestamp(now);
    }
}

/// Static mandate text, informational only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreMandate {
    pub start_simple: String,
    pub organize_enrich: String,
    pub learning_loop: String,
    pub self_correction: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CoreMandate {
    fn default() -> Self {
        Self {
            start_simple: "Begin with user's base parameters for industry and company size"
                .to_string(),
            organize_enrich: "Find tech stack, recent news, LinkedIn activity - not just names"
                .to_string(),
            learning_loop: "Weekly analysis of sales outcomes to find hidden patterns".to_string(),
            self_correction: "Immediately add 'Closed Lost' traits to Negative ICP".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingPrinciples {
    pub hunt_whales: String,
    pub identify_intangibles: String,
    pub proactive_evolution: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for OperatingPrinciples {
    fn default() -> Self {
        Self {
            hunt_whales: "Prioritize leads mirroring highest-paying historical customers"
                .to_string(),
            identify_intangibles:
                "Look beyond job titles to tone, pain points, behavioral signals".to_string(),
            proactive_evolution: "Suggest new niches when market shifts are detected".to_string(),
            extra: Map::new(),
        }
    }
}

/// Learned pattern lists and counters
///
/// The three pattern lists are insertion-ordered sets: new tags are
/// appended at the end and never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub positive_patterns: Vec<String>,
    pub negative_patterns: Vec<String>,
    pub whale_signals: Vec<String>,
    /// Reserved
    pub market_shifts_detected: Vec<Value>,
    /// In [0.0, 0.95]
    pub confidence_score: f64,
    pub total_learning_examples: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Knowledge {
    /// Returns true if the tag was not already present
    pub fn add_positive_pattern(&mut self, tag: &str) -> bool {
        push_unique(&mut self.positive_patterns, tag)
    }

    pub fn add_negative_pattern(&mut self, tag: &str) -> bool {
        push_unique(&mut self.negative_patterns, tag)
    }

    pub fn add_whale_signal(&mut self, tag: &str) -> bool {
        push_unique(&mut self.whale_signals, tag)
    }

    /// Number of learned positive and negative patterns
    pub fn patterns_learned(&self) -> usize {
        self.positive_patterns.len() + self.negative_patterns.len()
    }
}

fn push_unique(list: &mut Vec<String>, tag: &str) -> bool {
    if list.iter().any(|existing| existing == tag) {
        return false;
    }
    list.push(tag.to_string());
    true
}

/// Sales outcome of a lead
///
/// Open set: any string is accepted and stored verbatim. Only `won`/`whale`
/// count as favorable and `lost`/`churned` as unfavorable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Won,
    Lost,
    Whale,
    Churned,
    #[default]
    Unknown,
    Other(String),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
            Outcome::Whale => "whale",
            Outcome::Churned => "churned",
            Outcome::Unknown => "unknown",
            Outcome::Other(other) => other,
        }
    }

    pub fn is_favorable(&self) -> bool {
        matches!(self, Outcome::Won | Outcome::Whale)
    }

    pub fn is_unfavorable(&self) -> bool {
        matches!(self, Outcome::Lost | Outcome::Churned)
    }
}

impl From<&str> for Outcome {
    fn from(value: &str) -> Self {
        match value {
            "won" => Outcome::Won,
            "lost" => Outcome::Lost,
            "whale" => Outcome::Whale,
            "churned" => Outcome::Churned,
            "unknown" => Outcome::Unknown,
            other => Outcome::Other(other.to_string()),
        }
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        Outcome::from(value.as_str())
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logged sales outcome
///
/// Decoding never fails: a stored record with missing or odd-typed fields
/// loads with defaults instead of rejecting the whole history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct FeedbackRecord {
    /// Assigned by the store. Kept as text so malformed legacy values survive;
    /// non-string stamps are stored as their JSON text and never parse.
    pub timestamp: String,
    pub lead_data: Map<String, Value>,
    pub outcome: Outcome,
    pub revenue: f64,
    pub intangible_signals: Vec<String>,
    /// Reserved, empty at creation
    pub lessons_extracted: Vec<String>,
}

impl FeedbackRecord {
    pub fn new(input: FeedbackInput, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: format_timestamp(now),
            lead_data: input.lead_data,
            outcome: input.outcome,
            revenue: input.revenue,
            intangible_signals: input.intangible_signals,
            lessons_extracted: Vec::new(),
        }
    }

    /// Parsed `timestamp`, or None if it cannot be read
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// A lead attribute rendered as pattern text, if present and non-empty
    ///
    /// Strings are used verbatim, non-zero numbers by their JSON text.
    /// Empty strings, zero, false, null, arrays and objects count as absent.
    pub fn lead_attribute(&self, key: &str) -> Option<String> {
        match self.lead_data.get(key)? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }
}

impl From<Value> for FeedbackRecord {
    fn from(value: Value) -> Self {
        let timestamp = match value.get("timestamp") {
            Some(Value::String(stamp)) => stamp.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let lessons_extracted = string_list(value.get("lessons_extracted"));
        let input = FeedbackInput::from_value(&value);

        Self {
            timestamp,
            lead_data: input.lead_data,
            outcome: input.outcome,
            revenue: input.revenue,
            intangible_signals: input.intangible_signals,
            lessons_extracted,
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Caller-supplied outcome data, leniently decoded
///
/// Nothing is rejected: absent or wrong-typed fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackInput {
    pub lead_data: Map<String, Value>,
    pub outcome: Outcome,
    pub revenue: f64,
    pub intangible_signals: Vec<String>,
}

impl FeedbackInput {
    pub fn new(outcome: impl Into<Outcome>) -> Self {
        Self {
            outcome: outcome.into(),
            ..Self::default()
        }
    }

    pub fn with_lead_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.lead_data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn with_signal(mut self, signal: &str) -> Self {
        self.intangible_signals.push(signal.to_string());
        self
    }

    /// Decode from arbitrary JSON
    pub fn from_value(value: &Value) -> Self {
        let lead_data = value
            .get("lead_data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let outcome = value
            .get("outcome")
            .and_then(Value::as_str)
            .map(Outcome::from)
            .unwrap_or_default();
        let revenue = value
            .get("revenue")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let intangible_signals = string_list(value.get("intangible_signals"));

        Self {
            lead_data,
            outcome,
            revenue,
            intangible_signals,
        }
    }
}

impl From<&Value> for FeedbackInput {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

/// RFC 3339 text used for every timestamp this crate writes
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (including a trailing `Z`) and legacy naive ISO-8601
/// stamps without an offset, which are read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_roundtrips_as_plain_string() {
        let won: Outcome = serde_json::from_value(json!("won")).unwrap();
        assert_eq!(won, Outcome::Won);
        assert_eq!(serde_json::to_value(&won).unwrap(), json!("won"));

        let custom: Outcome = serde_json::from_value(json!("pending_review")).unwrap();
        assert_eq!(custom, Outcome::Other("pending_review".to_string()));
        assert_eq!(serde_json::to_value(&custom).unwrap(), json!("pending_review"));
    }

    #[test]
    fn test_outcome_classification() {
        assert!(Outcome::Won.is_favorable());
        assert!(Outcome::Whale.is_favorable());
        assert!(Outcome::Lost.is_unfavorable());
        assert!(Outcome::Churned.is_unfavorable());
        assert!(!Outcome::Unknown.is_favorable());
        assert!(!Outcome::Other("won ".into()).is_favorable());
    }

    #[test]
    fn test_input_defaults_for_missing_and_wrong_types() {
        let input = FeedbackInput::from_value(&json!({
            "lead_data": "not a map",
            "outcome": 42,
            "revenue": "lots",
            "intangible_signals": ["fast_responder", 7, null]
        }));
        assert!(input.lead_data.is_empty());
        assert_eq!(input.outcome, Outcome::Unknown);
        assert_eq!(input.revenue, 0.0);
        assert_eq!(input.intangible_signals, vec!["fast_responder".to_string()]);

        let empty = FeedbackInput::from_value(&json!("nope"));
        assert_eq!(empty, FeedbackInput::default());
    }

    #[test]
    fn test_lead_attribute_truthiness() {
        let record = FeedbackRecord::new(
            FeedbackInput::new("won")
                .with_lead_field("company_size", "10-50")
                .with_lead_field("employees", 120)
                .with_lead_field("industry", "")
                .with_lead_field("zero", 0)
                .with_lead_field("nested", json!({"a": 1})),
            Utc::now(),
        );
        assert_eq!(record.lead_attribute("company_size").as_deref(), Some("10-50"));
        assert_eq!(record.lead_attribute("employees").as_deref(), Some("120"));
        assert_eq!(record.lead_attribute("industry"), None);
        assert_eq!(record.lead_attribute("zero"), None);
        assert_eq!(record.lead_attribute("nested"), None);
        assert_eq!(record.lead_attribute("missing"), None);
    }

    #[test]
    fn test_stored_record_decodes_leniently() {
        let record: FeedbackRecord = serde_json::from_value(json!({
            "timestamp": 1714557600,
            "lead_data": {"company_size": "10-50"},
            "outcome": null,
            "revenue": null,
            "intangible_signals": ["warm_intro", 3],
            "lessons_extracted": null
        }))
        .unwrap();

        assert_eq!(record.timestamp, "1714557600");
        assert!(record.recorded_at().is_none());
        assert_eq!(record.outcome, Outcome::Unknown);
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.intangible_signals, vec!["warm_intro"]);
        assert!(record.lessons_extracted.is_empty());
        assert_eq!(record.lead_attribute("company_size").as_deref(), Some("10-50"));

        let bare: FeedbackRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bare.timestamp, "");
        assert!(bare.lead_data.is_empty());
    }

    #[test]
    fn test_well_formed_record_roundtrips() {
        let record = FeedbackRecord::new(
            FeedbackInput::new("won")
                .with_lead_field("industry", "SaaS")
                .with_revenue(75_000.0)
                .with_signal("technical_buyer"),
            Utc::now(),
        );
        let decoded: FeedbackRecord =
            serde_json::from_value(serde_json::to_value(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00").is_some());
        assert!(parse_timestamp("last tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_push_unique_keeps_insertion_order() {
        let mut knowledge = Knowledge::default();
        assert!(knowledge.add_positive_pattern("a"));
        assert!(knowledge.add_positive_pattern("b"));
        assert!(!knowledge.add_positive_pattern("a"));
        assert_eq!(knowledge.positive_patterns, vec!["a", "b"]);
        assert_eq!(knowledge.patterns_learned(), 2);
    }
}
