//! Local model client (Ollama) for lead analysis
//!
//! Analysis never fails from the caller's point of view: an unreachable
//! server or an unreadable reply degrades to a neutral default score.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OllamaConfig;

/// Model verdict on a single lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadAnalysis {
    /// 1-10
    pub score: f64,
    pub reasoning: String,
    /// 0.0-1.0
    pub confidence: f64,
}

impl LeadAnalysis {
    fn new(score: f64, reasoning: impl Into<String>, confidence: f64) -> Self {
        Self {
            score,
            reasoning: reasoning.into(),
            confidence,
        }
    }

    /// Server answered with a non-success status
    pub fn unavailable() -> Self {
        Self::new(5.0, "AI analysis unavailable", 0.5)
    }

    /// Request could not be completed
    pub fn failed(error: &str) -> Self {
        Self::new(5.0, format!("AI error: {}", error), 0.3)
    }

    /// Reply arrived but held no readable verdict
    pub fn unparsed() -> Self {
        Self::new(7.0, "AI analysis completed", 0.8)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check whether the server answers
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Score one lead with the local model
    pub async fn analyze_lead(&self, lead: &Value) -> LeadAnalysis {
        match self.generate(&analysis_prompt(lead)).await {
            Ok(Some(text)) => parse_analysis(&text),
            Ok(None) => LeadAnalysis::unavailable(),
            Err(e) => {
                warn!("Lead analysis request failed: {:#}", e);
                LeadAnalysis::failed(&e.to_string())
            }
        }
    }

    /// Raw completion. `Ok(None)` means the server answered with an error status.
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to reach model server")?;

        if !response.status().is_success() {
            debug!("Model server returned {}", response.status());
            return Ok(None);
        }

        let body: GenerateResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => bail!("Failed to decode model response: {}", e),
        };
        Ok(Some(body.response))
    }
}

fn analysis_prompt(lead: &Value) -> String {
    let lead_json = serde_json::to_string_pretty(lead).unwrap_or_else(|_| lead.to_string());
    format!(
        "Analyze this sales lead and provide a 1-10 score with reasoning:\n\n\
         Lead: {}\n\n\
         Consider:\n\
         - Company size and industry match\n\
         - Revenue potential\n\
         - Likelihood of conversion\n\
         - Any red flags\n\n\
         Return as JSON: {{\"score\": number, \"reasoning\": \"string\", \"confidence\": number}}",
        lead_json
    )
}

/// Pull the JSON verdict out of free-form model text
pub fn parse_analysis(text: &str) -> LeadAnalysis {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return LeadAnalysis::unparsed();
    };
    if end < start {
        return LeadAnalysis::unparsed();
    }

    serde_json::from_str(&text[start..=end]).unwrap_or_else(|_| LeadAnalysis::unparsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_embedded_json() {
        let text = "Sure! Here you go:\n{\"score\": 8, \"reasoning\": \"Strong SaaS fit\", \"confidence\": 0.9}\nThanks";
        let analysis = parse_analysis(text);
        assert_eq!(analysis.score, 8.0);
        assert_eq!(analysis.reasoning, "Strong SaaS fit");
        assert_eq!(analysis.confidence, 0.9);
    }

    #[test]
    fn test_parse_falls_back() {
        assert_eq!(parse_analysis("no json here"), LeadAnalysis::unparsed());
        assert_eq!(parse_analysis("} backwards {"), LeadAnalysis::unparsed());
        assert_eq!(parse_analysis("{\"score\": \"high\"}"), LeadAnalysis::unparsed());
    }

    #[test]
    fn test_prompt_embeds_lead() {
        let prompt = analysis_prompt(&json!({"company_name": "AcmeSaaS0"}));
        assert!(prompt.contains("AcmeSaaS0"));
        assert!(prompt.contains("\"score\": number"));
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades() {
        let config = OllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "mistral:latest".to_string(),
            timeout_secs: 2,
        };
        let client = OllamaClient::new(&config).unwrap();

        assert_eq!(client.model(), "mistral:latest");
        assert!(!client.is_available().await);
        let analysis = client.analyze_lead(&json!({"company_name": "Nowhere"})).await;
        assert_eq!(analysis.score, 5.0);
        assert_eq!(analysis.confidence, 0.3);
        assert!(analysis.reasoning.starts_with("AI error:"));
    }
}
