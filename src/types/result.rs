//! Results returned by text providers.

use crate::tokens::ModelPricing;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Token accounting for one successful call.
///
/// `total_tokens` is always `prompt_tokens + completion_tokens`; the fields
/// are private so that cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
    estimated_cost_usd: f64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, pricing: &ModelPricing) -> Self {
        let cost = pricing.calculate_cost(prompt_tokens, completion_tokens);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            estimated_cost_usd: cost.total_cost,
        }
    }

    /// Usage for a provider without a pricing entry.
    pub fn unpriced(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            estimated_cost_usd: 0.0,
        }
    }

    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    pub fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }

    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }

    pub fn estimated_cost_usd(&self) -> f64 {
        self.estimated_cost_usd
    }
}

/// Output of a successful text generation. Consumed by the caller; only a
/// summary of it reaches the usage log.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub provider: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// A schema-validated JSON value plus the call it came from.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredResult {
    pub value: serde_json::Value,
    pub result: GenerationResult,
}

impl StructuredResult {
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum() {
        let usage = TokenUsage::unpriced(120, 30);
        assert_eq!(usage.total_tokens(), 150);
        assert_eq!(usage.estimated_cost_usd(), 0.0);
    }

    #[test]
    fn test_cost_per_million() {
        let pricing = ModelPricing::new("deepseek-chat", 0.14, 0.28);
        let usage = TokenUsage::new(1_000_000, 1_000_000, &pricing);
        assert!((usage.estimated_cost_usd() - 0.42).abs() < 1e-9);
        assert_eq!(usage.total_tokens(), 2_000_000);
    }

    #[test]
    fn test_structured_parse() {
        #[derive(Deserialize)]
        struct Quiz {
            question: String,
        }
        let result = StructuredResult {
            value: serde_json::json!({"question": "2+2?"}),
            result: GenerationResult {
                content: "{\"question\":\"2+2?\"}".into(),
                usage: TokenUsage::unpriced(1, 1),
                model: "m".into(),
                provider: "p".into(),
                latency_ms: 3,
                raw: None,
            },
        };
        let quiz: Quiz = result.parse().unwrap();
        assert_eq!(quiz.question, "2+2?");
    }
}
