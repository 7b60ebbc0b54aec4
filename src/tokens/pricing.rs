//! Provider pricing and cost estimation.

use serde::{Deserialize, Serialize};

/// Per-million-token prices for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model: String,
    pub input_cost_per_million: f64,
    pub output_cost_per_million: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".into()
}

impl ModelPricing {
    pub fn new(model: &str, input: f64, output: f64) -> Self {
        Self {
            model: model.into(),
            input_cost_per_million: input,
            output_cost_per_million: output,
            currency: default_currency(),
        }
    }

    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> CostEstimate {
        let ic = (input_tokens as f64 / 1_000_000.0) * self.input_cost_per_million;
        let oc = (output_tokens as f64 / 1_000_000.0) * self.output_cost_per_million;
        CostEstimate {
            model: self.model.clone(),
            input_tokens,
            output_tokens,
            input_cost: ic,
            output_cost: oc,
            total_cost: ic + oc,
            currency: self.currency.clone(),
        }
    }

    pub fn free(model: &str) -> Self {
        Self::new(model, 0.0, 0.0)
    }

    pub fn deepseek_chat() -> Self {
        Self::new("deepseek-chat", 0.14, 0.28)
    }

    pub fn gemini_flash() -> Self {
        Self::new("gemini-1.5-flash", 0.075, 0.30)
    }

    pub fn gpt_4o_mini() -> Self {
        Self::new("gpt-4o-mini", 0.15, 0.60)
    }

    pub fn for_model(model: &str) -> Option<Self> {
        let m = model.to_lowercase();
        if m.contains("deepseek") {
            Some(Self::deepseek_chat())
        } else if m.contains("gemini") && m.contains("flash") {
            Some(Self::gemini_flash())
        } else if m.contains("gpt-4o-mini") {
            Some(Self::gpt_4o_mini())
        } else {
            None
        }
    }
}

/// Per-million-character prices for speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterPricing {
    pub cost_per_million_chars: f64,
}

impl CharacterPricing {
    pub fn new(cost_per_million_chars: f64) -> Self {
        Self {
            cost_per_million_chars,
        }
    }

    pub fn openai_tts() -> Self {
        Self::new(15.0)
    }

    pub fn azure_neural() -> Self {
        Self::new(16.0)
    }

    pub fn calculate_cost(&self, characters: u32) -> f64 {
        (characters as f64 / 1_000_000.0) * self.cost_per_million_chars
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl CostEstimate {
    pub fn format(&self) -> String {
        format!("{} {:.6}", self.currency, self.total_cost)
    }
    pub fn format_detailed(&self) -> String {
        if self.total_cost < 0.01 {
            format!("{:.4}¢", self.total_cost * 100.0)
        } else {
            format!("${:.4}", self.total_cost)
        }
    }
}
