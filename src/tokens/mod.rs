//! Token estimation and cost calculation.
//!
//! Every provider carries a [`ModelPricing`] (text, per million tokens) or a
//! [`CharacterPricing`] (speech, per million characters). Costs are derived
//! deterministically from these tables once a call has returned.
//!
//! ```rust
//! use ai_gen_orchestrator::tokens::ModelPricing;
//!
//! let pricing = ModelPricing::new("deepseek-chat", 0.14, 0.28);
//! let estimate = pricing.calculate_cost(1_000_000, 1_000_000);
//! assert!((estimate.total_cost - 0.42).abs() < 1e-9);
//! ```

mod counter;
mod pricing;

pub use counter::{CharacterEstimator, TokenCounter};
pub use pricing::{CharacterPricing, CostEstimate, ModelPricing};
