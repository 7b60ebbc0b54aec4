//! Per-call generation options.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=100_000;
pub const TOP_P_RANGE: RangeInclusive<f64> = 0.0..=1.0;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Output format hint passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Immutable options for one generation call.
///
/// Only obtainable through [`GenerationOptions::new`] or
/// [`GenerationOptionsBuilder::build`], both of which validate ranges, so a
/// value of this type is always within bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    temperature: f64,
    max_tokens: u32,
    model: Option<String>,
    response_format: Option<ResponseFormat>,
    top_p: f64,
    stop: Vec<String>,
}

impl GenerationOptions {
    pub fn new(temperature: f64, max_tokens: u32) -> Result<Self> {
        Self::builder()
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
    }

    pub fn builder() -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::new()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn response_format(&self) -> Option<ResponseFormat> {
        self.response_format
    }

    pub fn top_p(&self) -> f64 {
        self.top_p
    }

    pub fn stop(&self) -> &[String] {
        &self.stop
    }

    /// A copy of these options with a different format hint.
    ///
    /// Every other field is already validated, so this cannot fail.
    pub fn with_response_format(&self, format: ResponseFormat) -> Self {
        Self {
            response_format: Some(format),
            ..self.clone()
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            model: None,
            response_format: None,
            top_p: 1.0,
            stop: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOptionsBuilder {
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    model: Option<String>,
    response_format: Option<ResponseFormat>,
    top_p: Option<f64>,
    stop: Vec<String>,
}

impl GenerationOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn stop(mut self, sequence: impl Into<String>) -> Self {
        self.stop.push(sequence.into());
        self
    }

    pub fn build(self) -> Result<GenerationOptions> {
        let defaults = GenerationOptions::default();

        let temperature = self.temperature.unwrap_or(defaults.temperature);
        if !temperature.is_finite() || !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(Error::invalid_option(
                "temperature",
                format!("{} is outside [0, 2]", temperature),
            ));
        }

        let max_tokens = self.max_tokens.unwrap_or(defaults.max_tokens);
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(Error::invalid_option(
                "max_tokens",
                format!("{} is outside [1, 100000]", max_tokens),
            ));
        }

        let top_p = self.top_p.unwrap_or(defaults.top_p);
        if !top_p.is_finite() || !TOP_P_RANGE.contains(&top_p) {
            return Err(Error::invalid_option(
                "top_p",
                format!("{} is outside [0, 1]", top_p),
            ));
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(Error::invalid_option("model", "model override is empty"));
            }
        }

        Ok(GenerationOptions {
            temperature,
            max_tokens,
            model: self.model,
            response_format: self.response_format,
            top_p,
            stop: self.stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_accepted() {
        for (t, m) in [(0.0, 1), (2.0, 100_000), (0.7, 4096), (1.999, 2)] {
            let opts = GenerationOptions::new(t, m).unwrap();
            assert_eq!(opts.temperature(), t);
            assert_eq!(opts.max_tokens(), m);
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        for (t, m) in [(-0.01, 10), (2.01, 10), (0.5, 0), (0.5, 100_001), (f64::NAN, 10)] {
            let err = GenerationOptions::new(t, m).unwrap_err();
            assert!(matches!(err, Error::InvalidOptions { .. }), "({t}, {m}) -> {err}");
        }
    }

    #[test]
    fn test_top_p_and_model_validation() {
        assert!(GenerationOptions::builder().top_p(1.5).build().is_err());
        assert!(GenerationOptions::builder().top_p(-0.1).build().is_err());
        assert!(GenerationOptions::builder().model("  ").build().is_err());

        let opts = GenerationOptions::builder()
            .top_p(0.9)
            .model("deepseek-chat")
            .stop("###")
            .response_format(ResponseFormat::Json)
            .build()
            .unwrap();
        assert_eq!(opts.top_p(), 0.9);
        assert_eq!(opts.model(), Some("deepseek-chat"));
        assert_eq!(opts.stop(), ["###".to_string()]);
        assert_eq!(opts.response_format(), Some(ResponseFormat::Json));
    }

    #[test]
    fn test_with_response_format_leaves_original_untouched() {
        let opts = GenerationOptions::new(0.3, 500).unwrap();
        let json = opts.with_response_format(ResponseFormat::Json);
        assert_eq!(opts.response_format(), None);
        assert_eq!(json.response_format(), Some(ResponseFormat::Json));
        assert_eq!(json.max_tokens(), 500);
    }
}
