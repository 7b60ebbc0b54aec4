//! Orchestrator configuration.
//!
//! Loaded from YAML. `${VAR}` and `${VAR:-default}` placeholders inside
//! string values are expanded from the process environment after parsing,
//! so expanded text is never read as YAML. A value that is exactly one
//! placeholder and expands to a number or boolean takes that type. A small
//! set of `AI_*` environment variables then override individual fields:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `AI_GENERATION_ENABLED` | `generation_enabled` |
//! | `AI_QUOTA_PER_REQUEST_LIMIT` | `quota.per_request_limit` |
//! | `AI_QUOTA_DAILY_LIMIT` | `quota.daily_limit` |
//! | `AI_CACHE_TTL_SECS` | `cache.default_ttl_secs` |
//!
//! ```yaml
//! generation_enabled: true
//! text:
//!   primary: deepseek
//!   fallback: gemini
//! speech:
//!   priority: [azure]
//! quota:
//!   per_request_limit: 20
//!   daily_limit: 100
//! providers:
//!   deepseek:
//!     kind: openai_compat
//!     base_url: https://api.deepseek.com
//!     model: deepseek-chat
//!     api_key: ${DEEPSEEK_API_KEY}
//!   azure:
//!     kind: openai_speech
//!     base_url: https://{region}.tts.example.com/v1
//!     region: westeurope
//!     voice: jenny
//! ```

use crate::cache::CacheConfig;
use crate::provider::{GenerationKind, ProviderId};
use crate::resilience::RateLimiterConfig;
use crate::tokens::{CharacterPricing, ModelPricing};
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use regex::{Captures, Regex};
use serde_yaml::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Keyring service under which provider API keys are looked up.
pub const KEYRING_SERVICE: &str = "ai-gen-orchestrator";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_true")]
    pub generation_enabled: bool,
    #[serde(default)]
    pub text: ProviderSelection,
    #[serde(default)]
    pub speech: ProviderSelection,
    #[serde(default)]
    pub quota: RateLimiterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: BTreeMap<ProviderId, ProviderSettings>,
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            generation_enabled: true,
            text: ProviderSelection::default(),
            speech: ProviderSelection::default(),
            quota: RateLimiterConfig::default(),
            cache: CacheConfig::default(),
            providers: BTreeMap::new(),
        }
    }
}

/// Which providers a manager tries, in order.
///
/// A non-empty `priority` list wins; otherwise `primary` then `fallback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    #[serde(default)]
    pub primary: Option<ProviderId>,
    #[serde(default)]
    pub fallback: Option<ProviderId>,
    #[serde(default)]
    pub priority: Vec<ProviderId>,
}

impl ProviderSelection {
    pub fn order(&self) -> Vec<ProviderId> {
        if !self.priority.is_empty() {
            return self.priority.clone();
        }
        self.primary
            .iter()
            .chain(self.fallback.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Chat-completions text endpoint.
    OpenaiCompat,
    /// `/audio/speech` endpoint.
    OpenaiSpeech,
}

impl ProviderKind {
    pub fn generation_kind(&self) -> GenerationKind {
        match self {
            Self::OpenaiCompat => GenerationKind::Text,
            Self::OpenaiSpeech => GenerationKind::Speech,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub input_cost_per_million: Option<f64>,
    #[serde(default)]
    pub output_cost_per_million: Option<f64>,
    #[serde(default)]
    pub cost_per_million_chars: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the key; defaults to `<ID>_API_KEY`.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Substituted for `{region}` in `base_url`.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub pricing: Option<PricingSettings>,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            api_key_env: None,
            base_url: None,
            region: None,
            model: None,
            voice: None,
            timeout_secs: None,
            pricing: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// `base_url` with `{region}` filled in and checked to be an absolute URL.
    pub fn resolved_base_url(&self, id: &ProviderId) -> Result<Option<String>> {
        let Some(raw) = self.base_url.as_deref() else {
            return Ok(None);
        };
        let field = format!("providers.{}.base_url", id);
        let resolved = if raw.contains("{region}") {
            let region = self.region.as_deref().ok_or_else(|| {
                Error::configuration_with_context(
                    "base_url uses {region} but no region is set",
                    ErrorContext::new().with_field_path(field.clone()),
                )
            })?;
            raw.replace("{region}", region)
        } else {
            raw.to_string()
        };
        url::Url::parse(&resolved).map_err(|e| {
            Error::configuration_with_context(
                "invalid provider base_url",
                ErrorContext::new()
                    .with_field_path(field)
                    .with_details(format!("{}: {}", resolved, e)),
            )
        })?;
        Ok(Some(resolved.trim_end_matches('/').to_string()))
    }

    /// Explicit key, then the OS keyring, then the environment.
    pub fn resolve_api_key(&self, id: &ProviderId) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, id.as_str()) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }
        let var = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| format!("{}_API_KEY", id.as_str().to_uppercase().replace('-', "_")));
        std::env::var(var).ok().filter(|k| !k.is_empty())
    }

    /// Token prices for text providers; known models fall back to presets.
    pub fn model_pricing(&self, model: &str) -> ModelPricing {
        match &self.pricing {
            Some(PricingSettings {
                input_cost_per_million: Some(input),
                output_cost_per_million: Some(output),
                ..
            }) => ModelPricing::new(model, *input, *output),
            _ => ModelPricing::for_model(model).unwrap_or_else(|| ModelPricing::free(model)),
        }
    }

    pub fn character_pricing(&self) -> CharacterPricing {
        self.pricing
            .as_ref()
            .and_then(|p| p.cost_per_million_chars)
            .map(CharacterPricing::new)
            .unwrap_or_else(CharacterPricing::openai_tts)
    }
}

impl OrchestratorConfig {
    /// Read, expand, override from the environment, validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read configuration: {}", e),
                ErrorContext::new()
                    .with_source("config_loader")
                    .with_details(path.display().to_string()),
            )
        })?;
        let mut cfg = Self::from_yaml_str(&raw)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        tracing::info!(
            path = %path.display(),
            providers = cfg.providers.len(),
            generation_enabled = cfg.generation_enabled,
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Parse YAML, then expand `${VAR}` in string values. Does not apply
    /// `AI_*` overrides.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut doc: Value = serde_yaml::from_str(yaml)?;
        let pattern = placeholder_pattern()?;
        let mut missing = Vec::new();
        expand_tree(&mut doc, &pattern, &mut missing);
        check_missing(missing)?;
        let cfg: Self = serde_yaml::from_value(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(enabled) = env_flag("AI_GENERATION_ENABLED") {
            self.generation_enabled = enabled;
        }
        if let Some(v) = env_parse("AI_QUOTA_PER_REQUEST_LIMIT") {
            self.quota.per_request_limit = v;
        }
        if let Some(v) = env_parse("AI_QUOTA_DAILY_LIMIT") {
            self.quota.daily_limit = v;
        }
        if let Some(secs) = env_parse::<f64>("AI_CACHE_TTL_SECS") {
            match Duration::try_from_secs_f64(secs) {
                Ok(ttl) => self.cache.ttl = ttl,
                Err(e) => tracing::warn!(value = secs, error = %e, "ignoring AI_CACHE_TTL_SECS"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quota.per_request_limit == 0 {
            return Err(Error::configuration_with_context(
                "per_request_limit must be at least 1",
                ErrorContext::new().with_field_path("quota.per_request_limit"),
            ));
        }
        if self.cache.enabled && self.cache.ttl.is_zero() {
            return Err(Error::configuration_with_context(
                "cache ttl must be positive",
                ErrorContext::new().with_field_path("cache.default_ttl_secs"),
            ));
        }
        for (id, settings) in &self.providers {
            settings.resolved_base_url(id)?;
        }
        for (kind, selection, path) in [
            (GenerationKind::Text, &self.text, "text"),
            (GenerationKind::Speech, &self.speech, "speech"),
        ] {
            for id in selection.order() {
                if let Some(settings) = self.providers.get(&id) {
                    if settings.kind.generation_kind() != kind {
                        return Err(Error::configuration_with_context(
                            format!("provider '{}' cannot serve {} generation", id, kind),
                            ErrorContext::new().with_field_path(path),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Replace `${VAR}` / `${VAR:-default}` with environment values.
///
/// An unset variable without a default is a configuration error.
pub fn expand_env(input: &str) -> Result<String> {
    let pattern = placeholder_pattern()?;
    let mut missing = Vec::new();
    let expanded = substitute(input, &pattern, &mut missing);
    check_missing(missing)?;
    Ok(expanded)
}

fn placeholder_pattern() -> Result<Regex> {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .map_err(|e| Error::configuration(format!("placeholder pattern: {}", e)))
}

fn substitute(input: &str, pattern: &Regex, missing: &mut Vec<String>) -> String {
    pattern
        .replace_all(input, |caps: &Captures| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(v) => v,
                Err(_) => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => {
                        missing.push(name.to_string());
                        String::new()
                    }
                },
            }
        })
        .into_owned()
}

fn check_missing(missing: Vec<String>) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(Error::configuration_with_context(
        "unset environment variables in configuration",
        ErrorContext::new()
            .with_source("config_loader")
            .with_details(missing.join(", ")),
    ))
}

/// Expand placeholders in string scalars. Mapping keys are left alone.
fn expand_tree(node: &mut Value, pattern: &Regex, missing: &mut Vec<String>) {
    match node {
        Value::String(raw) => {
            let Some(whole) = pattern.find(raw) else {
                return;
            };
            let standalone = whole.start() == 0 && whole.end() == raw.len();
            let expanded = substitute(raw, pattern, missing);
            *node = if standalone {
                typed_scalar(expanded)
            } else {
                Value::String(expanded)
            };
        }
        Value::Sequence(items) => {
            for item in items {
                expand_tree(item, pattern, missing);
            }
        }
        Value::Mapping(map) => {
            for value in map.values_mut() {
                expand_tree(value, pattern, missing);
            }
        }
        Value::Tagged(tagged) => expand_tree(&mut tagged.value, pattern, missing),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn typed_scalar(text: String) -> Value {
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<u64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() && text.contains('.') => Value::Number(n.into()),
        _ => Value::String(text),
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(variable = name, value = other, "ignoring unrecognised boolean");
            None
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparsable override");
            None
        }
    }
}
