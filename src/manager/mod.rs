//! Ordered provider fallback.
//!
//! One [`ProviderManager`] exists per generation kind ([`TextManager`],
//! [`SpeechManager`]). A call:
//!
//! 1. fails fast with [`Error::GenerationDisabled`] when switched off;
//! 2. builds the candidate list from the configured priority order, keeping
//!    registered providers whose `is_available()` is true (duplicates are
//!    removed by [`ProviderId`]); an empty list is
//!    [`Error::NoProvidersAvailable`];
//! 3. tries candidates one at a time, never concurrently, returning on the
//!    first success;
//! 4. records every classified failure and moves on;
//! 5. raises [`Error::AllProvidersFailed`] with the ordered failures once
//!    all candidates are exhausted.
//!
//! The manager keeps no state besides its registry and does no persistence.
//! Dropping the returned future abandons the in-flight provider call; the
//! provider's own timeout bounds it.

mod outcome;

pub use outcome::{Fallback, ProviderFailure};

use crate::provider::{GenerationKind, Provider, ProviderId, SpeechProvider, TextProvider};
use crate::types::{
    GenerationOptions, GenerationResult, SpeechOptions, SpeechResult, StructuredResult,
};
use crate::{Error, Result};
use arc_swap::ArcSwap;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

pub type TextManager = ProviderManager<dyn TextProvider>;
pub type SpeechManager = ProviderManager<dyn SpeechProvider>;

type Registry<P> = Vec<(ProviderId, Arc<P>)>;

pub struct ProviderManager<P: ?Sized> {
    kind: GenerationKind,
    enabled: bool,
    priority: Vec<ProviderId>,
    registry: ArcSwap<Registry<P>>,
}

impl<P: ?Sized + Provider> ProviderManager<P> {
    /// `priority` is the attempt order (primary first). When empty, providers
    /// are tried in registration order.
    pub fn new(kind: GenerationKind, enabled: bool, priority: Vec<ProviderId>) -> Self {
        let mut seen = HashSet::new();
        let priority = priority
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self {
            kind,
            enabled,
            priority,
            registry: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Primary plus optional fallback, the common two-provider setup.
    pub fn with_primary(
        kind: GenerationKind,
        enabled: bool,
        primary: impl Into<ProviderId>,
        fallback: Option<ProviderId>,
    ) -> Self {
        let mut priority = vec![primary.into()];
        priority.extend(fallback);
        Self::new(kind, enabled, priority)
    }

    /// Insert or replace the provider registered under `id`.
    pub fn register_provider(&self, id: impl Into<ProviderId>, provider: Arc<P>) {
        let id = id.into();
        tracing::debug!(kind = %self.kind, provider = %id, "registering provider");
        self.registry.rcu(|current| {
            let mut next: Registry<P> = current.iter().cloned().collect();
            match next.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => slot.1 = Arc::clone(&provider),
                None => next.push((id.clone(), Arc::clone(&provider))),
            }
            next
        });
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn priority(&self) -> &[ProviderId] {
        &self.priority
    }

    pub fn registered(&self) -> Vec<ProviderId> {
        self.registry.load().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn provider(&self, id: &ProviderId) -> Option<Arc<P>> {
        self.registry
            .load()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, p)| Arc::clone(p))
    }

    /// Providers that would be attempted right now, in order.
    pub fn candidates(&self) -> Vec<(ProviderId, Arc<P>)> {
        let registry = self.registry.load();
        let ordered: Vec<(ProviderId, Arc<P>)> = if self.priority.is_empty() {
            registry.iter().cloned().collect()
        } else {
            self.priority
                .iter()
                .filter_map(|id| {
                    registry
                        .iter()
                        .find(|(existing, _)| existing == id)
                        .cloned()
                })
                .collect()
        };
        ordered
            .into_iter()
            .filter(|(id, provider)| {
                let available = provider.is_available();
                if !available {
                    tracing::debug!(kind = %self.kind, provider = %id, "provider unavailable, skipping");
                }
                available
            })
            .collect()
    }

    async fn run<'a, T>(
        &self,
        operation: &'static str,
        mut call: impl FnMut(Arc<P>) -> BoxFuture<'a, std::result::Result<T, crate::provider::ProviderError>>,
    ) -> Result<Fallback<T>> {
        if !self.enabled {
            tracing::warn!(kind = %self.kind, operation, "generation disabled by configuration");
            return Err(Error::GenerationDisabled { kind: self.kind });
        }

        let candidates = self.candidates();
        if candidates.is_empty() {
            tracing::error!(kind = %self.kind, operation, "no providers available");
            return Err(Error::NoProvidersAvailable { kind: self.kind });
        }

        let mut failures = Vec::new();
        for (id, provider) in candidates {
            let name = provider.name().to_string();
            let started = Instant::now();
            tracing::debug!(kind = %self.kind, provider = %id, operation, "attempting provider");

            match call(provider).await {
                Ok(value) => {
                    tracing::info!(
                        kind = %self.kind,
                        provider = %id,
                        operation,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        failed_before = failures.len(),
                        "provider call succeeded"
                    );
                    return Ok(Fallback {
                        value,
                        provider_id: id,
                        failures,
                    });
                }
                Err(error) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::warn!(
                        kind = %self.kind,
                        provider = %id,
                        operation,
                        code = %error.code(),
                        elapsed_ms,
                        %error,
                        "provider call failed"
                    );
                    failures.push(ProviderFailure {
                        provider_id: id,
                        provider: name,
                        error,
                        elapsed_ms,
                    });
                }
            }
        }

        tracing::error!(
            kind = %self.kind,
            operation,
            attempts = failures.len(),
            "all providers failed"
        );
        Err(Error::AllProvidersFailed {
            kind: self.kind,
            failures,
        })
    }
}

impl ProviderManager<dyn TextProvider> {
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Fallback<GenerationResult>> {
        self.run("generate", move |p| {
            async move { p.generate(prompt, options).await }.boxed()
        })
        .await
    }

    pub async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        options: &GenerationOptions,
    ) -> Result<Fallback<StructuredResult>> {
        self.run("generate_structured", move |p| {
            async move { p.generate_structured(prompt, schema, options).await }.boxed()
        })
        .await
    }

    pub async fn generate_batch(
        &self,
        prompts: &[String],
        options: &GenerationOptions,
    ) -> Result<Fallback<Vec<GenerationResult>>> {
        self.run("generate_batch", move |p| {
            async move { p.generate_batch(prompts, options).await }.boxed()
        })
        .await
    }
}

impl ProviderManager<dyn SpeechProvider> {
    pub async fn synthesize(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> Result<Fallback<SpeechResult>> {
        self.run("synthesize", move |p| {
            async move { p.synthesize(text, options).await }.boxed()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use crate::types::TokenUsage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Stub {
        name: &'static str,
        available: bool,
        fail: bool,
        calls: AtomicUsize,
    }

    impl Stub {
        fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, available: true, fail: false, calls: AtomicUsize::new(0) })
        }
        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, available: true, fail: true, calls: AtomicUsize::new(0) })
        }
        fn offline(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, available: false, fail: false, calls: AtomicUsize::new(0) })
        }
    }

    impl Provider for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn default_model(&self) -> &str {
            "stub-model"
        }
        fn is_available(&self) -> bool {
            self.available
        }
    }

    #[async_trait]
    impl TextProvider for Stub {
        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> std::result::Result<GenerationResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::timeout(self.name, "upstream timed out"));
            }
            Ok(GenerationResult {
                content: format!("{}:{}", self.name, prompt),
                usage: TokenUsage::unpriced(1, 1),
                model: "stub-model".into(),
                provider: self.name.into(),
                latency_ms: 1,
                raw: None,
            })
        }
    }

    fn manager(priority: &[&str]) -> TextManager {
        TextManager::new(
            GenerationKind::Text,
            true,
            priority.iter().map(|s| ProviderId::new(s)).collect(),
        )
    }

    #[tokio::test]
    async fn test_register_is_upsert_by_id() {
        let m = manager(&["a"]);
        m.register_provider("a", Stub::failing("first"));
        m.register_provider("A", Stub::ok("second"));
        assert_eq!(m.registered(), vec![ProviderId::new("a")]);

        let out = m.generate("x", &GenerationOptions::default()).await.unwrap();
        assert_eq!(out.value.provider, "second");
    }

    #[tokio::test]
    async fn test_first_success_stops() {
        let m = manager(&["a", "b"]);
        let a = Stub::ok("a");
        let b = Stub::ok("b");
        m.register_provider("a", a.clone());
        m.register_provider("b", b.clone());

        let out = m.generate("hi", &GenerationOptions::default()).await.unwrap();
        assert_eq!(out.provider_id.as_str(), "a");
        assert!(!out.used_fallback());
        assert_eq!(b.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_primary_is_skipped_without_a_call() {
        let m = manager(&["a", "b"]);
        let a = Stub::offline("a");
        m.register_provider("a", a.clone());
        m.register_provider("b", Stub::ok("b"));

        let out = m.generate("hi", &GenerationOptions::default()).await.unwrap();
        assert_eq!(out.provider_id.as_str(), "b");
        assert!(out.failures.is_empty());
        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_priority_entries_are_tried_once() {
        let m = manager(&["a", "A", "a"]);
        let a = Stub::failing("a");
        m.register_provider("a", a.clone());

        let err = m.generate("hi", &GenerationOptions::default()).await.unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_contacts_nobody() {
        let m = TextManager::new(GenerationKind::Text, false, vec![ProviderId::new("a")]);
        let a = Stub::ok("a");
        m.register_provider("a", a.clone());
        let err = m.generate("hi", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::GenerationDisabled { .. }));
        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let m = manager(&["a"]);
        m.register_provider("b", Stub::ok("b"));
        let err = m.generate("hi", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::NoProvidersAvailable { kind: GenerationKind::Text }));
    }

    #[tokio::test]
    async fn test_registration_order_without_priority() {
        let m = manager(&[]);
        m.register_provider("z", Stub::failing("z"));
        m.register_provider("y", Stub::ok("y"));
        let out = m.generate("hi", &GenerationOptions::default()).await.unwrap();
        assert_eq!(out.provider_id.as_str(), "y");
        assert_eq!(out.failures[0].provider_id.as_str(), "z");
    }
}
