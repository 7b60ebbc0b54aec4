use crate::provider::{ProviderError, ProviderId};

/// One failed attempt inside a manager call.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider_id: ProviderId,
    /// Provider's own display name, as it appears in usage rows.
    pub provider: String,
    pub error: ProviderError,
    pub elapsed_ms: u64,
}

/// Successful manager call.
///
/// Carries the attempts that failed before `provider_id` succeeded so the
/// caller can account for them; the errors themselves never propagate.
#[derive(Debug)]
pub struct Fallback<T> {
    pub value: T,
    pub provider_id: ProviderId,
    pub failures: Vec<ProviderFailure>,
}

impl<T> Fallback<T> {
    pub fn into_inner(self) -> T {
        self.value
    }

    /// True when a provider other than the first candidate served the call.
    pub fn used_fallback(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fallback<U> {
        Fallback {
            value: f(self.value),
            provider_id: self.provider_id,
            failures: self.failures,
        }
    }
}
