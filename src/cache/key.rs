//! Content-addressed cache keys for synthesized audio.

use crate::types::AudioFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioCacheKey {
    hash: String,
}

impl AudioCacheKey {
    /// Pure function of its inputs.
    ///
    /// Text is trimmed and lower-cased before hashing so trivially different
    /// requests share one slot. Language and voice are compared exactly.
    pub fn new(text: &str, language: &str, voice: &str, format: AudioFormat) -> Self {
        let normalized = normalize_text(text);
        let mut hasher = Sha256::new();
        // length-prefixed so field boundaries cannot be forged by the text
        for part in [normalized.as_str(), language, voice, format.as_str()] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self { hash }
    }

    /// Wrap an already-computed hash, e.g. one read back from an external store.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for AudioCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_collapses_case_and_padding() {
        assert_eq!(
            AudioCacheKey::new("Hello", "en", "jenny", AudioFormat::Mp3),
            AudioCacheKey::new("  HELLO  ", "en", "jenny", AudioFormat::Mp3)
        );
    }

    #[test]
    fn test_every_parameter_changes_the_key() {
        let base = AudioCacheKey::new("Hello", "en", "jenny", AudioFormat::Mp3);
        assert_ne!(base, AudioCacheKey::new("Hello!", "en", "jenny", AudioFormat::Mp3));
        assert_ne!(base, AudioCacheKey::new("Hello", "es", "jenny", AudioFormat::Mp3));
        assert_ne!(base, AudioCacheKey::new("Hello", "en", "guy", AudioFormat::Mp3));
        assert_ne!(base, AudioCacheKey::new("Hello", "en", "jenny", AudioFormat::Wav));
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = AudioCacheKey::new("a", "en", "v", AudioFormat::Mp3);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        assert_ne!(
            AudioCacheKey::new("ab", "c", "v", AudioFormat::Mp3),
            AudioCacheKey::new("a", "bc", "v", AudioFormat::Mp3)
        );
    }
}
