//! Token estimation for providers that omit usage in their responses.

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    fn count_u32(&self, text: &str) -> u32 {
        u32::try_from(self.count(text)).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: f64,
}

impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4.0)
    }
    pub fn with_ratio(r: f64) -> Self {
        Self { chars_per_token: r }
    }
}

impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharacterEstimator {
    fn count(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_estimate() {
        let c = CharacterEstimator::new();
        assert_eq!(c.count(""), 0);
        assert_eq!(c.count("abcd"), 1);
        assert_eq!(c.count("abcde"), 2);
        // multi-byte characters count once each
        assert_eq!(c.count("ñññññññ"), 2);
    }
}
