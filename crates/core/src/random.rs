use crate::{RngState, MAX_SELECTION};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PickError {
    #[error("invalid state: a pick needs between 1 and {max} candidates, got {len}")]
    InvalidState { len: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropySource {
    Strong,
    Fallback,
}

/// Uniform choice over a bounded candidate list.
///
/// The strong source draws a 32-bit value and reduces it modulo the length.
/// When it is absent or fails, a seeded generator produces a float in `[0, 1)`
/// that is scaled and floored instead. A strong source that fails once is not
/// retried.
pub struct RandomSelector {
    strong: Option<Box<dyn RngCore + Send>>,
    fallback: RngState,
    last_source: Option<EntropySource>,
}

impl fmt::Debug for RandomSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSelector")
            .field("strong", &self.strong.is_some())
            .field("fallback_seed", &self.fallback.seed())
            .field("last_source", &self.last_source)
            .finish()
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSelector {
    /// OS entropy, with a clock-seeded fallback.
    pub fn new() -> Self {
        Self::with_strong(Box::new(OsRng), RngState::from_clock())
    }

    pub fn with_strong(strong: Box<dyn RngCore + Send>, fallback: RngState) -> Self {
        Self {
            strong: Some(strong),
            fallback,
            last_source: None,
        }
    }

    /// Deterministic selector without a strong source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            strong: None,
            fallback: RngState::from_seed(seed),
            last_source: None,
        }
    }

    pub fn last_source(&self) -> Option<EntropySource> {
        self.last_source
    }

    pub fn pick_index(&mut self, len: usize) -> Result<usize, PickError> {
        if !(1..=MAX_SELECTION).contains(&len) {
            return Err(PickError::InvalidState {
                len,
                max: MAX_SELECTION,
            });
        }
        if let Some(strong) = self.strong.as_mut() {
            let mut buf = [0u8; 4];
            match strong.try_fill_bytes(&mut buf) {
                Ok(()) => {
                    self.last_source = Some(EntropySource::Strong);
                    return Ok(u32::from_le_bytes(buf) as usize % len);
                }
                Err(err) => {
                    warn!(error = %err, "strong random source unavailable, switching to fallback");
                    self.strong = None;
                }
            }
        }
        self.last_source = Some(EntropySource::Fallback);
        let scaled = (self.fallback.next_f64() * len as f64).floor() as usize;
        Ok(scaled.min(len - 1))
    }

    pub fn pick<'a, T>(&mut self, pool: &'a [T]) -> Result<&'a T, PickError> {
        let index = self.pick_index(pool.len())?;
        Ok(&pool[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    struct DeadSource;

    impl RngCore for DeadSource {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no entropy device",
            )))
        }
    }

    // Upper tail of chi-square with 9 degrees of freedom at p = 0.0001.
    const CHI_SQUARE_9_DF: f64 = 33.72;

    fn chi_square(counts: &[usize], trials: usize) -> f64 {
        let expected = trials as f64 / counts.len() as f64;
        counts
            .iter()
            .map(|&count| {
                let diff = count as f64 - expected;
                diff * diff / expected
            })
            .sum()
    }

    fn sample(selector: &mut RandomSelector, n: usize, trials: usize) -> Vec<usize> {
        let pool: Vec<usize> = (0..n).collect();
        let mut counts = vec![0usize; n];
        for _ in 0..trials {
            let picked = selector.pick(&pool).expect("valid pool");
            counts[*picked] += 1;
        }
        counts
    }

    #[test]
    fn empty_pool_is_invalid_state() {
        let mut selector = RandomSelector::seeded(1);
        let empty: [u8; 0] = [];
        assert_eq!(
            selector.pick(&empty),
            Err(PickError::InvalidState { len: 0, max: 10 })
        );
        assert_eq!(selector.last_source(), None);
    }

    #[test]
    fn oversized_pool_is_invalid_state() {
        let mut selector = RandomSelector::seeded(1);
        let pool: Vec<u8> = (0..11).collect();
        assert!(matches!(
            selector.pick(&pool),
            Err(PickError::InvalidState { len: 11, .. })
        ));
    }

    #[test]
    fn strong_source_reduces_modulo_length() {
        let mut selector =
            RandomSelector::with_strong(Box::new(StepRng::new(7, 0)), RngState::from_seed(0));
        let pool = ["a", "b", "c"];
        assert_eq!(selector.pick(&pool), Ok(&"b"));
        assert_eq!(selector.last_source(), Some(EntropySource::Strong));
    }

    #[test]
    fn failing_strong_source_falls_back() {
        let mut selector = RandomSelector::with_strong(Box::new(DeadSource), RngState::from_seed(3));
        let pool = ["a", "b", "c"];
        assert!(selector.pick(&pool).is_ok());
        assert_eq!(selector.last_source(), Some(EntropySource::Fallback));
        assert!(selector.pick(&pool).is_ok());
        assert_eq!(selector.last_source(), Some(EntropySource::Fallback));
    }

    #[test]
    fn fallback_is_uniform_over_ten() {
        let trials = 20_000;
        let counts = sample(&mut RandomSelector::seeded(0xC0FFEE), 10, trials);
        assert!(chi_square(&counts, trials) < CHI_SQUARE_9_DF, "{counts:?}");
    }

    #[test]
    fn strong_source_is_uniform_over_ten() {
        let trials = 20_000;
        let counts = sample(&mut RandomSelector::new(), 10, trials);
        assert!(chi_square(&counts, trials) < CHI_SQUARE_9_DF, "{counts:?}");
    }

    #[test]
    fn single_candidate_always_wins() {
        let mut selector = RandomSelector::new();
        for _ in 0..50 {
            assert_eq!(selector.pick(&["only"]), Ok(&"only"));
        }
    }
}
