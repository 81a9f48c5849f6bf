//! 🎲 The run's dice.
//!
//! Identifier offsets and synthesized order dates are random by nature. Tests
//! are not. So the randomness lives behind [`RunRng`]: pass a seed and the
//! dice become a script, pass nothing and the wall clock picks one.

use std::time::{SystemTime, UNIX_EPOCH};

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use tracing::debug;

/// 🎲 A seedable random source, scoped to one run.
#[derive(Debug, Clone)]
pub(crate) struct RunRng {
    inner: ChaCha8Rng,
}

impl RunRng {
    /// 🚀 `Some(seed)` is reproducible. `None` mixes the clock with the pid,
    /// which is plenty for ids that only need to be unique inside one run.
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default();
            let unseeded = nanos ^ (u64::from(std::process::id()) << 32);
            debug!(seed = unseeded, "🎲 no seed configured, rolled one from the clock");
            unseeded
        });
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// 🎯 Uniform-ish pick from `lo..=hi`. Modulo bias over a 1000-wide range
    /// is far below anything a sales rollup will notice.
    pub(crate) fn between(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo <= hi, "between({lo}, {hi}) is an empty range");
        let span = u64::from(hi - lo) + 1;
        lo + (u64::from(self.inner.next_u32()) % span) as u32
    }
}
