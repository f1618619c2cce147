// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! A millisecond-tick clock abstraction and the jitter source used when scheduling
//! confirmable-message retransmissions (§4.4).

use std::time::Instant;

/// A monotonic source of ticks, where one tick is one millisecond. Abstracted so
/// tests can drive retransmission timing deterministically rather than racing the
/// wall clock.
pub trait Clock {
    /// Returns the current tick count. Only relative differences between calls are
    /// meaningful; the absolute value carries no meaning across instances.
    fn now_ticks(&self) -> u64;
}

/// A [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Creates a new clock whose epoch is the moment of construction.
    pub fn new() -> SystemClock {
        SystemClock { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now_ticks(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// A [`Clock`] a test can advance by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: std::cell::Cell<u64>,
}

impl ManualClock {
    /// Creates a new manual clock starting at tick zero.
    pub fn new() -> ManualClock {
        ManualClock { ticks: std::cell::Cell::new(0) }
    }

    /// Advances the clock by `delta` ticks.
    pub fn advance(&self, delta: u64) {
        self.ticks.set(self.ticks.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now_ticks(&self) -> u64 {
        self.ticks.get()
    }
}

/// A seeded pseudo-random source, used only to jitter the initial ACK timeout
/// (§4.4). Wraps [`rand::rngs::SmallRng`], the same generator the teacher crate
/// reaches for in its own retransmission-jitter and stress-test code.
#[derive(Debug, Clone)]
pub struct Prng {
    rng: rand::rngs::SmallRng,
}

impl Prng {
    /// Creates a new generator seeded with `seed` (per §4.6's `new_context`: seeded
    /// from `listen_addr` bits XOR a clock offset).
    pub fn new(seed: u64) -> Prng {
        use rand::SeedableRng;
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Prng {
            rng: rand::rngs::SmallRng::from_seed(bytes),
        }
    }

    /// Returns the next pseudo-random `u64`.
    pub fn next_u64(&mut self) -> u64 {
        use rand::Rng;
        self.rng.gen()
    }

    /// Returns a jittered timeout, per §4.4's `RESPONSE_TIMEOUT_TICKS +
    /// ((RESPONSE_TIMEOUT_TICKS/2) * r/256)` — here generalized to any `base` so
    /// the retransmission scheduler can reuse it for the doubled per-attempt
    /// timeout too.
    pub fn jitter_timeout(&mut self, base: u64) -> u64 {
        use rand::Rng;
        let r: u8 = self.rng.gen();
        base + ((base / 2) * r as u64 / 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ticks(), 0);
        clock.advance(42);
        assert_eq!(clock.now_ticks(), 42);
    }

    #[test]
    fn jitter_stays_in_range() {
        let mut prng = Prng::new(12345);
        for _ in 0..100 {
            let t = prng.jitter_timeout(2000);
            assert!(t >= 2000 && t <= 3000, "{} out of range", t);
        }
    }

    #[test]
    fn zero_seed_is_accepted() {
        let mut prng = Prng::new(0);
        let _ = prng.next_u64();
    }
}
