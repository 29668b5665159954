//! Deterministic random number generation.
//!
//! RULE: Nothing in the pipeline may call any platform RNG.
//! All randomness flows through SeedRng instances derived
//! from the single master seed of a generation run.
//!
//! Each (stream slot, client index) pair gets its own RNG stream, seeded
//! deterministically from the master seed. This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each client's records are reproducible in isolation, whether or not
//!     earlier clients in the batch failed.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use uuid::Uuid;

/// A named, deterministic RNG for one stream.
pub struct SeedRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SeedRng {
    /// Create an RNG from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a float uniformly in [lo, hi].
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Roll an integer uniformly in [lo, hi] (inclusive).
    pub fn range_u64(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi >= lo, "empty range {lo}..={hi}");
        lo + self.next_u64_below(hi - lo + 1)
    }

    /// Pick one element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    /// Split 100 % into `parts` shares of one decimal place that sum to
    /// 100.0. Every share is at least 0.1 while `parts <= 1000`.
    pub fn percentage_split(&mut self, parts: usize) -> Vec<f64> {
        if parts == 0 {
            return Vec::new();
        }
        let weights: Vec<f64> = (0..parts).map(|_| 0.5 + self.next_f64()).collect();
        let total: f64 = weights.iter().sum();

        // Work in tenths of a percent: one tenth each, the rest by weight,
        // leftover tenths to the largest remainders.
        let floor_each = usize::from(parts <= TENTHS);
        let spare = TENTHS.saturating_sub(parts * floor_each);
        let exact: Vec<f64> = weights.iter().map(|w| w / total * spare as f64).collect();
        let mut tenths: Vec<usize> = exact.iter().map(|e| floor_each + e.floor() as usize).collect();

        let assigned: usize = tenths.iter().sum();
        let mut by_remainder: Vec<usize> = (0..parts).collect();
        by_remainder.sort_by(|&a, &b| {
            (exact[b] - exact[b].floor()).total_cmp(&(exact[a] - exact[a].floor()))
        });
        for &i in by_remainder.iter().cycle().take(TENTHS.saturating_sub(assigned)) {
            tenths[i] += 1;
        }

        tenths.into_iter().map(|t| t as f64 / 10.0).collect()
    }

    /// A v4-shaped UUID drawn from this stream.
    pub fn next_uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// 100 % in tenths of a percent.
const TENTHS: usize = 1000;

/// All RNG streams for a single generation run.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Stream for one slot and one client index within the batch.
    pub fn for_client(&self, slot: StreamSlot, index: usize) -> SeedRng {
        let stream = ((slot as u64) << 32) | (index as u64 + 1);
        SeedRng::new(self.master_seed, stream).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    RiskPolicy = 0,
    Record = 1,
    Monitoring = 2,
    Persistence = 3,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RiskPolicy => "risk_policy",
            Self::Record => "record",
            Self::Monitoring => "monitoring",
            Self::Persistence => "persistence",
        }
    }
}
