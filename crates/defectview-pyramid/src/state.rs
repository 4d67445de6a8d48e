//! Per-tier generation state packed with its image version
//!
//! A slot holds `version << 2 | state` in one `AtomicU64`, so claiming a tier
//! for generation is a single compare-and-swap on the exact
//! `(version, Absent)` word. A job from an older version can never claim or
//! complete a slot that was reset for a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

const STATE_BITS: u32 = 2;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Generation state of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierState {
    /// No result and no job in flight
    Absent,
    /// A background job owns the tier
    Generating,
    /// A final result is stored
    Ready,
}

impl TierState {
    fn bits(self) -> u64 {
        match self {
            TierState::Absent => 0,
            TierState::Generating => 1,
            TierState::Ready => 2,
        }
    }

    fn from_bits(bits: u64) -> Self {
        match bits & STATE_MASK {
            1 => TierState::Generating,
            2 => TierState::Ready,
            _ => TierState::Absent,
        }
    }
}

#[inline]
fn pack(version: u64, state: TierState) -> u64 {
    (version << STATE_BITS) | state.bits()
}

#[inline]
fn unpack(word: u64) -> (u64, TierState) {
    (word >> STATE_BITS, TierState::from_bits(word))
}

/// Atomic `(version, state)` cell
#[derive(Debug, Default)]
pub struct TierSlot(AtomicU64);

impl TierSlot {
    /// Current version and state.
    pub fn load(&self) -> (u64, TierState) {
        unpack(self.0.load(Ordering::Acquire))
    }

    /// Unconditionally set version and state (used on reset).
    pub fn store(&self, version: u64, state: TierState) {
        self.0.store(pack(version, state), Ordering::Release);
    }

    /// Move `from -> to` for `version`. Fails if the slot holds another
    /// version or another state.
    pub fn transition(&self, version: u64, from: TierState, to: TierState) -> bool {
        self.0
            .compare_exchange(
                pack(version, from),
                pack(version, to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Claim the slot for generation: `Absent -> Generating`.
    pub fn try_begin(&self, version: u64) -> bool {
        self.transition(version, TierState::Absent, TierState::Generating)
    }

    /// State for `version`: a slot still holding an older version reads as
    /// `Absent`.
    pub fn state_for(&self, version: u64) -> TierState {
        match self.load() {
            (v, state) if v == version => state,
            _ => TierState::Absent,
        }
    }
}
