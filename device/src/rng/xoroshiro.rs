//! xoroshiro128+ random number generator
//!
//! Fast, non-cryptographic PRNG with 128 bits of state and a period of
//! 2^128 - 1.
//!
//! # Algorithm
//!
//! Each step returns the wrapping sum of the two state words, then mixes the
//! state with a xor/shift/rotate recurrence (rotation constants 24 and 37,
//! shift 16).
//!
//! # Jumping
//!
//! [`Xoroshiro128Plus::jump`] advances the state by 2^64 steps and
//! [`Xoroshiro128Plus::long_jump`] by 2^96 steps, both in constant time.
//! Starting every consumer after a jump gives each one a sub-stream that
//! cannot overlap with any other for 2^64 words.
//!
//! The jump polynomials below are tied to these exact rotation constants.
//! Changing either breaks the non-overlap guarantee.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Jump polynomial for an advance of 2^64 steps.
const JUMP: [u64; 2] = [0xdf90_0294_d8f5_54a5, 0x1708_65df_4b32_01fc];

/// Jump polynomial for an advance of 2^96 steps.
const LONG_JUMP: [u64; 2] = [0xd2a9_8b26_625e_ee7b, 0xdddf_9b10_90aa_7ac1];

/// Errors raised when seeding the generator
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SeedError {
    #[error("Invalid seed: state words must not both be zero")]
    AllZero,
}

/// Raw 128-bit generator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorState {
    pub s0: u64,
    pub s1: u64,
}

impl GeneratorState {
    fn check(self) -> Result<Self, SeedError> {
        if self.s0 == 0 && self.s1 == 0 {
            Err(SeedError::AllZero)
        } else {
            Ok(self)
        }
    }
}

/// xoroshiro128+ generator
///
/// # Example
/// ```
/// use xoroshiro_device::Xoroshiro128Plus;
///
/// let mut rng = Xoroshiro128Plus::seed(314159265, 1618033989).unwrap();
/// assert_eq!(rng.next(), 314159265 + 1618033989);
///
/// rng.jump();
/// let word = rng.next();
/// # let _ = word;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeneratorState", into = "GeneratorState")]
pub struct Xoroshiro128Plus {
    state: GeneratorState,
}

impl Xoroshiro128Plus {
    /// Create a generator whose state is exactly `(s0, s1)`
    ///
    /// # Errors
    /// Returns [`SeedError::AllZero`] for `(0, 0)`, the one state the
    /// recurrence never leaves.
    pub fn seed(s0: u64, s1: u64) -> Result<Self, SeedError> {
        Self::from_state(GeneratorState { s0, s1 })
    }

    /// Restore a generator from a previously captured state
    pub fn from_state(state: GeneratorState) -> Result<Self, SeedError> {
        Ok(Self {
            state: state.check()?,
        })
    }

    /// Overwrite the state with `(s0, s1)`
    ///
    /// The current state is left untouched when the seed is rejected.
    pub fn reseed(&mut self, s0: u64, s1: u64) -> Result<(), SeedError> {
        self.state = GeneratorState { s0, s1 }.check()?;
        Ok(())
    }

    /// Current state (for inspection and replay)
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Generate the next 64-bit word and advance the state
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        let s0 = self.state.s0;
        let mut s1 = self.state.s1;
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state.s0 = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state.s1 = s1.rotate_left(37);

        result
    }

    /// Advance the state by 2^64 steps
    ///
    /// Equivalent to calling [`next`](Self::next) 2^64 times and discarding
    /// the output.
    pub fn jump(&mut self) {
        self.apply_polynomial(&JUMP);
    }

    /// Advance the state by 2^96 steps
    ///
    /// Equivalent to 2^32 calls to [`jump`](Self::jump).
    pub fn long_jump(&mut self) {
        self.apply_polynomial(&LONG_JUMP);
    }

    fn apply_polynomial(&mut self, polynomial: &[u64; 2]) {
        let mut s0 = 0u64;
        let mut s1 = 0u64;

        for coefficients in polynomial {
            for bit in 0..64 {
                if coefficients & (1u64 << bit) != 0 {
                    s0 ^= self.state.s0;
                    s1 ^= self.state.s1;
                }
                self.next();
            }
        }

        self.state = GeneratorState { s0, s1 };
    }
}

impl TryFrom<GeneratorState> for Xoroshiro128Plus {
    type Error = SeedError;

    fn try_from(state: GeneratorState) -> Result<Self, Self::Error> {
        Self::from_state(state)
    }
}

impl From<Xoroshiro128Plus> for GeneratorState {
    fn from(rng: Xoroshiro128Plus) -> Self {
        rng.state
    }
}
