//! Deterministic, jumpable random number generation
//!
//! Uses the xoroshiro128+ algorithm. Every byte the device hands out comes
//! from this module; sessions are separated with [`Xoroshiro128Plus::jump`].

mod xoroshiro;

pub use xoroshiro::{GeneratorState, SeedError, Xoroshiro128Plus};
