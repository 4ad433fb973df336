//! Injectable environment seams for the pure rules layer.
//!
//! The only seam today is randomness: everything that needs a random choice
//! receives an [`RngOracle`] instead of reaching for a global generator.
mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed, seed_context};
