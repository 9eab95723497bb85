//! Pseudorandom draws for winner sampling and extra-turn variety.
//!
//! One policy, chosen by whether a seed is present:
//! - seed supplied: FNV-1a hash of the seed's text form feeds a Mulberry32
//!   stream, so identical seeds and call order give identical draws;
//! - no seed: operating-system entropy, degrading to the thread-local
//!   generator only if the OS source reports an error.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::log_warn;

const ENABLE_LOGS: bool = true;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const MULBERRY_INCREMENT: u32 = 0x6d2b_79f5;
const U32_RANGE: f64 = 4_294_967_296.0;

/// Seed accepted from hosts: either free text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(f64),
    Text(String),
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Negative zero prints as "0" so it hashes like the text "0".
            Seed::Number(n) if *n == 0.0 => f.write_str("0"),
            Seed::Number(n) => write!(f, "{n}"),
            Seed::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Text(value)
    }
}

/// Integers keep every digit; a float would round above 2^53.
impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<f64> for Seed {
    fn from(value: f64) -> Self {
        Seed::Number(value)
    }
}

/// 32-bit FNV-1a over the UTF-16 code units of the seed's text form.
pub fn hash_seed(seed: &Seed) -> u32 {
    seed.to_string()
        .encode_utf16()
        .fold(FNV_OFFSET_BASIS, |h, unit| {
            (h ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
        })
}

/// Mulberry32: a single-word generator, small and fully reproducible.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(state: u32) -> Self {
        Self { state }
    }

    pub fn from_seed(seed: &Seed) -> Self {
        Self::new(hash_seed(seed))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(1 | t);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t));
        t ^ (t >> 14)
    }
}

/// Stream of floats in [0, 1).
#[derive(Debug)]
pub enum RandomSource {
    Seeded(Mulberry32),
    Entropy { degraded: bool },
}

impl RandomSource {
    pub fn new(seed: Option<&Seed>) -> Self {
        match seed {
            Some(seed) => RandomSource::Seeded(Mulberry32::from_seed(seed)),
            None => RandomSource::Entropy { degraded: false },
        }
    }

    pub fn is_seeded(&self) -> bool {
        matches!(self, RandomSource::Seeded(_))
    }

    /// Next draw in [0, 1).
    pub fn next(&mut self) -> f64 {
        f64::from(self.next_u32()) / U32_RANGE
    }

    fn next_u32(&mut self) -> u32 {
        match self {
            RandomSource::Seeded(rng) => rng.next_u32(),
            RandomSource::Entropy { degraded } => {
                if !*degraded {
                    let mut buf = [0u8; 4];
                    match OsRng.try_fill_bytes(&mut buf) {
                        Ok(()) => return u32::from_le_bytes(buf),
                        Err(err) => {
                            log_warn!("OS entropy unavailable ({err}); using thread-local generator");
                            *degraded = true;
                        }
                    }
                }
                rand::thread_rng().next_u32()
            }
        }
    }
}
