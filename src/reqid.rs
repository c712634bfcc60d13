//! Request identifiers.
//!
//! An id is 12 bytes, URL-safe base64 encoded (16 characters, never padded):
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────┐
//! │ seed (u32 LE)│ unix time in nanoseconds (u64 LE) │
//! └──────────────┴──────────────────────────────────┘
//! ```
//!
//! The process seed ([`Seed::process`]) is derived from the clock the first
//! time it is asked for and is then reused for every id the process mints.
//! It is only 32 bits wide: two processes started in the same nanosecond
//! window modulo the prime share a seed, and ids are then told apart by the
//! timestamp alone. Collisions are unlikely, not impossible. Never use these
//! ids as secrets.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

/// Largest prime below 2^32.
const SEED_MODULUS: u64 = 4_294_967_291;

/// Length of a decoded request id.
pub const ID_LEN: usize = 12;

static PROCESS_SEED: LazyLock<Seed> = LazyLock::new(Seed::from_clock);

/// Fixed per-process prefix of every generated request id.
///
/// Cheap to copy. [`Logger`](crate::middleware::Logger) takes the
/// process seed when it is built and keeps its own copy; request handling
/// never reads the global.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Seed(u32);

impl Seed {
    /// The seed of this process: computed once, identical on every call.
    pub fn process() -> Self {
        *PROCESS_SEED
    }

    /// A new seed taken from the current wall clock. Prefer
    /// [`Seed::process`]; two clock seeds in one process differ.
    pub fn from_clock() -> Self {
        // The modulus keeps the value below 2^32, so the cast is lossless.
        Self((unix_nanos() % SEED_MODULUS) as u32)
    }

    /// Seed with a caller-chosen value. Useful for reproducible ids in tests.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// A fresh request id for this seed and the current time.
    pub fn generate(self) -> String {
        encode(self, unix_nanos())
    }
}

fn encode(seed: Seed, nanos: u64) -> String {
    let mut raw = [0u8; ID_LEN];
    raw[..4].copy_from_slice(&seed.0.to_le_bytes());
    raw[4..].copy_from_slice(&nanos.to_le_bytes());
    URL_SAFE.encode(raw)
}

/// Nanoseconds since the Unix epoch; 0 if the clock is set before it.
fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
