//! Numeric one-time password generation

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIGITS: &[u8; 10] = b"0123456789";

/// Produces fixed-length numeric codes from a generator seeded once at construction.
pub struct OtpGenerator {
    rng: Mutex<StdRng>,
}

impl OtpGenerator {
    /// Seed from the current wall-clock time
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(nanos)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate a code of exactly `length` digits. A zero length yields an empty string.
    pub fn generate(&self, length: usize) -> String {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        (0..length)
            .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
            .collect()
    }
}

impl Default for OtpGenerator {
    fn default() -> Self {
        Self::from_time()
    }
}
