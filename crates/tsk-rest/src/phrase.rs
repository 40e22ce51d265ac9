//! # Error Phrase Minting
//!
//! Unexpected failures carry a short human-memorable phrase
//! (`adjective-noun-hex8`) that operators and support can quote to find
//! the exact occurrence in the logs. Phrases are locally unique per
//! failure instance; collisions across processes are accepted and
//! cryptographic uniqueness is a non-goal.
//!
//! The generator owns its RNG, injected at construction, so tests can
//! seed it deterministically and nothing in this crate reaches for a
//! hidden global entropy source.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ADJECTIVES: &[&str] = &["swift", "calm", "bright", "quiet", "bold", "gentle"];
const NOUNS: &[&str] = &["tiger", "eagle", "river", "mountain", "ocean", "forest"];

/// Mints correlation phrases for 500-class responses.
///
/// Cheap to share behind an `Arc`; the mutex is held only for the few RNG
/// draws a single phrase needs.
#[derive(Debug)]
pub struct PhraseGenerator {
    rng: Mutex<StdRng>,
}

impl PhraseGenerator {
    /// Construct from an explicit RNG. Tests pass a seeded `StdRng` to get
    /// reproducible phrases.
    pub fn new(rng: StdRng) -> Self {
        Self { rng: Mutex::new(rng) }
    }

    /// Construct seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Mint one phrase: `adjective-noun-hex8`.
    pub fn mint(&self) -> String {
        let mut rng = self.rng.lock();
        let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
        let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
        let tail: u32 = rng.gen();
        format!("{adjective}-{noun}-{tail:08x}")
    }
}
