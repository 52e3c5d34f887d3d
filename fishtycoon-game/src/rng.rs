//! Deterministic RNG streams derived from a single user seed.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Independent random streams so that, e.g., extra weight rolls never shift
/// which species the next cast lands.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    catch: CountingRng<ChaCha20Rng>,
    measure: CountingRng<ChaCha20Rng>,
    skill: CountingRng<ChaCha20Rng>,
    offline: CountingRng<ChaCha20Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            catch: CountingRng::new(derive_stream_seed(seed, b"catch")),
            measure: CountingRng::new(derive_stream_seed(seed, b"measure")),
            skill: CountingRng::new(derive_stream_seed(seed, b"skill")),
            offline: CountingRng::new(derive_stream_seed(seed, b"offline")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Split borrows for a live catch: species, measurement and skill streams at once.
    pub fn catch_streams(
        &mut self,
    ) -> (
        &mut CountingRng<ChaCha20Rng>,
        &mut CountingRng<ChaCha20Rng>,
        &mut CountingRng<ChaCha20Rng>,
    ) {
        (&mut self.catch, &mut self.measure, &mut self.skill)
    }

    /// Split borrows for offline backfill: species and measurement streams.
    pub fn offline_streams(
        &mut self,
    ) -> (&mut CountingRng<ChaCha20Rng>, &mut CountingRng<ChaCha20Rng>) {
        (&mut self.offline, &mut self.measure)
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
