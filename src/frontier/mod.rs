//! Frontier traversal engine
//!
//! The frontier owns the pending URL queue and decides which URL is visited
//! next. Six strategies model different physical metaphors:
//!
//! | Strategy      | Alias       | Selection                                               |
//! |---------------|-------------|---------------------------------------------------------|
//! | `diffusion`   | `brownian`  | uniform random index                                    |
//! | `flight`      | `levy`      | uniform within a Pareto-distributed prefix              |
//! | `persistence` | `ballistic` | stay on the previous host with probability 0.85         |
//! | `field`       | `wind`      | weighted by alignment of the host angle with the wind   |
//! | `aggregation` | `dla`       | FIFO; absorbed URLs are never re-admitted               |
//! | `quantum`     |             | Born-rule measurement of a Hadamard register            |
//!
//! Duplicate URLs are admitted to `pending` for every strategy except
//! aggregation; the crawler's visited set is the authoritative dedup.

pub mod quantum;

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use crate::crawler::url::{CanonicalUrl, HostKey};
use crate::utils::error::{ConfigError, FrontierError};
use quantum::QuantumSampler;

/// Pareto shape of the flight-length distribution
pub const FLIGHT_ALPHA: f64 = 1.6;

/// Probability of staying on the momentum host
pub const MOMENTUM_PROBABILITY: f64 = 0.85;

/// Angular resolution of [`hash_angle`]
const ANGLE_BUCKETS: u128 = 360_000;

/// Frontier traversal strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[serde(alias = "brownian")]
    Diffusion,
    #[serde(alias = "levy")]
    Flight,
    #[serde(alias = "ballistic")]
    Persistence,
    #[serde(alias = "wind")]
    Field,
    #[serde(alias = "dla")]
    Aggregation,
    Quantum,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Diffusion,
        Strategy::Flight,
        Strategy::Persistence,
        Strategy::Field,
        Strategy::Aggregation,
        Strategy::Quantum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diffusion => "diffusion",
            Self::Flight => "flight",
            Self::Persistence => "persistence",
            Self::Field => "field",
            Self::Aggregation => "aggregation",
            Self::Quantum => "quantum",
        }
    }

    /// Physics name accepted as an alias
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Self::Diffusion => Some("brownian"),
            Self::Flight => Some("levy"),
            Self::Persistence => Some("ballistic"),
            Self::Field => Some("wind"),
            Self::Aggregation => Some("dla"),
            Self::Quantum => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Diffusion => "uniform random walk over the pending queue",
            Self::Flight => "Levy flight: short hops near the front, rare long jumps",
            Self::Persistence => "ballistic runs that keep to one host",
            Self::Field => "wind-biased draw favouring hosts aligned with the first seed",
            Self::Aggregation => "diffusion-limited aggregation: FIFO growth of a URL cluster",
            Self::Quantum => "Born-rule measurement of a Hadamard-prepared register",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == name || strategy.alias() == Some(name.as_str()))
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}

/// Deterministic pseudo-angle in `[0, 2π)` derived from a host
pub fn hash_angle(host: &HostKey) -> f64 {
    let digest = Sha256::digest(host.as_str().as_bytes());
    let mut head = [0u8; 16];
    head.copy_from_slice(&digest[..16]);
    let bucket = u128::from_be_bytes(head) % ANGLE_BUCKETS;

    bucket as f64 / ANGLE_BUCKETS as f64 * TAU
}

/// Field weight in `[1, 3]`: 3 when aligned with the wind, 1 when opposite
pub fn field_weight(angle: f64, wind: f64) -> f64 {
    1.0 + 2.0 * (1.0 + (angle - wind).cos()) / 2.0
}

/// Draw a flight length from Pareto(`alpha`, minimum 1), truncated to an integer
pub fn flight_length<R: Rng + ?Sized>(rng: &mut R, alpha: f64) -> usize {
    // 1 - U lies in (0, 1], keeping the power finite.
    let u: f64 = 1.0 - rng.gen::<f64>();
    let length = u.powf(-1.0 / alpha);

    (length as usize).max(1)
}

/// Strategy-private auxiliary state
#[derive(Debug, Clone)]
enum Walk {
    Diffusion,
    Flight,
    Persistence {
        momentum: Option<HostKey>,
    },
    Field {
        wind: f64,
        angles: HashMap<HostKey, f64>,
    },
    Aggregation {
        cluster: HashSet<CanonicalUrl>,
    },
    Quantum {
        sampler: QuantumSampler,
    },
}

impl Walk {
    fn new(strategy: Strategy, seed: &CanonicalUrl) -> Self {
        match strategy {
            Strategy::Diffusion => Self::Diffusion,
            Strategy::Flight => Self::Flight,
            Strategy::Persistence => Self::Persistence { momentum: None },
            Strategy::Field => Self::Field {
                wind: hash_angle(seed.host()),
                angles: HashMap::new(),
            },
            Strategy::Aggregation => Self::Aggregation {
                cluster: HashSet::from([seed.clone()]),
            },
            Strategy::Quantum => Self::Quantum {
                sampler: QuantumSampler::new(),
            },
        }
    }
}

/// Pending URL queue plus traversal strategy state
#[derive(Debug, Clone)]
pub struct Frontier {
    strategy: Strategy,
    pending: VecDeque<CanonicalUrl>,
    walk: Walk,
    rng: ChaCha8Rng,
}

impl Frontier {
    /// Create a frontier whose queue starts with `seed`
    ///
    /// The seed fixes the wind angle of the field strategy and is the first
    /// member of the aggregation cluster.
    pub fn new(strategy: Strategy, seed: CanonicalUrl) -> Self {
        Self::with_rng(strategy, seed, ChaCha8Rng::from_entropy())
    }

    /// Create a frontier with a reproducible RNG stream
    pub fn with_seed(strategy: Strategy, seed: CanonicalUrl, rng_seed: u64) -> Self {
        Self::with_rng(strategy, seed, ChaCha8Rng::seed_from_u64(rng_seed))
    }

    pub fn with_rng(strategy: Strategy, seed: CanonicalUrl, rng: ChaCha8Rng) -> Self {
        let walk = Walk::new(strategy, &seed);
        Self {
            strategy,
            pending: VecDeque::from([seed]),
            walk,
            rng,
        }
    }

    /// Create a frontier from a strategy name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownStrategy` for unsupported names.
    pub fn from_name(name: &str, seed: CanonicalUrl) -> Result<Self, ConfigError> {
        Ok(Self::new(name.parse()?, seed))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending URLs in queue order
    pub fn pending(&self) -> impl Iterator<Item = &CanonicalUrl> {
        self.pending.iter()
    }

    /// Wind angle of the field strategy
    pub fn wind_angle(&self) -> Option<f64> {
        match &self.walk {
            Walk::Field { wind, .. } => Some(*wind),
            _ => None,
        }
    }

    /// Host the persistence strategy is currently following
    pub fn momentum_host(&self) -> Option<&HostKey> {
        match &self.walk {
            Walk::Persistence { momentum } => momentum.as_ref(),
            _ => None,
        }
    }

    /// URLs absorbed by the aggregation cluster
    pub fn cluster(&self) -> Option<&HashSet<CanonicalUrl>> {
        match &self.walk {
            Walk::Aggregation { cluster } => Some(cluster),
            _ => None,
        }
    }

    /// Add URLs to the back of the queue
    ///
    /// The aggregation strategy silently drops URLs already in its cluster.
    pub fn enqueue<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = CanonicalUrl>,
    {
        match &self.walk {
            Walk::Aggregation { cluster } => self
                .pending
                .extend(urls.into_iter().filter(|url| !cluster.contains(url))),
            _ => self.pending.extend(urls),
        }
    }

    /// Absorb a fetched URL into the aggregation cluster
    ///
    /// No-op for every other strategy.
    pub fn absorb(&mut self, url: CanonicalUrl) {
        if let Walk::Aggregation { cluster } = &mut self.walk {
            cluster.insert(url);
        }
    }

    /// Remove and return the next URL chosen by the strategy
    ///
    /// # Errors
    ///
    /// Returns `FrontierError::Empty` when nothing is pending.
    pub fn dequeue(&mut self) -> Result<CanonicalUrl, FrontierError> {
        if self.pending.is_empty() {
            return Err(FrontierError::Empty);
        }

        let idx = self.select()?;
        let url = self.pending.remove(idx).ok_or(FrontierError::Empty)?;

        if let Walk::Persistence { momentum } = &mut self.walk {
            *momentum = Some(url.host().clone());
        }

        Ok(url)
    }

    fn select(&mut self) -> Result<usize, FrontierError> {
        let Self {
            pending, walk, rng, ..
        } = self;
        let len = pending.len();

        let idx = match walk {
            Walk::Diffusion => rng.gen_range(0..len),
            Walk::Flight => {
                let window = flight_length(rng, FLIGHT_ALPHA).min(len);
                rng.gen_range(0..window)
            }
            Walk::Persistence { momentum } => match momentum.as_ref() {
                Some(host) if rng.gen_bool(MOMENTUM_PROBABILITY) => pending
                    .iter()
                    .position(|url| url.host() == host)
                    .unwrap_or(0),
                _ => 0,
            },
            Walk::Field { wind, angles } => {
                let wind = *wind;
                let weights: Vec<f64> = pending
                    .iter()
                    .map(|url| {
                        let angle = *angles
                            .entry(url.host().clone())
                            .or_insert_with(|| hash_angle(url.host()));
                        field_weight(angle, wind)
                    })
                    .collect();

                WeightedIndex::new(&weights)
                    .map(|dist| dist.sample(rng))
                    .unwrap_or(0)
            }
            Walk::Aggregation { .. } => 0,
            Walk::Quantum { sampler } => sampler.sample(len, rng)?,
        };

        Ok(idx)
    }
}
