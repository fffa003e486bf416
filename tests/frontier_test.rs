//! Integration tests for frontier traversal strategies
//!
//! Distribution checks draw from fresh frontiers with fixed RNG seeds, so every
//! run sees the same samples.

mod common;

use std::collections::HashSet;
use std::f64::consts::PI;

use common::url;
use pathcrawl::crawler::url::{CanonicalUrl, HostKey};
use pathcrawl::frontier::quantum::QuantumSampler;
use pathcrawl::frontier::{flight_length, hash_angle, Frontier, Strategy, FLIGHT_ALPHA};
use pathcrawl::utils::error::FrontierError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{ChiSquared, ContinuousCDF};

const TRIALS: usize = 10_000;

/// Upper tail probability of Pearson's chi-square statistic against uniform
fn uniformity_p_value(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    let expected = total as f64 / counts.len() as f64;
    let statistic: f64 = counts
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let dist = ChiSquared::new((counts.len() - 1) as f64).unwrap();
    1.0 - dist.cdf(statistic)
}

fn numbered(n: usize) -> Vec<CanonicalUrl> {
    (0..n)
        .map(|i| url(&format!("http://a.test/{i}")))
        .collect()
}

fn index_of(url: &CanonicalUrl) -> usize {
    url.as_str()
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap()
}

/// Position picked by the first dequeue from a queue of `n` numbered URLs
fn first_pick(strategy: Strategy, n: usize, rng_seed: u64) -> usize {
    let mut urls = numbered(n).into_iter();
    let mut frontier = Frontier::with_seed(strategy, urls.next().unwrap(), rng_seed);
    frontier.enqueue(urls);
    index_of(&frontier.dequeue().unwrap())
}

fn pick_counts(strategy: Strategy, n: usize) -> Vec<usize> {
    let mut counts = vec![0; n];
    for trial in 0..TRIALS {
        counts[first_pick(strategy, n, trial as u64)] += 1;
    }
    counts
}

#[test]
fn test_diffusion_is_uniform() {
    let counts = pick_counts(Strategy::Diffusion, 8);
    let p = uniformity_p_value(&counts);
    assert!(p > 0.01, "counts {counts:?} p = {p}");
}

#[test]
fn test_quantum_frontier_is_uniform() {
    let counts = pick_counts(Strategy::Quantum, 8);
    let p = uniformity_p_value(&counts);
    assert!(p > 0.01, "counts {counts:?} p = {p}");
}

#[test]
fn test_quantum_sampler_is_uniform_for_non_power_of_two() {
    let mut sampler = QuantumSampler::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut counts = vec![0; 5];
    for _ in 0..TRIALS {
        let idx = sampler.sample(5, &mut rng).unwrap();
        counts[idx] += 1;
    }

    let p = uniformity_p_value(&counts);
    assert!(p > 0.01, "counts {counts:?} p = {p}");
    assert_eq!(sampler.prepared_qubits(), Some(3));
}

#[test]
fn test_quantum_sampler_rejects_empty_range() {
    let mut sampler = QuantumSampler::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert_eq!(sampler.sample(0, &mut rng), Err(FrontierError::Empty));
}

#[test]
fn test_flight_favours_queue_front() {
    let counts = pick_counts(Strategy::Flight, 8);
    assert!(
        counts[0] > counts[7] * 5,
        "front {} back {}",
        counts[0],
        counts[7]
    );
    // Every position stays reachable
    assert!(counts.iter().all(|&c| c > 0), "counts {counts:?}");
}

#[test]
fn test_flight_length_tail() {
    // P(L >= 2) = 2^-alpha for a Pareto(alpha, 1) length
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let long = (0..TRIALS)
        .filter(|_| flight_length(&mut rng, FLIGHT_ALPHA) >= 2)
        .count();

    let observed = long as f64 / TRIALS as f64;
    let expected = 2f64.powf(-FLIGHT_ALPHA);
    assert!(
        (observed - expected).abs() < 0.03,
        "observed {observed}, expected {expected}"
    );
}

#[test]
fn test_persistence_starts_at_queue_front() {
    for trial in 0..50 {
        assert_eq!(first_pick(Strategy::Persistence, 8, trial), 0);
    }
}

/// Frontier following `a.test` with `[b.test/0, b.test/1, a.test/1]` pending
fn momentum_frontier(rng_seed: u64) -> Frontier {
    let mut frontier =
        Frontier::with_seed(Strategy::Persistence, url("http://a.test/0"), rng_seed);
    frontier.enqueue([
        url("http://b.test/0"),
        url("http://b.test/1"),
        url("http://a.test/1"),
    ]);
    assert_eq!(frontier.dequeue().unwrap(), url("http://a.test/0"));
    frontier
}

#[test]
fn test_persistence_follows_momentum_host() {
    let trials = 2_000;
    let mut followed = 0;
    for trial in 0..trials {
        let mut frontier = momentum_frontier(trial);
        assert_eq!(frontier.momentum_host().unwrap().as_str(), "a.test");

        let next = frontier.dequeue().unwrap();
        if next == url("http://a.test/1") {
            followed += 1;
        } else {
            // Momentum not applied: queue front
            assert_eq!(next, url("http://b.test/0"));
        }
    }

    let rate = followed as f64 / trials as f64;
    assert!((rate - 0.85).abs() < 0.05, "followed momentum {rate}");
}

#[test]
fn test_persistence_without_matching_host_takes_front() {
    for trial in 0..50 {
        let mut frontier =
            Frontier::with_seed(Strategy::Persistence, url("http://a.test/0"), trial);
        frontier.enqueue([url("http://b.test/0"), url("http://b.test/1")]);
        frontier.dequeue().unwrap();

        assert_eq!(frontier.dequeue().unwrap(), url("http://b.test/0"));
        assert_eq!(frontier.momentum_host().unwrap().as_str(), "b.test");
    }
}

/// Candidate host whose angle points away from `wind`
fn opposing_host(wind: f64) -> String {
    (0..10_000)
        .map(|i| format!("h{i}.test"))
        .find(|name| {
            let host: HostKey = url(&format!("http://{name}/")).host().clone();
            (hash_angle(&host) - wind).cos() < -0.95
        })
        .unwrap()
}

#[test]
fn test_field_biases_toward_wind() {
    let seed = url("http://a.test/");
    let wind = hash_angle(seed.host());
    let opposite = url(&format!("http://{}/", opposing_host(wind)));

    let trials = 5_000;
    let mut aligned = 0;
    for trial in 0..trials {
        let mut frontier = Frontier::with_seed(Strategy::Field, seed.clone(), trial);
        frontier.enqueue([opposite.clone()]);
        if frontier.dequeue().unwrap() == seed {
            aligned += 1;
        }
    }

    // Weights 3 (aligned) versus at most 1.05 (opposite)
    let rate = aligned as f64 / trials as f64;
    assert!(rate > 0.70, "aligned rate {rate}");
}

#[test]
fn test_field_wind_ignores_later_seeds() {
    let mut frontier = Frontier::with_seed(Strategy::Field, url("http://a.test/"), 1);
    let wind = frontier.wind_angle().unwrap();
    frontier.enqueue([url("http://b.test/"), url("http://c.test/")]);
    while frontier.dequeue().is_ok() {}
    assert_eq!(frontier.wind_angle(), Some(wind));
    assert!((0.0..2.0 * PI).contains(&wind));
}

#[test]
fn test_aggregation_is_fifo() {
    let mut urls = numbered(6).into_iter();
    let mut frontier = Frontier::with_seed(Strategy::Aggregation, urls.next().unwrap(), 9);
    frontier.enqueue(urls);

    let order: Vec<usize> = std::iter::from_fn(|| frontier.dequeue().ok())
        .map(|u| index_of(&u))
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_aggregation_rejects_cluster_members() {
    let seed = url("http://a.test/");
    let mut frontier = Frontier::with_seed(Strategy::Aggregation, seed.clone(), 1);
    assert!(frontier.cluster().unwrap().contains(&seed));

    let fetched = frontier.dequeue().unwrap();
    frontier.absorb(fetched);
    frontier.enqueue([seed.clone(), url("http://a.test/2")]);

    let pending: Vec<&CanonicalUrl> = frontier.pending().collect();
    assert_eq!(pending, vec![&url("http://a.test/2")]);
}

#[test]
fn test_aggregation_cluster_grows_monotonically() {
    let mut frontier = Frontier::with_seed(Strategy::Aggregation, url("http://a.test/0"), 1);
    frontier.enqueue(numbered(10).into_iter().skip(1));

    let mut previous = frontier.cluster().unwrap().len();
    while let Ok(next) = frontier.dequeue() {
        frontier.absorb(next.clone());
        frontier.absorb(next);
        let size = frontier.cluster().unwrap().len();
        assert!(size >= previous);
        previous = size;
    }
    assert_eq!(previous, 10);
}

#[test]
fn test_absorb_is_noop_outside_aggregation() {
    let mut frontier = Frontier::with_seed(Strategy::Diffusion, url("http://a.test/"), 1);
    frontier.absorb(url("http://a.test/"));
    assert!(frontier.cluster().is_none());
    frontier.enqueue([url("http://a.test/")]);
    assert_eq!(frontier.len(), 2);
}

#[test]
fn test_every_strategy_drains_each_entry_once() {
    for strategy in Strategy::ALL {
        let urls = numbered(20);
        let mut input = urls.clone().into_iter();
        let mut frontier = Frontier::with_seed(strategy, input.next().unwrap(), 5);
        frontier.enqueue(input);

        let mut drained = HashSet::new();
        while let Ok(next) = frontier.dequeue() {
            assert!(drained.insert(next), "{strategy} returned a URL twice");
        }

        assert_eq!(drained, urls.into_iter().collect::<HashSet<_>>(), "{strategy}");
        assert!(frontier.is_empty());
        assert_eq!(frontier.dequeue(), Err(FrontierError::Empty));
    }
}

#[test]
fn test_seeded_frontiers_are_reproducible() {
    for strategy in Strategy::ALL {
        let drain = |rng_seed| {
            let mut input = numbered(12).into_iter();
            let mut frontier = Frontier::with_seed(strategy, input.next().unwrap(), rng_seed);
            frontier.enqueue(input);
            std::iter::from_fn(|| frontier.dequeue().ok()).collect::<Vec<_>>()
        };
        assert_eq!(drain(99), drain(99), "{strategy}");
    }
}
