//! Quantum register sampler
//!
//! Simulates `q = ceil(log2(max(2, n)))` qubits prepared in `|0…0⟩`, applies a
//! Hadamard gate to every qubit and measures under the Born rule. Outcomes in
//! the power-of-two padding (`>= n`) are discarded and measured again, so the
//! result is uniform over `[0, n)`.

use rand::Rng;
use std::f64::consts::FRAC_1_SQRT_2;

use crate::utils::error::FrontierError;

/// Number of qubits needed to address `n` outcomes
pub fn qubits_for(n: usize) -> u32 {
    n.max(2).next_power_of_two().trailing_zeros()
}

/// State vector of a small simulated register
#[derive(Debug, Clone)]
pub struct Register {
    qubits: u32,
    amplitudes: Vec<f64>,
}

impl Register {
    /// Register of `qubits` qubits in the all-zero basis state
    pub fn ground(qubits: u32) -> Self {
        let mut amplitudes = vec![0.0; 1usize << qubits];
        amplitudes[0] = 1.0;
        Self { qubits, amplitudes }
    }

    pub fn qubits(&self) -> u32 {
        self.qubits
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    /// Apply `H ⊗ I` on `target`, identity on every other qubit
    ///
    /// Equivalent to multiplying by the full `2^q × 2^q` gate, done as one
    /// butterfly pass over amplitude pairs differing only in bit `target`.
    pub fn hadamard(&mut self, target: u32) {
        let stride = 1usize << target;
        let len = self.amplitudes.len();

        for block in (0..len).step_by(stride * 2) {
            for i in block..block + stride {
                let a = self.amplitudes[i];
                let b = self.amplitudes[i + stride];
                self.amplitudes[i] = FRAC_1_SQRT_2 * (a + b);
                self.amplitudes[i + stride] = FRAC_1_SQRT_2 * (a - b);
            }
        }
    }

    /// Born-rule probabilities, one per basis state
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a * a).collect()
    }
}

/// Prepared register plus its cumulative outcome distribution
#[derive(Debug, Clone)]
struct Prepared {
    register: Register,
    cumulative: Vec<f64>,
}

impl Prepared {
    fn new(qubits: u32) -> Self {
        let mut register = Register::ground(qubits);
        for qubit in 0..qubits {
            register.hadamard(qubit);
        }

        let cumulative = register
            .probabilities()
            .into_iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect();

        Self {
            register,
            cumulative,
        }
    }

    /// Collapse the register once
    fn measure<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.gen();
        let idx = self.cumulative.partition_point(|&acc| acc <= r);
        idx.min(self.cumulative.len() - 1)
    }
}

/// Index sampler backed by a simulated Hadamard register
///
/// Superposition depends only on the qubit count, so the prepared state is
/// kept until a different register width is needed.
#[derive(Debug, Clone, Default)]
pub struct QuantumSampler {
    prepared: Option<Prepared>,
}

impl QuantumSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measure an index in `[0, n)`
    ///
    /// # Errors
    ///
    /// Returns `FrontierError::Empty` when `n == 0`.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<usize, FrontierError> {
        if n == 0 {
            return Err(FrontierError::Empty);
        }

        let qubits = qubits_for(n);
        let prepared = match self.prepared.take() {
            Some(prepared) if prepared.register.qubits() == qubits => prepared,
            _ => Prepared::new(qubits),
        };

        let idx = loop {
            let idx = prepared.measure(rng);
            if idx < n {
                break idx;
            }
        };

        self.prepared = Some(prepared);
        Ok(idx)
    }

    /// Width of the currently prepared register
    pub fn prepared_qubits(&self) -> Option<u32> {
        self.prepared.as_ref().map(|p| p.register.qubits())
    }
}
