//! Multisine signal generator
//!
//! Evaluates a [`WaveBank`] at a time value, optionally normalizing by the
//! bank's estimated standard deviation and clamping to `[-1, 1]` before the
//! gain is applied.

use std::f64::consts::TAU;

use crate::params::GeneratorParams;
use crate::wave_bank::WaveBank;

/// Pure function of time over an owned wave bank.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGenerator {
    bank: WaveBank,
    gain: f64,
}

impl SignalGenerator {
    pub fn new(bank: WaveBank, gain: f64) -> Self {
        Self { bank, gain }
    }

    /// Build a generator whose bank is seeded with `seed`.
    pub fn from_params(params: &GeneratorParams, seed: u64) -> Self {
        let bank = WaveBank::new(params.wave_count, seed, params.ranges, params.spacing);
        Self::new(bank, params.gain)
    }

    pub fn bank(&self) -> &WaveBank {
        &self.bank
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }

    /// Re-initialize the owned bank from a new seed, keeping its shape.
    pub fn reseed(&mut self, seed: u64) {
        let ranges = *self.bank.ranges();
        let spacing = self.bank.spacing();
        self.bank.reinitialize(seed, ranges, spacing);
    }

    pub fn replace_bank(&mut self, bank: WaveBank) {
        self.bank = bank;
    }

    /// Unnormalized sum `sum_i a_i * sin(2*pi*f_i*t + phi_i)`.
    pub fn raw(&self, time: f64) -> f64 {
        self.bank
            .waves()
            .map(|(f, a, p)| a * (TAU * f * time + p).sin())
            .sum()
    }

    /// Signal at `time`.
    ///
    /// With `normalize` set and a non-zero normalization factor the raw sum is
    /// divided by twice the factor and hard-clamped to `[-1, 1]`. The gain is
    /// applied last, so `gain > 1` can still leave the unit interval.
    pub fn evaluate(&self, time: f64, normalize: bool) -> f64 {
        let mut signal = self.raw(time);

        let norm = self.bank.norm_factor();
        if normalize && norm != 0.0 {
            signal = (signal / (2.0 * norm)).clamp(-1.0, 1.0);
        }

        signal * self.gain
    }

    /// Lazily evaluate each time value in order.
    pub fn evaluate_batch<'a, I>(
        &'a self,
        times: I,
        normalize: bool,
    ) -> impl Iterator<Item = f64> + 'a
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: 'a,
    {
        times
            .into_iter()
            .map(move |t| self.evaluate(t, normalize))
    }

    /// Eager batch evaluation into `out`; evaluates `min(times.len(), out.len())` samples.
    pub fn evaluate_into(&self, times: &[f64], normalize: bool, out: &mut [f64]) -> usize {
        let n = times.len().min(out.len());
        for (slot, &t) in out.iter_mut().zip(times.iter()) {
            *slot = self.evaluate(t, normalize);
        }
        n
    }
}
