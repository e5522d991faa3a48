//! Wave bank
//!
//! Per-wave parameters of a multisine generator and the variance-based
//! normalization constant derived from them.

use std::f64::consts::TAU;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of sinusoids in one bank.
pub const WAVE_CAPACITY: usize = 200;

/// Closed interval `[min, max]` used for frequency, amplitude and phase draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create an interval; bounds are not checked here, see [`Interval::is_valid`].
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width `max - min`, which may overflow to infinity for huge bounds.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Finite bounds, `min <= max` and a finite width.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.span().is_finite()
    }

    /// Inclusive membership test.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ranges the bank draws its per-wave parameters from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveRanges {
    /// Frequency range [Hz]
    pub frequency: Interval,
    /// Amplitude range
    pub amplitude: Interval,
    /// Phase range [rad]
    pub phase: Interval,
}

impl Default for WaveRanges {
    fn default() -> Self {
        Self {
            frequency: Interval::new(0.1, 10.0),
            amplitude: Interval::new(0.5, 1.0),
            phase: Interval::new(0.0, TAU),
        }
    }
}

/// How frequencies are laid out across the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencySpacing {
    /// Evenly spaced from `min` to `max` inclusive.
    #[default]
    Even,
    /// Drawn independently and uniformly from the range.
    Random,
}

/// Uniform draws from an interval; a degenerate or unbounded interval always yields `min`.
enum IntervalSampler {
    Fixed(f64),
    Uniform(Uniform<f64>),
}

impl IntervalSampler {
    fn new(interval: Interval) -> Self {
        if interval.max > interval.min && interval.span().is_finite() {
            Self::Uniform(Uniform::new(interval.min, interval.max))
        } else {
            Self::Fixed(interval.min)
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> f64 {
        match self {
            Self::Fixed(value) => *value,
            Self::Uniform(dist) => dist.sample(rng),
        }
    }
}

/// Frequency, amplitude and phase for up to [`WAVE_CAPACITY`] sinusoids.
///
/// The bank is fully computed at construction and only changes through
/// [`WaveBank::reinitialize`], which recomputes everything from a seed. The
/// same seed, count, ranges and spacing always reproduce the same bank.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveBank {
    seed: u64,
    ranges: WaveRanges,
    spacing: FrequencySpacing,
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
    phases: Vec<f64>,
    norm_factor: f64,
}

impl WaveBank {
    /// Build a bank of `wave_count` waves; counts above [`WAVE_CAPACITY`] are truncated.
    pub fn new(wave_count: usize, seed: u64, ranges: WaveRanges, spacing: FrequencySpacing) -> Self {
        let count = wave_count.min(WAVE_CAPACITY);
        let mut bank = Self {
            seed,
            ranges,
            spacing,
            frequencies: Vec::with_capacity(count),
            amplitudes: Vec::with_capacity(count),
            phases: Vec::with_capacity(count),
            norm_factor: 0.0,
        };
        bank.fill(count);
        bank
    }

    /// Recompute every wave and the normalization factor, keeping the wave count.
    pub fn reinitialize(&mut self, seed: u64, ranges: WaveRanges, spacing: FrequencySpacing) {
        let count = self.len();
        self.seed = seed;
        self.ranges = ranges;
        self.spacing = spacing;
        self.fill(count);
    }

    fn fill(&mut self, count: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        self.frequencies.clear();
        self.amplitudes.clear();
        self.phases.clear();

        match self.spacing {
            FrequencySpacing::Random => {
                let sampler = IntervalSampler::new(self.ranges.frequency);
                self.frequencies
                    .extend((0..count).map(|_| sampler.sample(&mut rng)));
            }
            FrequencySpacing::Even => {
                self.frequencies
                    .extend(even_spacing(self.ranges.frequency, count));
            }
        }

        let amplitude = IntervalSampler::new(self.ranges.amplitude);
        let phase = IntervalSampler::new(self.ranges.phase);
        for _ in 0..count {
            self.amplitudes.push(amplitude.sample(&mut rng));
            self.phases.push(phase.sample(&mut rng));
        }

        let total_variance: f64 = self.amplitudes.iter().map(|a| a * a / 2.0).sum();
        self.norm_factor = total_variance.sqrt();
    }

    /// Number of waves in the bank.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Seed the bank was last filled from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ranges(&self) -> &WaveRanges {
        &self.ranges
    }

    pub fn spacing(&self) -> FrequencySpacing {
        self.spacing
    }

    /// Per-wave frequencies [Hz].
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Per-wave amplitudes.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    /// Per-wave phases [rad].
    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    /// Estimated standard deviation of the summed signal, `sqrt(sum(a_i^2 / 2))`.
    pub fn norm_factor(&self) -> f64 {
        self.norm_factor
    }

    /// Iterate `(frequency, amplitude, phase)` triples.
    pub fn waves(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.frequencies
            .iter()
            .zip(self.amplitudes.iter())
            .zip(self.phases.iter())
            .map(|((&f, &a), &p)| (f, a, p))
    }
}

fn even_spacing(range: Interval, count: usize) -> impl Iterator<Item = f64> {
    // A single wave sits at the lower bound; the last of several sits exactly on the upper one.
    let last = count.saturating_sub(1);
    let span = range.span();
    (0..count).map(move |i| {
        if i == 0 || !span.is_finite() {
            range.min
        } else if i == last {
            range.max
        } else {
            (range.min + span * i as f64 / last as f64).min(range.max)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(freq: (f64, f64)) -> WaveRanges {
        WaveRanges {
            frequency: Interval::new(freq.0, freq.1),
            ..WaveRanges::default()
        }
    }

    #[test]
    fn even_spacing_hits_both_ends() {
        let bank = WaveBank::new(5, 11, ranges((1.0, 9.0)), FrequencySpacing::Even);
        assert_eq!(bank.frequencies(), &[1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn single_even_wave_sits_at_range_min() {
        let bank = WaveBank::new(1, 3, ranges((2.5, 8.0)), FrequencySpacing::Even);
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.frequencies()[0], 2.5);
        assert!(bank.norm_factor().is_finite());
    }

    #[test]
    fn wave_count_is_truncated_to_capacity() {
        let bank = WaveBank::new(
            WAVE_CAPACITY + 57,
            1,
            WaveRanges::default(),
            FrequencySpacing::Random,
        );
        assert_eq!(bank.len(), WAVE_CAPACITY);
    }

    #[test]
    fn empty_bank_has_zero_norm() {
        let bank = WaveBank::new(0, 1, WaveRanges::default(), FrequencySpacing::Even);
        assert!(bank.is_empty());
        assert_eq!(bank.norm_factor(), 0.0);
    }

    #[test]
    fn same_seed_reproduces_bank() {
        let a = WaveBank::new(64, 2023, WaveRanges::default(), FrequencySpacing::Random);
        let b = WaveBank::new(64, 2023, WaveRanges::default(), FrequencySpacing::Random);
        assert_eq!(a, b);

        let c = WaveBank::new(64, 2024, WaveRanges::default(), FrequencySpacing::Random);
        assert_ne!(a.amplitudes(), c.amplitudes());
    }

    #[test]
    fn draws_stay_inside_ranges() {
        let r = WaveRanges::default();
        let bank = WaveBank::new(150, 99, r, FrequencySpacing::Random);
        for (f, a, p) in bank.waves() {
            assert!(r.frequency.contains(f));
            assert!(r.amplitude.contains(a));
            assert!(p >= 0.0 && p < TAU);
        }
    }

    #[test]
    fn even_frequencies_never_leave_the_range() {
        let r = WaveRanges::default();
        for n in 2..=WAVE_CAPACITY {
            let bank = WaveBank::new(n, 1, r, FrequencySpacing::Even);
            let f = bank.frequencies();
            assert_eq!(f[0], r.frequency.min);
            assert_eq!(f[n - 1], r.frequency.max);
            assert!(f.iter().all(|&v| r.frequency.contains(v)), "n = {n}");
            assert!(f.windows(2).all(|w| w[0] <= w[1]), "n = {n}");
        }
    }

    #[test]
    fn overflowing_span_is_not_valid() {
        assert!(!Interval::new(-1e308, 1e308).is_valid());
        assert!(!Interval::new(0.0, f64::INFINITY).is_valid());
        assert!(Interval::new(-1e300, 1e300).is_valid());
    }

    #[test]
    fn unbounded_ranges_collapse_to_min_without_panicking() {
        let r = WaveRanges {
            frequency: Interval::new(-1e308, 1e308),
            amplitude: Interval::new(0.5, f64::INFINITY),
            phase: Interval::new(-1e308, 1e308),
        };
        let random = WaveBank::new(4, 3, r, FrequencySpacing::Random);
        assert!(random.frequencies().iter().all(|&f| f == -1e308));
        assert!(random.amplitudes().iter().all(|&a| a == 0.5));
        assert!(random.phases().iter().all(|&p| p == -1e308));

        let even = WaveBank::new(4, 3, r, FrequencySpacing::Even);
        assert!(even.frequencies().iter().all(|&f| f == -1e308));
    }

    #[test]
    fn norm_factor_matches_amplitudes() {
        let bank = WaveBank::new(20, 5, WaveRanges::default(), FrequencySpacing::Even);
        let expected = bank
            .amplitudes()
            .iter()
            .map(|a| a * a / 2.0)
            .sum::<f64>()
            .sqrt();
        assert!((bank.norm_factor() - expected).abs() < 1e-12);
    }

    #[test]
    fn degenerate_ranges_collapse_to_min() {
        let r = WaveRanges {
            frequency: Interval::new(4.0, 4.0),
            amplitude: Interval::new(0.75, 0.75),
            phase: Interval::new(0.0, 0.0),
        };
        let bank = WaveBank::new(3, 8, r, FrequencySpacing::Random);
        assert!(bank.frequencies().iter().all(|&f| f == 4.0));
        assert!(bank.amplitudes().iter().all(|&a| a == 0.75));
        assert!(bank.phases().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn reinitialize_recomputes_from_seed() {
        let mut bank = WaveBank::new(30, 1, WaveRanges::default(), FrequencySpacing::Even);
        let fresh = WaveBank::new(30, 77, WaveRanges::default(), FrequencySpacing::Even);
        bank.reinitialize(77, WaveRanges::default(), FrequencySpacing::Even);
        assert_eq!(bank, fresh);
    }
}
