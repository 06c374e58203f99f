//! Tone selection for the next year.
//!
//! The weakest metric of the previous year bounds a uniform draw over
//! `[0, min_metric)`. The lower the bound, the more of the range falls under
//! the catastrophic and negative thresholds.

use rand::Rng;

use crate::model::YearMetrics;
use crate::prompt::{Persona, Tone};

/// Draws below this value are catastrophic.
pub const CATASTROPHIC_THRESHOLD: f64 = 20.0;
/// Draws below this value (and not catastrophic) are negative.
pub const NEGATIVE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSelection {
    pub tone: Tone,
    pub persona: Persona,
}

impl From<Tone> for ToneSelection {
    fn from(tone: Tone) -> Self {
        Self {
            tone,
            persona: tone.persona(),
        }
    }
}

/// Tier a single draw.
pub fn tone_for_draw(draw: f64) -> Tone {
    if draw < CATASTROPHIC_THRESHOLD {
        Tone::Catastrophic
    } else if draw < NEGATIVE_THRESHOLD {
        Tone::Negative
    } else {
        Tone::Realistic
    }
}

/// Pick the tone for the next year from the previous year's metrics.
///
/// Year 1 (`previous == None`) is always realistic and does not touch `rng`.
/// A previous minimum of 0 leaves an empty draw range and is always
/// catastrophic.
pub fn select_tone<R: Rng + ?Sized>(previous: Option<&YearMetrics>, rng: &mut R) -> ToneSelection {
    let tone = match previous {
        None => Tone::Realistic,
        Some(metrics) => match metrics.min_metric() {
            0 => Tone::Catastrophic,
            min => tone_for_draw(rng.gen_range(0.0..f64::from(min))),
        },
    };
    ToneSelection::from(tone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_first_year_is_realistic() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = select_tone(None, &mut rng);
        assert_eq!(selection.tone, Tone::Realistic);
        assert_eq!(selection.persona, Persona::NeutralAnalyst);
    }

    #[test]
    fn test_zero_minimum_is_always_catastrophic() {
        let mut rng = StdRng::seed_from_u64(7);
        let metrics = YearMetrics::new(0, 90, 90);
        for _ in 0..100 {
            let selection = select_tone(Some(&metrics), &mut rng);
            assert_eq!(selection.tone, Tone::Catastrophic);
            assert_eq!(selection.persona, Persona::CrisisVeteran);
        }
    }

    #[test]
    fn test_low_minimums_cap_the_tone() {
        let mut rng = StdRng::seed_from_u64(11);
        let weak = YearMetrics::new(20, 80, 80);
        let middling = YearMetrics::new(50, 80, 80);
        for _ in 0..1000 {
            assert_eq!(select_tone(Some(&weak), &mut rng).tone, Tone::Catastrophic);
            assert_ne!(select_tone(Some(&middling), &mut rng).tone, Tone::Realistic);
        }
    }

    #[test]
    fn test_full_range_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let metrics = YearMetrics::new(100, 100, 100);
        let trials = 20_000;
        let (mut catastrophic, mut negative, mut realistic) = (0, 0, 0);
        for _ in 0..trials {
            match select_tone(Some(&metrics), &mut rng).tone {
                Tone::Catastrophic => catastrophic += 1,
                Tone::Negative => negative += 1,
                Tone::Realistic => realistic += 1,
            }
        }
        let share = |n: i32| f64::from(n) / f64::from(trials);
        assert!((share(catastrophic) - 0.20).abs() < 0.02);
        assert!((share(negative) - 0.30).abs() < 0.02);
        assert!((share(realistic) - 0.50).abs() < 0.02);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(tone_for_draw(0.0), Tone::Catastrophic);
        assert_eq!(tone_for_draw(19.999), Tone::Catastrophic);
        assert_eq!(tone_for_draw(20.0), Tone::Negative);
        assert_eq!(tone_for_draw(49.9), Tone::Negative);
        assert_eq!(tone_for_draw(50.0), Tone::Realistic);
    }
}
