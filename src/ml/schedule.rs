// ============================================================
// Layer 5 — Teacher-Forcing Scheduler
// ============================================================
// Maps a learning method and a total step count to one ratio per
// step, precomputed before the loop starts. The ratio is the
// probability that the decoder is fed the ground-truth previous
// token instead of its own prediction at that step.
//
//   TeacherForcing    → constant 1.0
//   ScheduledSampling → linear descent 1.0 → 0.0
//   MixedSampling     → first half 1.0, second half the descent
//
// The descent is the closed form ratio(i, n) = 1 - i/(n-1),
// inclusive of both endpoints.
//
// Reference: Bengio et al. (2015) — Scheduled Sampling

use std::str::FromStr;

use crate::error::TranslateError;

/// The three supported teacher-forcing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningMethod {
    /// Always feed the ground-truth previous token (ratio 1.0).
    TeacherForcing,

    /// Linearly decay from full forcing to none across the run.
    ScheduledSampling,

    /// Full forcing for the first half of the run, then decay.
    MixedSampling,
}

impl FromStr for LearningMethod {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TeacherForcing"    => Ok(Self::TeacherForcing),
            "ScheduledSampling" => Ok(Self::ScheduledSampling),
            "MixedSampling"     => Ok(Self::MixedSampling),
            other => Err(TranslateError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// Build the per-step teacher-forcing schedule for a whole run.
///
/// The returned Vec has exactly `total_steps` entries, each in
/// [0.0, 1.0], indexed by global step. `total_steps == 0` yields an
/// empty schedule; a single-step ScheduledSampling run yields [1.0],
/// the start of the descent.
pub fn teacher_forcing_schedule(method: LearningMethod, total_steps: usize) -> Vec<f64> {
    match method {
        LearningMethod::TeacherForcing => vec![1.0; total_steps],
        LearningMethod::ScheduledSampling => descending_ramp(total_steps),
        LearningMethod::MixedSampling => {
            let first_half = total_steps / 2;
            let mut ratios = vec![1.0; first_half];
            ratios.extend(descending_ramp(total_steps - first_half));
            ratios
        }
    }
}

/// Parse a strategy name and build its schedule in one call.
/// Unknown names fail before any training state is touched.
pub fn schedule_for(name: &str, total_steps: usize) -> Result<Vec<f64>, TranslateError> {
    Ok(teacher_forcing_schedule(name.parse()?, total_steps))
}

/// Linear interpolation from 1.0 down to 0.0 over `n` points,
/// endpoints included.
fn descending_ramp(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n).map(|i| 1.0 - i as f64 / (n - 1) as f64).collect(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_forcing_is_all_ones() {
        for n in [0usize, 1, 2, 17, 1000] {
            let s = teacher_forcing_schedule(LearningMethod::TeacherForcing, n);
            assert_eq!(s.len(), n);
            assert!(s.iter().all(|&r| r == 1.0));
        }
    }

    #[test]
    fn scheduled_sampling_descends_from_one_to_zero() {
        for n in [2usize, 3, 10, 101] {
            let s = teacher_forcing_schedule(LearningMethod::ScheduledSampling, n);
            assert_eq!(s.len(), n);
            assert_eq!(s[0], 1.0);
            assert_eq!(s[n - 1], 0.0);
            // monotonically non-increasing
            for w in s.windows(2) {
                assert!(w[0] >= w[1], "schedule must not increase: {w:?}");
            }
        }
    }

    #[test]
    fn scheduled_sampling_boundary_cases() {
        assert!(teacher_forcing_schedule(LearningMethod::ScheduledSampling, 0).is_empty());
        // a one-step run starts (and ends) fully forced
        assert_eq!(
            teacher_forcing_schedule(LearningMethod::ScheduledSampling, 1),
            vec![1.0]
        );
    }

    #[test]
    fn mixed_sampling_is_constant_then_ramp() {
        for n in [0usize, 1, 2, 9, 10, 101] {
            let mixed = teacher_forcing_schedule(LearningMethod::MixedSampling, n);
            let mut expected =
                teacher_forcing_schedule(LearningMethod::TeacherForcing, n / 2);
            expected.extend(teacher_forcing_schedule(
                LearningMethod::ScheduledSampling,
                n - n / 2,
            ));
            assert_eq!(mixed, expected);
            assert_eq!(mixed.len(), n);
        }
    }

    #[test]
    fn ratios_stay_in_unit_interval() {
        for method in [
            LearningMethod::TeacherForcing,
            LearningMethod::ScheduledSampling,
            LearningMethod::MixedSampling,
        ] {
            for &r in &teacher_forcing_schedule(method, 57) {
                assert!((0.0..=1.0).contains(&r));
            }
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = schedule_for("bogus", 10).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedStrategy(ref s) if s == "bogus"));
    }

    #[test]
    fn known_strategy_names_parse() {
        assert_eq!(
            "TeacherForcing".parse::<LearningMethod>().unwrap(),
            LearningMethod::TeacherForcing
        );
        assert_eq!(
            "ScheduledSampling".parse::<LearningMethod>().unwrap(),
            LearningMethod::ScheduledSampling
        );
        assert_eq!(
            "MixedSampling".parse::<LearningMethod>().unwrap(),
            LearningMethod::MixedSampling
        );
    }
}
