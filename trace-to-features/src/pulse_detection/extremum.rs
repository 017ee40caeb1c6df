use super::Real;
use crate::error::FeatureError;
use bege_common::SampleIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtremumKind {
    Maximum,
    Minimum,
}

impl ExtremumKind {
    fn improves(self, candidate: Real, current: Real) -> bool {
        match self {
            ExtremumKind::Maximum => candidate > current,
            ExtremumKind::Minimum => candidate < current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extremum {
    pub(crate) value: Real,
    pub(crate) index: SampleIndex,
}

/// Finds the largest or smallest sample. Ties go to the first occurrence.
pub(crate) fn find_extremum(samples: &[Real], kind: ExtremumKind) -> Result<Extremum, FeatureError> {
    let (&first, rest) = samples.split_first().ok_or(FeatureError::EmptyWaveform)?;
    Ok(rest.iter().enumerate().fold(
        Extremum {
            value: first,
            index: 0,
        },
        |best, (i, &value)| {
            if kind.improves(value, best.value) {
                Extremum {
                    value,
                    index: i + 1,
                }
            } else {
                best
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    #[test]
    fn first_occurrence_wins() {
        let samples = [1.0, 3.0, -2.0, 3.0, -2.0];
        assert_eq!(
            find_extremum(&samples, ExtremumKind::Maximum),
            Ok(Extremum {
                value: 3.0,
                index: 1
            })
        );
        assert_eq!(
            find_extremum(&samples, ExtremumKind::Minimum),
            Ok(Extremum {
                value: -2.0,
                index: 2
            })
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            find_extremum(&[], ExtremumKind::Maximum),
            Err(FeatureError::EmptyWaveform)
        );
    }

    #[test]
    fn extremum_bounds_every_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(0.0, 1.0).expect("distribution is valid");
        for len in [1, 2, 17, 500] {
            let samples: Vec<Real> = normal.sample_iter(&mut rng).take(len).collect();
            let max = find_extremum(&samples, ExtremumKind::Maximum).expect("not empty");
            let min = find_extremum(&samples, ExtremumKind::Minimum).expect("not empty");
            assert!(samples.iter().all(|&v| v <= max.value && v >= min.value));
            assert_eq!(samples[max.index], max.value);
            assert_eq!(samples[min.index], min.value);
        }
    }
}
