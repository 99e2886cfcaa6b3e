//! Initial resource layouts.
//!
//! A field starts from one of a handful of layouts chosen in configuration.
//! Levels are given as fractions of the per-cell capacity so the same layout
//! works for any capacity.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// How the resource field is filled when a run starts or resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InitialDistribution {
    /// Every cell at the same level.
    Uniform {
        /// Level as a fraction of capacity.
        #[serde(default = "default_uniform_fraction")]
        fraction: f64,
    },
    /// Each cell drawn independently from a uniform range.
    RandomUniform {
        /// Lower bound as a fraction of capacity.
        #[serde(default = "default_min_fraction")]
        min_fraction: f64,
        /// Upper bound as a fraction of capacity.
        #[serde(default = "default_max_fraction")]
        max_fraction: f64,
    },
    /// Each cell drawn from a normal distribution, clamped to the capacity.
    Gaussian {
        /// Mean as a fraction of capacity.
        #[serde(default = "default_mean_fraction")]
        mean_fraction: f64,
        /// Standard deviation as a fraction of capacity.
        #[serde(default = "default_std_fraction")]
        std_fraction: f64,
    },
    /// A low background with a few rich patches at random centres.
    Patches {
        /// Number of patches.
        #[serde(default = "default_patch_count")]
        count: usize,
        /// Patch radius in cells.
        #[serde(default = "default_patch_radius")]
        radius: f64,
        /// Peak amount added at a patch centre, as a fraction of capacity.
        #[serde(default = "default_intensity_fraction")]
        intensity_fraction: f64,
        /// Background level as a fraction of capacity.
        #[serde(default = "default_background_fraction")]
        background_fraction: f64,
    },
}

const fn default_uniform_fraction() -> f64 {
    1.0
}

const fn default_min_fraction() -> f64 {
    0.3
}

const fn default_max_fraction() -> f64 {
    0.8
}

const fn default_mean_fraction() -> f64 {
    0.5
}

const fn default_std_fraction() -> f64 {
    0.15
}

const fn default_patch_count() -> usize {
    5
}

const fn default_patch_radius() -> f64 {
    6.0
}

const fn default_intensity_fraction() -> f64 {
    1.0
}

const fn default_background_fraction() -> f64 {
    0.1
}

impl Default for InitialDistribution {
    fn default() -> Self {
        Self::RandomUniform {
            min_fraction: default_min_fraction(),
            max_fraction: default_max_fraction(),
        }
    }
}

impl InitialDistribution {
    /// Check that every fraction is finite and in range.
    pub fn validate(&self) -> Result<(), WorldError> {
        match *self {
            Self::Uniform { fraction } => check_fraction("fraction", fraction),
            Self::RandomUniform {
                min_fraction,
                max_fraction,
            } => {
                check_fraction("min_fraction", min_fraction)?;
                check_fraction("max_fraction", max_fraction)?;
                if min_fraction > max_fraction {
                    return Err(WorldError::invalid_parameter(format!(
                        "min_fraction {min_fraction} exceeds max_fraction {max_fraction}"
                    )));
                }
                Ok(())
            }
            Self::Gaussian {
                mean_fraction,
                std_fraction,
            } => {
                check_fraction("mean_fraction", mean_fraction)?;
                if !std_fraction.is_finite() || std_fraction < 0.0 {
                    return Err(WorldError::invalid_parameter(format!(
                        "std_fraction must be a non-negative number, got {std_fraction}"
                    )));
                }
                Ok(())
            }
            Self::Patches {
                radius,
                intensity_fraction,
                background_fraction,
                ..
            } => {
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(WorldError::invalid_parameter(format!(
                        "patch radius must be positive, got {radius}"
                    )));
                }
                check_fraction("intensity_fraction", intensity_fraction)?;
                check_fraction("background_fraction", background_fraction)
            }
        }
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), WorldError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WorldError::invalid_parameter(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_is_random_uniform() {
        assert_eq!(
            InitialDistribution::default(),
            InitialDistribution::RandomUniform {
                min_fraction: 0.3,
                max_fraction: 0.8
            }
        );
    }

    #[test]
    fn yaml_fills_missing_fields() {
        let dist: InitialDistribution = serde_yml::from_str("kind: patches\ncount: 2\n").unwrap();
        match dist {
            InitialDistribution::Patches { count, radius, .. } => {
                assert_eq!(count, 2);
                assert!((radius - 6.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected distribution {other:?}"),
        }
    }

    #[test]
    fn inverted_fraction_range_is_rejected() {
        let dist = InitialDistribution::RandomUniform {
            min_fraction: 0.9,
            max_fraction: 0.1,
        };
        assert!(dist.validate().is_err());
        assert!(InitialDistribution::Uniform { fraction: 1.5 }.validate().is_err());
        assert!(InitialDistribution::default().validate().is_ok());
    }
}
