use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::{Normal, Uniform};
use rand::Rng;
use rand_distr::Distribution;
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

/// Weight initialization strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    /// Normal distribution with samples beyond two standard deviations redrawn
    TruncatedNormal { mean: f32, std: f32 },

    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// He/Kaiming normal initialization (for ReLU)
    HeNormal,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::TruncatedNormal { mean: 0.0, std: 0.02 }
    }
}

impl WeightInit {
    /// Reject distribution parameters the samplers cannot be built from.
    pub fn validate(&self) -> Result<()> {
        match *self {
            WeightInit::TruncatedNormal { mean, std } => {
                if !(mean.is_finite() && std.is_finite() && std >= 0.0) {
                    return Err(DqnError::invalid_configuration(
                        "weight_init".to_string(),
                        format!("truncated normal needs a finite mean and a finite std >= 0, got mean {} std {}", mean, std),
                    ));
                }
            }
            WeightInit::Uniform { min, max } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(DqnError::invalid_configuration(
                        "weight_init".to_string(),
                        format!("uniform range needs finite bounds with min < max, got [{}, {})", min, max),
                    ));
                }
            }
            WeightInit::XavierUniform | WeightInit::HeNormal | WeightInit::Zeros => {}
        }
        Ok(())
    }

    /// Initialize weights for a layer of shape `(fan_in, fan_out)`
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::TruncatedNormal { mean, std } => {
                Array2::from_shape_simple_fn(shape, || truncated_normal(*mean, *std, rng))
            }

            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }

            WeightInit::HeNormal => {
                let std = (2.0 / fan_in.max(1) as f32).sqrt();
                match Normal::new(0.0, std) {
                    Ok(normal) => Array2::random_using(shape, normal, rng),
                    Err(_) => Array2::zeros(shape),
                }
            }

            WeightInit::Uniform { min, max } => {
                Array2::random_using(shape, Uniform::new(*min, *max), rng)
            }

            WeightInit::Zeros => Array2::zeros(shape),
        }
    }

    /// Initialize biases for a layer
    pub fn initialize_biases<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Array1<f32> {
        match self {
            WeightInit::TruncatedNormal { mean, std } => {
                Array1::from_shape_simple_fn(size, || truncated_normal(*mean, *std, rng))
            }
            WeightInit::Uniform { min, max } => {
                Array1::random_using(size, Uniform::new(*min, *max), rng)
            }
            WeightInit::XavierUniform | WeightInit::HeNormal | WeightInit::Zeros => {
                Array1::zeros(size)
            }
        }
    }
}

fn truncated_normal<R: Rng + ?Sized>(mean: f32, std: f32, rng: &mut R) -> f32 {
    let normal = match Normal::new(mean, std) {
        Ok(normal) => normal,
        Err(_) => return mean,
    };
    loop {
        let v: f32 = normal.sample(rng);
        if (v - mean).abs() <= 2.0 * std {
            return v;
        }
    }
}
