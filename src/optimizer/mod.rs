//! Gradient-descent optimizers for the evaluation network.
//!
//! Optimizer state (moving averages) is kept per layer index and allocated
//! lazily on the first update of that layer, so an optimizer can be built
//! from configuration before the network exists.

use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Called once after every layer has been updated for one gradient step
    fn finish_step(&mut self) {}
}

/// Optimizer selection as it appears in configuration files
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd,
    RmsProp { decay: f32, epsilon: f32 },
    Adam { beta1: f32, beta2: f32, epsilon: f32 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::RmsProp { decay: 0.9, epsilon: 1e-10 }
    }
}

impl OptimizerConfig {
    /// Decay rates must lie in `[0, 1)` and the denominator epsilon must be
    /// positive and finite.
    pub fn validate(&self) -> Result<()> {
        let (rates, epsilon) = match *self {
            OptimizerConfig::Sgd => return Ok(()),
            OptimizerConfig::RmsProp { decay, epsilon } => (vec![("decay", decay)], epsilon),
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                (vec![("beta1", beta1), ("beta2", beta2)], epsilon)
            }
        };
        for (name, rate) in rates {
            if !(0.0..1.0).contains(&rate) {
                return Err(DqnError::invalid_configuration(
                    "optimizer".to_string(),
                    format!("{} must lie in [0, 1), got {}", name, rate),
                ));
            }
        }
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(DqnError::invalid_configuration(
                "optimizer".to_string(),
                format!("epsilon must be positive and finite, got {}", epsilon),
            ));
        }
        Ok(())
    }

    pub fn build(&self) -> OptimizerWrapper {
        match *self {
            OptimizerConfig::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerConfig::RmsProp { decay, epsilon } => {
                OptimizerWrapper::RMSProp(RMSProp::new(decay, epsilon))
            }
            OptimizerConfig::Adam { beta1, beta2, epsilon } => {
                OptimizerWrapper::Adam(Adam::new(beta1, beta2, epsilon))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn finish_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.finish_step(),
        }
    }
}

/// Per-layer slot storage, grown on demand
fn slot<'a, A: Clone>(slots: &'a mut Vec<Option<A>>, layer: usize, zeros: impl FnOnce() -> A) -> &'a mut A {
    if slots.len() <= layer {
        slots.resize(layer + 1, None);
    }
    slots[layer].get_or_insert_with(zeros)
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// RMSProp optimizer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RMSProp {
    pub decay: f32,
    pub epsilon: f32,
    v_weights: Vec<Option<Array2<f32>>>,
    v_biases: Vec<Option<Array1<f32>>>,
}

impl RMSProp {
    pub fn new(decay: f32, epsilon: f32) -> Self {
        RMSProp {
            decay,
            epsilon,
            v_weights: Vec::new(),
            v_biases: Vec::new(),
        }
    }
}

impl Default for RMSProp {
    fn default() -> Self {
        Self::new(0.9, 1e-10)
    }
}

impl Optimizer for RMSProp {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (decay, epsilon) = (self.decay, self.epsilon);
        let v = slot(&mut self.v_weights, layer, || Array2::zeros(weights.dim()));

        // Moving average of squared gradients
        v.zip_mut_with(gradients, |v, &g| *v = decay * *v + (1.0 - decay) * g * g);

        ndarray::Zip::from(weights)
            .and(gradients)
            .and(&*v)
            .for_each(|w, &g, &v| *w -= learning_rate * g / (v.sqrt() + epsilon));
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (decay, epsilon) = (self.decay, self.epsilon);
        let v = slot(&mut self.v_biases, layer, || Array1::zeros(biases.dim()));

        v.zip_mut_with(gradients, |v, &g| *v = decay * *v + (1.0 - decay) * g * g);

        ndarray::Zip::from(biases)
            .and(gradients)
            .and(&*v)
            .for_each(|b, &g, &v| *b -= learning_rate * g / (v.sqrt() + epsilon));
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Option<Array2<f32>>>,
    v_weights: Vec<Option<Array2<f32>>>,
    m_biases: Vec<Option<Array1<f32>>>,
    v_biases: Vec<Option<Array1<f32>>>,
    pub t: usize,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: Vec::new(),
            v_weights: Vec::new(),
            m_biases: Vec::new(),
            v_biases: Vec::new(),
            t: 1,
        }
    }

    fn corrections(&self) -> (f32, f32) {
        (
            1.0 - self.beta1.powi(self.t as i32),
            1.0 - self.beta2.powi(self.t as i32),
        )
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();
        let m = slot(&mut self.m_weights, layer, || Array2::zeros(weights.dim()));
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let v = slot(&mut self.v_weights, layer, || Array2::zeros(weights.dim()));
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let m = &self.m_weights[layer];
        let v = &self.v_weights[layer];
        if let (Some(m), Some(v)) = (m, v) {
            ndarray::Zip::from(weights)
                .and(m)
                .and(v)
                .for_each(|w, &m, &v| *w -= learning_rate * (m / c1) / ((v / c2).sqrt() + epsilon));
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();
        let m = slot(&mut self.m_biases, layer, || Array1::zeros(biases.dim()));
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let v = slot(&mut self.v_biases, layer, || Array1::zeros(biases.dim()));
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let m = &self.m_biases[layer];
        let v = &self.v_biases[layer];
        if let (Some(m), Some(v)) = (m, v) {
            ndarray::Zip::from(biases)
                .and(m)
                .and(v)
                .for_each(|b, &m, &v| *b -= learning_rate * (m / c1) / ((v / c2).sqrt() + epsilon));
        }
    }

    fn finish_step(&mut self) {
        self.t += 1;
    }
}
