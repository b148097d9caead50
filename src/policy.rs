//! Time-decaying epsilon-greedy exploration.
//!
//! The exploration rate falls linearly from `eps_low + eps_range` at
//! `start_step` to `eps_low` at `start_step + eps_count` and stays there:
//!
//! ```text
//! eps = eps_low + eps_range * max(0, eps_count - train_step + start_step) / eps_count
//! ```
//!
//! Before `start_step` the rate is above `eps_low + eps_range`; callers
//! compare it with a uniform draw so values above one simply mean
//! "always explore".

use ndarray::ArrayView1;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};
use crate::network::{argmax, NeuralNetwork};

/// Parameters of the linear epsilon decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub eps_low: f32,
    pub eps_range: f32,
    pub eps_count: usize,
    pub start_step: usize,
}

impl EpsilonSchedule {
    /// Reject schedules that would divide by zero or never decay.
    pub fn validate(&self) -> Result<()> {
        if self.eps_count <= 1 {
            return Err(DqnError::invalid_configuration(
                "eps_count".to_string(),
                format!("must be greater than 1, got {}", self.eps_count),
            ));
        }
        if !(self.eps_low >= 0.0 && self.eps_range >= 0.0) {
            return Err(DqnError::invalid_configuration(
                "eps_low/eps_range",
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Exploration rate at `train_step`.
    ///
    /// # Panics
    ///
    /// Panics if `eps_count <= 1`; configurations are validated before an
    /// agent is built, so reaching this is a programming error.
    pub fn epsilon(&self, train_step: usize) -> f32 {
        assert!(self.eps_count > 1, "eps_count must be greater than 1");

        let remaining = (self.eps_count + self.start_step).saturating_sub(train_step);
        self.eps_low + self.eps_range * remaining as f32 / self.eps_count as f32
    }
}

/// Where an action comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Epsilon-greedy over the evaluation network
    Greedy,
    /// Uniform over the action space
    Random,
}

/// Whether exploration is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    /// Pure exploitation
    Test,
}

/// Epsilon-greedy action selector over an evaluation network
#[derive(Debug, Clone, Copy)]
pub struct EpsilonGreedy {
    pub schedule: EpsilonSchedule,
    pub num_actions: usize,
}

impl EpsilonGreedy {
    pub fn new(schedule: EpsilonSchedule, num_actions: usize) -> Self {
        EpsilonGreedy { schedule, num_actions }
    }

    /// Uniform action over `[0, num_actions)`
    pub fn random_action<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.num_actions)
    }

    /// Action with the highest value according to `network`
    pub fn greedy_action(&self, network: &NeuralNetwork, observation: ArrayView1<f32>) -> Result<usize> {
        let q_values = network.predict(observation)?;
        Ok(argmax(q_values.view()))
    }

    /// Explore with probability `epsilon(train_step)`, otherwise exploit.
    pub fn select<R: Rng + ?Sized>(
        &self,
        network: &NeuralNetwork,
        observation: ArrayView1<f32>,
        train_step: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let eps = self.schedule.epsilon(train_step);
        if rng.gen::<f32>() < eps {
            Ok(self.random_action(rng))
        } else {
            self.greedy_action(network, observation)
        }
    }
}
