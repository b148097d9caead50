//! Hyperparameters for the agent and the episode loop.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take the defaults below.
//!
//! ```rust
//! use cartpole_dqn::config::DqnConfig;
//!
//! let config = DqnConfig::from_json_str(r#"{ "batch_size": 64, "use_double": false }"#).unwrap();
//! assert_eq!(config.batch_size, 64);
//! assert_eq!(config.memory_size, DqnConfig::default().memory_size);
//! config.validate().unwrap();
//! ```

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::optimizer::OptimizerConfig;
use crate::policy::EpsilonSchedule;

/// Number of hidden projections in each value network
pub const HIDDEN_LAYERS: usize = 3;

/// Agent hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub batch_size: usize,
    pub memory_size: usize,
    /// Every `update_every`-th call to `train()` syncs the target network
    pub update_every: usize,
    /// Mini-batch steps per optimisation pass
    pub iteration: usize,
    pub learning_rate: f32,
    pub eps_low: f32,
    pub eps_range: f32,
    pub eps_count: usize,
    pub start_step: usize,
    pub use_double: bool,
    /// Dueling heads are not implemented; requesting them is an error
    pub dueling: bool,
    pub max_to_keep: usize,
    /// Discount on the bootstrap term
    pub gamma: f32,
    pub hidden_units: usize,
    pub hidden_layers: usize,
    pub activation: Activation,
    pub weight_init: WeightInit,
    pub optimizer: OptimizerConfig,
    pub seed: Option<u64>,
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            batch_size: 32,
            memory_size: 10_000,
            update_every: 5,
            iteration: 100,
            learning_rate: 1e-3,
            eps_low: 0.01,
            eps_range: 0.99,
            eps_count: 100,
            start_step: 0,
            use_double: true,
            dueling: false,
            max_to_keep: 5,
            gamma: 1.0,
            hidden_units: 20,
            hidden_layers: HIDDEN_LAYERS,
            activation: Activation::Relu,
            weight_init: WeightInit::default(),
            optimizer: OptimizerConfig::default(),
            seed: None,
            checkpoint_dir: None,
        }
    }
}

impl DqnConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn schedule(&self) -> EpsilonSchedule {
        EpsilonSchedule {
            eps_low: self.eps_low,
            eps_range: self.eps_range,
            eps_count: self.eps_count,
            start_step: self.start_step,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule().validate()?;
        self.weight_init.validate()?;
        self.optimizer.validate()?;

        for (name, value) in [
            ("batch_size", self.batch_size),
            ("memory_size", self.memory_size),
            ("update_every", self.update_every),
            ("iteration", self.iteration),
            ("max_to_keep", self.max_to_keep),
            ("hidden_units", self.hidden_units),
        ] {
            if value == 0 {
                return Err(DqnError::invalid_configuration(name, "must be positive"));
            }
        }
        if self.batch_size > self.memory_size {
            return Err(DqnError::invalid_configuration(
                "batch_size".to_string(),
                format!("{} exceeds memory_size {}", self.batch_size, self.memory_size),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DqnError::invalid_configuration(
                "learning_rate".to_string(),
                format!("must be a positive finite number, got {}", self.learning_rate),
            ));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(DqnError::invalid_configuration(
                "gamma".to_string(),
                format!("must be a non-negative finite number, got {}", self.gamma),
            ));
        }
        if self.hidden_layers != HIDDEN_LAYERS {
            return Err(DqnError::invalid_configuration(
                "hidden_layers".to_string(),
                format!("value networks use {} hidden layers, got {}", HIDDEN_LAYERS, self.hidden_layers),
            ));
        }
        Ok(())
    }
}

/// Episode loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Training episodes
    pub episodes: usize,
    /// Step cap for training and evaluation episodes
    pub max_steps: usize,
    /// Episodes per evaluation pass
    pub test_episodes: usize,
    /// Evaluate after every `test_every` training episodes
    pub test_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            episodes: 5,
            max_steps: 300,
            test_episodes: 10,
            test_every: 100,
        }
    }
}

impl TrainerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_steps", self.max_steps),
            ("test_episodes", self.test_episodes),
            ("test_every", self.test_every),
        ] {
            if value == 0 {
                return Err(DqnError::invalid_configuration(name, "must be positive"));
            }
        }
        Ok(())
    }
}
