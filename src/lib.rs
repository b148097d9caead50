//! # cartpole_dqn - Deep Q-Network training core
//!
//! A single-process, single-agent DQN / Double DQN trainer for small
//! discrete-action control tasks such as cart-pole balancing.
//!
//! ## Key Features
//!
//! - **Value networks**: evaluation and target networks with three hidden
//!   layers, synchronised by hard copy every `update_every` updates
//! - **Double DQN**: the evaluation network picks next actions, the target
//!   network scores them
//! - **Exploration**: linearly decaying epsilon-greedy schedule
//! - **Replay**: fixed-capacity ring buffer with uniform mini-batch sampling
//! - **Persistence**: bounded set of evaluation-network checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cartpole_dqn::agent::DqnAgent;
//! use cartpole_dqn::config::{DqnConfig, TrainerConfig};
//! use cartpole_dqn::env::{CartPole, Environment};
//! use cartpole_dqn::trainer::Trainer;
//!
//! let mut env = CartPole::with_seed(0);
//! let mut agent = DqnAgent::new(DqnConfig::default(), env.observation_dim(), env.num_actions()).unwrap();
//! let trainer = Trainer::new(TrainerConfig::default()).unwrap();
//! let report = trainer.run(&mut env, &mut agent).unwrap();
//! println!("{} optimisation passes", report.optimisation_passes());
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Hidden-layer non-linearities
//! - [`agent`] - The DQN agent and its evaluation/target network pair
//! - [`checkpoint`] - Evaluation-network checkpoints on disk
//! - [`config`] - Agent and trainer hyperparameters
//! - [`env`] - Environment trait and the cart-pole task
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialisation
//! - [`loss`] - Temporal-difference loss
//! - [`metrics`] - Loss and reward history
//! - [`network`] - Feed-forward network with backpropagation
//! - [`optimizer`] - SGD, RMSProp and Adam
//! - [`policy`] - Epsilon-greedy exploration
//! - [`replay_buffer`] - Transition storage and sampling
//! - [`trainer`] - Episode loop

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod policy;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
