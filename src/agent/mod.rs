//! # DQN Agent
//!
//! The agent owns everything that changes during training: the
//! evaluation/target network pair, the replay buffer, the exploration
//! schedule, the training counters and the loss/reward history.
//!
//! ## Training cadence
//!
//! Each call to [`DqnAgent::train`] is one *update*. Update `n` either
//! synchronises the target network (when `n % update_every == update_every - 1`,
//! followed by a checkpoint of the evaluation network) or runs `iteration`
//! mini-batch steps and records their mean loss.
//!
//! ## Example
//!
//! ```rust
//! use cartpole_dqn::agent::DqnAgent;
//! use cartpole_dqn::config::DqnConfig;
//! use cartpole_dqn::policy::{Mode, Policy};
//! use ndarray::array;
//!
//! let config = DqnConfig { batch_size: 2, iteration: 1, seed: Some(7), ..Default::default() };
//! let mut agent = DqnAgent::new(config, 4, 2).unwrap();
//!
//! let obs = array![0.01, -0.02, 0.03, 0.0];
//! let action = agent.pick_action(obs.view(), Policy::Greedy, Mode::Train).unwrap();
//! agent.perceive(obs.view(), action, 1.0, obs.view(), false);
//! agent.perceive(obs.view(), action, 1.0, obs.view(), true);
//! agent.train().unwrap();
//! assert_eq!(agent.num_train(), 1);
//! ```

mod dqn;
mod value_pair;

pub use dqn::{DqnAgent, TrainOutcome, td_targets};
pub use value_pair::ValueNetworkPair;
