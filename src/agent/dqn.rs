use std::time::Instant;

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::checkpoint::CheckpointManager;
use crate::config::DqnConfig;
use crate::error::{DqnError, Result, Stage};
use crate::loss::{HalfMeanSquared, Loss};
use crate::metrics::TrainingHistory;
use crate::network::{NeuralNetwork, Topology};
use crate::policy::{EpsilonGreedy, Mode, Policy};
use crate::replay_buffer::{MiniBatch, ReplayBuffer};
use super::value_pair::ValueNetworkPair;

/// What a call to [`DqnAgent::train`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// Target network synchronised from the evaluation network
    Synced { update: usize },
    /// `iteration` mini-batch steps ran with this mean loss
    Optimized { update: usize, mean_loss: f32 },
}

/// Deep Q-Network agent with a target network and optional Double DQN.
pub struct DqnAgent {
    config: DqnConfig,
    networks: ValueNetworkPair,
    replay_buffer: ReplayBuffer,
    explorer: EpsilonGreedy,
    loss: HalfMeanSquared,
    history: TrainingHistory,
    /// Completed calls to `train()`; also the exploration clock
    num_train: usize,
    checkpoints: Option<CheckpointManager>,
    observation_dim: usize,
    rng: StdRng,
}

impl DqnAgent {
    /// Create an agent for an environment with `observation_dim` features
    /// and `num_actions` discrete actions.
    pub fn new(config: DqnConfig, observation_dim: usize, num_actions: usize) -> Result<Self> {
        config.validate()?;
        if observation_dim == 0 || num_actions == 0 {
            return Err(DqnError::invalid_configuration(
                "environment shape".to_string(),
                format!("{} observation features, {} actions", observation_dim, num_actions),
            ));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let topology = Topology {
            observation_dim,
            hidden_units: config.hidden_units,
            hidden_layers: config.hidden_layers,
            num_actions,
            activation: config.activation,
        };
        let networks = ValueNetworkPair::new(
            &topology,
            &config.weight_init,
            &config.optimizer,
            config.use_double,
            config.dueling,
            &mut rng,
        )?;

        let checkpoints = match &config.checkpoint_dir {
            Some(dir) => Some(CheckpointManager::new(dir, config.max_to_keep)?),
            None => None,
        };

        Ok(DqnAgent {
            replay_buffer: ReplayBuffer::new(config.memory_size),
            explorer: EpsilonGreedy::new(config.schedule(), num_actions),
            loss: HalfMeanSquared,
            history: TrainingHistory::new(),
            num_train: 0,
            checkpoints,
            observation_dim,
            networks,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn networks(&self) -> &ValueNetworkPair {
        &self.networks
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut TrainingHistory {
        &mut self.history
    }

    pub fn checkpoints(&self) -> Option<&CheckpointManager> {
        self.checkpoints.as_ref()
    }

    /// Number of completed `train()` calls
    pub fn num_train(&self) -> usize {
        self.num_train
    }

    pub fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    pub fn num_actions(&self) -> usize {
        self.explorer.num_actions
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.explorer.schedule.epsilon(self.num_train)
    }

    fn check_observation(&self, observation: ArrayView1<f32>) -> Result<()> {
        if observation.len() != self.observation_dim {
            return Err(DqnError::dimension_mismatch(
                format!("observation of length {}", self.observation_dim),
                format!("length {}", observation.len()),
            ));
        }
        Ok(())
    }

    /// Choose an action for `observation`.
    ///
    /// `Policy::Random` ignores the network. `Policy::Greedy` is
    /// epsilon-greedy in `Mode::Train` and pure exploitation in `Mode::Test`.
    pub fn pick_action(&mut self, observation: ArrayView1<f32>, policy: Policy, mode: Mode) -> Result<usize> {
        self.check_observation(observation)?;
        match (policy, mode) {
            (Policy::Random, _) => Ok(self.explorer.random_action(&mut self.rng)),
            (Policy::Greedy, Mode::Train) => {
                self.explorer
                    .select(self.networks.eval(), observation, self.num_train, &mut self.rng)
            }
            (Policy::Greedy, Mode::Test) => self.explorer.greedy_action(self.networks.eval(), observation),
        }
    }

    /// Store one transition in the replay buffer.
    pub fn perceive(
        &mut self,
        observation: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_observation: ArrayView1<f32>,
        done: bool,
    ) {
        self.replay_buffer.put(observation, action, reward, next_observation, done);
    }

    /// One training update: either a target sync plus checkpoint, or an
    /// optimisation pass. The update counter advances only on success.
    pub fn train(&mut self) -> Result<TrainOutcome> {
        let update = self.num_train;
        let every = self.config.update_every;

        let outcome = if update % every == every - 1 {
            self.sync_target().map_err(|e| e.at(Stage::Synchronization, update))?;
            self.save_checkpoint(update).map_err(|e| e.at(Stage::Checkpoint, update))?;
            TrainOutcome::Synced { update }
        } else {
            let mean_loss = self.optimize()?;
            TrainOutcome::Optimized { update, mean_loss }
        };

        self.num_train += 1;
        Ok(outcome)
    }

    /// Copy the evaluation network into the target network.
    pub fn sync_target(&mut self) -> Result<()> {
        info!(update = self.num_train + 1, "synchronising target network");
        self.networks.sync()
    }

    fn save_checkpoint(&mut self, step: usize) -> Result<()> {
        match self.checkpoints.as_mut() {
            Some(manager) => {
                manager.save(self.networks.eval(), step)?;
            }
            None => debug!(step, "no checkpoint directory configured, skipping save"),
        }
        Ok(())
    }

    /// Load the evaluation network from the checkpoint saved at `step` and
    /// resynchronise the target network.
    pub fn restore(&mut self, step: usize) -> Result<()> {
        let manager = self.checkpoints.as_ref().ok_or_else(|| {
            DqnError::invalid_configuration("checkpoint_dir", "no checkpoint directory configured")
        })?;
        let parameters = manager.load(step)?;
        self.networks.eval_mut().load_parameters(&parameters)?;
        self.networks.sync()
    }

    /// Run `iteration` mini-batch steps and record their mean loss.
    pub fn optimize(&mut self) -> Result<f32> {
        let update = self.num_train;
        info!(update = update + 1, iterations = self.config.iteration, "begin optimisation pass");
        let start = Instant::now();

        let mut losses = Vec::with_capacity(self.config.iteration);
        for _ in 0..self.config.iteration {
            let loss = self.mini_batch().map_err(|e| {
                let stage = stage_of(&e);
                e.at(stage, update)
            })?;
            losses.push(loss);
        }

        let mean_loss = losses.iter().sum::<f32>() / losses.len().max(1) as f32;
        self.history.record_loss(mean_loss);
        info!(
            update = update + 1,
            elapsed_ms = start.elapsed().as_millis() as u64,
            avg_loss = mean_loss,
            "optimisation pass finished"
        );
        Ok(mean_loss)
    }

    /// One gradient step on a freshly sampled mini-batch. Returns the loss
    /// measured before the step.
    pub fn mini_batch(&mut self) -> Result<f32> {
        let batch = self.replay_buffer.sample(self.config.batch_size, &mut self.rng)?;
        let targets = self.targets(&batch)?;

        let eval = self.networks.eval_mut();
        let predictions = eval.forward_batch(batch.observations.view())?;
        let loss = self.loss.compute(predictions.view(), &batch.actions, targets.view())?;
        if !loss.is_finite() {
            return Err(DqnError::backend(Stage::Optimization, format!("loss is {}", loss)));
        }
        let gradient = self.loss.gradient(predictions.view(), &batch.actions, targets.view())?;
        eval.apply_output_gradient(gradient.view(), self.config.learning_rate)?;

        Ok(loss)
    }

    fn targets(&self, batch: &MiniBatch) -> Result<Array1<f32>> {
        let bootstrap = self.networks.bootstrap_values(batch.next_observations.view())?;
        Ok(td_targets(
            batch.rewards.view(),
            batch.dones.view(),
            bootstrap.view(),
            self.config.gamma,
        ))
    }

    /// The evaluation network
    pub fn q_network(&self) -> &NeuralNetwork {
        self.networks.eval()
    }
}

/// `(1 - done) * reward + gamma * bootstrap`, element-wise.
///
/// The done flag masks the reward term; the bootstrap term is added for
/// every transition.
pub fn td_targets(
    rewards: ArrayView1<f32>,
    dones: ArrayView1<f32>,
    bootstrap: ArrayView1<f32>,
    gamma: f32,
) -> Array1<f32> {
    (dones.mapv(|d| 1.0 - d) * &rewards) + &bootstrap.mapv(|v| gamma * v)
}

fn stage_of(err: &DqnError) -> Stage {
    match err.root() {
        DqnError::InsufficientData { .. } => Stage::Sampling,
        DqnError::Backend { stage, .. } => *stage,
        DqnError::DimensionMismatch { .. } => Stage::ForwardPass,
        _ => Stage::Optimization,
    }
}
