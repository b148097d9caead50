//! Episode loop: interaction, replay population, training and evaluation.
//!
//! Each training episode runs until the environment signals termination or
//! `max_steps` steps have been taken, storing every transition. After the
//! episode the agent's `train()` is called exactly once. Every `test_every`
//! episodes an evaluation pass of `test_episodes` greedy episodes runs.
//!
//! Everything happens on the calling thread; the first error halts the run.

use ndarray::Array1;
use tracing::info;

use crate::agent::{DqnAgent, TrainOutcome};
use crate::config::TrainerConfig;
use crate::env::Environment;
use crate::error::{DqnError, Result, Stage};
use crate::metrics::Evaluation;
use crate::policy::{Mode, Policy};

/// Summary of a training run
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// Training episodes completed
    pub episodes: usize,
    /// Environment steps taken during training episodes
    pub steps: usize,
    /// One entry per `train()` call, in order
    pub outcomes: Vec<TrainOutcome>,
    pub evaluations: Vec<Evaluation>,
}

impl TrainingReport {
    pub fn train_calls(&self) -> usize {
        self.outcomes.len()
    }

    pub fn optimisation_passes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TrainOutcome::Optimized { .. }))
            .count()
    }
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Trainer { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run every configured training episode.
    pub fn run<E: Environment>(&self, env: &mut E, agent: &mut DqnAgent) -> Result<TrainingReport> {
        check_shapes(env, agent)?;
        info!(
            episodes = self.config.episodes,
            max_steps = self.config.max_steps,
            "begin emulator training"
        );

        let mut report = TrainingReport::default();
        for episode in 0..self.config.episodes {
            report.steps += self.train_episode(env, agent, episode)?;

            let outcome = agent.train().map_err(|e| e.in_episode(episode))?;
            report.outcomes.push(outcome);
            report.episodes += 1;

            if (episode + 1) % self.config.test_every == 0 {
                let evaluation = self.evaluate(env, agent, episode)?;
                report.evaluations.push(evaluation);
            }
        }

        Ok(report)
    }

    /// One exploratory episode; returns the number of steps taken.
    fn train_episode<E: Environment>(&self, env: &mut E, agent: &mut DqnAgent, episode: usize) -> Result<usize> {
        let fail = |e: DqnError, stage: Stage, update: usize| e.at(stage, update).in_episode(episode);

        let mut observation = env.reset().map_err(|e| fail(e, Stage::Interaction, agent.num_train()))?;
        let mut steps = 0;
        for _ in 0..self.config.max_steps {
            let action = agent
                .pick_action(observation.view(), Policy::Greedy, Mode::Train)
                .map_err(|e| fail(e, Stage::ForwardPass, agent.num_train()))?;
            let step = env
                .step(action)
                .map_err(|e| fail(e, Stage::Interaction, agent.num_train()))?;
            steps += 1;

            agent.perceive(observation.view(), action, step.reward, step.observation.view(), step.done);
            if step.done {
                break;
            }
            observation = step.observation;
        }
        Ok(steps)
    }

    /// Held-out pass of `test_episodes` exploitation-only episodes.
    ///
    /// The rewards are appended to the agent's history.
    pub fn evaluate<E: Environment>(&self, env: &mut E, agent: &mut DqnAgent, episode: usize) -> Result<Evaluation> {
        let update = agent.num_train();
        let fail = |e: DqnError| e.at(Stage::Evaluation, update).in_episode(episode);

        let mut rewards = Vec::with_capacity(self.config.test_episodes);
        for _ in 0..self.config.test_episodes {
            let mut observation: Array1<f32> = env.reset().map_err(fail)?;
            let mut total_reward = 0.0;
            for _ in 0..self.config.max_steps {
                let action = agent
                    .pick_action(observation.view(), Policy::Greedy, Mode::Test)
                    .map_err(fail)?;
                let step = env.step(action).map_err(fail)?;
                total_reward += step.reward;
                if step.done {
                    break;
                }
                observation = step.observation;
            }
            rewards.push(total_reward);
        }

        let evaluation = Evaluation::new(episode, rewards);
        info!(
            episode,
            avg_reward = evaluation.mean_reward,
            "test at episode finished"
        );
        agent.history_mut().record_evaluation(evaluation.clone());
        Ok(evaluation)
    }
}

fn check_shapes<E: Environment>(env: &E, agent: &DqnAgent) -> Result<()> {
    if env.observation_dim() != agent.observation_dim() {
        return Err(DqnError::invalid_configuration(
            "observation_dim".to_string(),
            format!(
                "agent expects {} features, environment produces {}",
                agent.observation_dim(),
                env.observation_dim()
            ),
        ));
    }
    if env.num_actions() != agent.num_actions() {
        return Err(DqnError::invalid_configuration(
            "num_actions".to_string(),
            format!(
                "agent expects {} actions, environment offers {}",
                agent.num_actions(),
                env.num_actions()
            ),
        ));
    }
    Ok(())
}
