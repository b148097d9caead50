//! Train a double DQN agent on cart-pole.
//!
//! ```text
//! cargo run --example cartpole [dqn.json] [trainer.json]
//! ```
//!
//! Set `RUST_LOG=cartpole_dqn=debug` to see every optimisation pass.

use cartpole_dqn::agent::DqnAgent;
use cartpole_dqn::config::{DqnConfig, TrainerConfig};
use cartpole_dqn::env::{CartPole, Environment};
use cartpole_dqn::error::{DqnError, Result};
use cartpole_dqn::trainer::Trainer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        if let DqnError::InsufficientData { requested, available } = e.root() {
            error!(
                requested,
                available,
                "replay buffer too small for the first update; lower batch_size or lengthen episodes"
            );
        }
        error!(error = %e, "training failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => DqnConfig::from_json_file(path)?,
        // Random cart-pole episodes are short, keep the first batch reachable.
        None => DqnConfig {
            batch_size: 16,
            seed: Some(42),
            ..Default::default()
        },
    };
    let trainer_config = match args.next() {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig {
            episodes: 200,
            test_every: 20,
            ..Default::default()
        },
    };

    let mut env = CartPole::with_seed(config.seed.unwrap_or(0));
    let mut agent = DqnAgent::new(config, env.observation_dim(), env.num_actions())?;
    let trainer = Trainer::new(trainer_config)?;

    let report = trainer.run(&mut env, &mut agent)?;

    info!(
        episodes = report.episodes,
        steps = report.steps,
        optimisation_passes = report.optimisation_passes(),
        "training finished"
    );
    for evaluation in &report.evaluations {
        info!(
            episode = evaluation.episode,
            mean_reward = evaluation.mean_reward,
            "evaluation"
        );
    }

    let history_path = "cartpole_history.json";
    agent.history().save(history_path)?;
    info!(path = history_path, "saved training history");

    Ok(())
}
