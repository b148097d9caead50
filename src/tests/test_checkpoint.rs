use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;
use crate::agent::DqnAgent;
use crate::checkpoint::CheckpointManager;
use crate::config::DqnConfig;
use crate::layers::WeightInit;
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerWrapper, SGD};
use super::topology;

fn network(seed: u64) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    NeuralNetwork::q_network(
        &topology(4, 2),
        &WeightInit::HeNormal,
        OptimizerWrapper::SGD(SGD::new()),
        &mut rng,
    )
}

#[test]
fn test_save_and_load_parameters() {
    let dir = tempdir().unwrap();
    let mut manager = CheckpointManager::new(dir.path(), 3).unwrap();
    let network = network(1);

    let path = manager.save(&network, 7).unwrap();
    assert!(path.exists());
    assert_eq!(manager.latest(), Some(7));

    let loaded = manager.load(7).unwrap();
    assert_eq!(loaded, network.parameters());
}

#[test]
fn test_keeps_at_most_max_to_keep() {
    let dir = tempdir().unwrap();
    let mut manager = CheckpointManager::new(dir.path(), 2).unwrap();
    let network = network(2);

    for step in [1, 3, 5, 7] {
        manager.save(&network, step).unwrap();
    }

    assert_eq!(manager.steps(), vec![5, 7]);
    assert!(!manager.path_for(1).exists());
    assert!(!manager.path_for(3).exists());
    assert!(manager.path_for(5).exists());
    assert!(manager.load(1).is_err());

    assert_eq!(manager.dir(), dir.path());
    assert_eq!(manager.path_for(7), dir.path().join("eval-7.ckpt"));
    assert_eq!(std::fs::read_dir(manager.dir()).unwrap().count(), 2);
}

#[test]
fn test_existing_checkpoints_are_discovered() {
    let dir = tempdir().unwrap();
    {
        let mut manager = CheckpointManager::new(dir.path(), 5).unwrap();
        manager.save(&network(3), 4).unwrap();
        manager.save(&network(3), 9).unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();

    let manager = CheckpointManager::new(dir.path(), 5).unwrap();
    assert_eq!(manager.steps(), vec![4, 9]);
    assert_eq!(manager.latest(), Some(9));
}

#[test]
fn test_zero_max_to_keep_is_rejected() {
    let dir = tempdir().unwrap();
    assert!(CheckpointManager::new(dir.path(), 0).is_err());
}

#[test]
fn test_agent_checkpoints_on_sync_and_restores() {
    let dir = tempdir().unwrap();
    let config = DqnConfig {
        batch_size: 2,
        iteration: 2,
        update_every: 2,
        max_to_keep: 2,
        hidden_units: 8,
        seed: Some(9),
        checkpoint_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut agent = DqnAgent::new(config, 4, 2).unwrap();
    for i in 0..10 {
        let obs = array![i as f32 * 0.1, 0.0, 0.0, 0.0];
        agent.perceive(obs.view(), i % 2, 1.0, obs.view(), false);
    }

    // Updates 1, 3 and 5 sync and save.
    for _ in 0..6 {
        agent.train().unwrap();
    }
    let manager = agent.checkpoints().unwrap();
    assert_eq!(manager.steps(), vec![3, 5]);
    let saved = manager.load(5).unwrap();

    // Move the evaluation network away from the checkpoint, then restore.
    agent.train().unwrap();
    assert_ne!(agent.q_network().parameters(), saved);
    agent.restore(5).unwrap();
    assert_eq!(agent.q_network().parameters(), saved);
    assert_eq!(agent.networks().target().parameters(), saved);
}
