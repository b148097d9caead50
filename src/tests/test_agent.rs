use ndarray::array;
use crate::agent::{td_targets, DqnAgent, TrainOutcome, ValueNetworkPair};
use crate::config::DqnConfig;
use crate::error::{DqnError, Stage};
use crate::optimizer::OptimizerWrapper;
use crate::policy::{Mode, Policy};
use super::constant_network;

fn config() -> DqnConfig {
    DqnConfig {
        batch_size: 4,
        memory_size: 100,
        update_every: 3,
        iteration: 5,
        learning_rate: 0.01,
        hidden_units: 8,
        seed: Some(42),
        ..Default::default()
    }
}

fn fill(agent: &mut DqnAgent, n: usize) {
    for i in 0..n {
        let x = i as f32 / n as f32;
        let obs = array![x, -x, 0.5 * x, 0.1];
        let next = array![x + 0.01, -x, 0.5 * x, 0.1];
        agent.perceive(obs.view(), i % 2, 1.0, next.view(), i % 7 == 6);
    }
}

#[test]
fn test_agent_construction() {
    let agent = DqnAgent::new(config(), 4, 2).unwrap();
    assert_eq!(agent.num_train(), 0);
    assert_eq!(agent.num_actions(), 2);
    assert_eq!(agent.observation_dim(), 4);
    assert_eq!(agent.q_network().layers.len(), 4);
    assert_eq!(agent.networks().target().layers.len(), 4);
    assert!(agent.networks().use_double());
    assert!(matches!(agent.q_network().optimizer, OptimizerWrapper::RMSProp(_)));
    assert!(matches!(agent.networks().target().optimizer, OptimizerWrapper::SGD(_)));
    assert!(agent.history().losses.is_empty());
}

#[test]
fn test_dueling_is_rejected() {
    let config = DqnConfig { dueling: true, ..config() };
    match DqnAgent::new(config, 4, 2) {
        Err(DqnError::NotImplemented(what)) => assert!(what.contains("dueling")),
        Err(other) => panic!("expected NotImplemented, got {:?}", other),
        Ok(_) => panic!("dueling request must not be ignored"),
    }
}

#[test]
fn test_invalid_schedule_is_rejected() {
    let config = DqnConfig { eps_count: 1, ..config() };
    assert!(matches!(
        DqnAgent::new(config, 4, 2),
        Err(DqnError::InvalidConfiguration { .. })
    ));
}

#[test]
fn test_sync_copies_then_freezes_target() {
    let mut agent = DqnAgent::new(config(), 4, 2).unwrap();
    fill(&mut agent, 20);
    assert_ne!(
        agent.networks().eval().parameters(),
        agent.networks().target().parameters()
    );

    agent.sync_target().unwrap();
    assert_eq!(
        agent.networks().eval().parameters(),
        agent.networks().target().parameters()
    );

    let target_before = agent.networks().target().parameters();
    let eval_before = agent.networks().eval().parameters();
    agent.mini_batch().unwrap();
    assert_eq!(agent.networks().target().parameters(), target_before);
    assert_ne!(agent.networks().eval().parameters(), eval_before);
}

#[test]
fn test_mini_batch_requires_data() {
    let mut agent = DqnAgent::new(config(), 4, 2).unwrap();
    fill(&mut agent, 3);

    assert!(matches!(
        agent.mini_batch(),
        Err(DqnError::InsufficientData { requested: 4, available: 3 })
    ));

    let err = agent.train().unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Sampling));
    assert!(matches!(err.root(), DqnError::InsufficientData { .. }));
    assert_eq!(agent.num_train(), 0);
    assert!(agent.history().losses.is_empty());
}

#[test]
fn test_train_cadence() {
    let mut agent = DqnAgent::new(config(), 4, 2).unwrap();
    fill(&mut agent, 40);

    let outcomes: Vec<TrainOutcome> = (0..7).map(|_| agent.train().unwrap()).collect();
    let synced: Vec<usize> = outcomes
        .iter()
        .filter_map(|o| match o {
            TrainOutcome::Synced { update } => Some(*update),
            TrainOutcome::Optimized { .. } => None,
        })
        .collect();

    assert_eq!(synced, vec![2, 5]);
    assert_eq!(agent.num_train(), 7);
    assert_eq!(agent.history().losses.len(), 5);

    if let TrainOutcome::Optimized { mean_loss, .. } = outcomes[0] {
        assert_eq!(agent.history().losses[0], mean_loss);
        assert!(mean_loss.is_finite());
    } else {
        panic!("first update should optimise");
    }
}

#[test]
fn test_sync_branch_leaves_networks_equal() {
    let mut agent = DqnAgent::new(DqnConfig { update_every: 1, ..config() }, 4, 2).unwrap();
    assert_eq!(agent.train().unwrap(), TrainOutcome::Synced { update: 0 });
    assert_eq!(
        agent.networks().eval().parameters(),
        agent.networks().target().parameters()
    );
}

#[test]
fn test_double_dqn_decouples_selection_from_evaluation() {
    let eval = constant_network(4, &[1.0, 0.0, 0.5]);
    let target = constant_network(4, &[0.2, 0.9, 0.1]);
    let next = array![[0.3, 0.1, 0.0, -0.2]];
    let rewards = array![1.0];
    let dones = array![0.0];

    let double = ValueNetworkPair::from_networks(eval.clone(), target.clone(), true).unwrap();
    let bootstrap = double.bootstrap_values(next.view()).unwrap();
    assert!((bootstrap[0] - 0.2).abs() < 1e-6);
    let y = td_targets(rewards.view(), dones.view(), bootstrap.view(), 1.0);
    assert!((y[0] - 1.2).abs() < 1e-6);

    let standard = ValueNetworkPair::from_networks(eval, target, false).unwrap();
    let bootstrap = standard.bootstrap_values(next.view()).unwrap();
    assert!((bootstrap[0] - 0.9).abs() < 1e-6);
    let y = td_targets(rewards.view(), dones.view(), bootstrap.view(), 1.0);
    assert!((y[0] - 1.9).abs() < 1e-6);
}

#[test]
fn test_pair_rejects_mismatched_networks() {
    let eval = constant_network(4, &[1.0, 0.0]);
    let target = constant_network(4, &[1.0, 0.0, 0.0]);
    assert!(ValueNetworkPair::from_networks(eval, target, true).is_err());
}

#[test]
fn test_td_targets_mask_reward_on_done() {
    let rewards = array![1.0, 2.0];
    let dones = array![1.0, 0.0];
    let bootstrap = array![0.5, 0.5];
    let y = td_targets(rewards.view(), dones.view(), bootstrap.view(), 0.5);
    assert_eq!(y, array![0.25, 2.25]);
}

#[test]
fn test_pick_action() {
    let mut agent = DqnAgent::new(config(), 4, 2).unwrap();
    let obs = array![0.1, 0.2, 0.3, 0.4];

    let first = agent.pick_action(obs.view(), Policy::Greedy, Mode::Test).unwrap();
    for _ in 0..10 {
        assert_eq!(agent.pick_action(obs.view(), Policy::Greedy, Mode::Test).unwrap(), first);
        assert!(agent.pick_action(obs.view(), Policy::Random, Mode::Train).unwrap() < 2);
        assert!(agent.pick_action(obs.view(), Policy::Greedy, Mode::Train).unwrap() < 2);
    }

    assert!(matches!(
        agent.pick_action(array![0.1, 0.2].view(), Policy::Greedy, Mode::Train),
        Err(DqnError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_epsilon_follows_train_counter() {
    let config = DqnConfig { eps_low: 0.1, eps_range: 0.5, eps_count: 4, update_every: 1, ..config() };
    let mut agent = DqnAgent::new(config, 4, 2).unwrap();
    assert!((agent.epsilon() - 0.6).abs() < 1e-6);
    for _ in 0..4 {
        agent.train().unwrap();
    }
    assert!((agent.epsilon() - 0.1).abs() < 1e-6);
}

#[test]
fn test_seeded_agents_are_reproducible() {
    let mut a = DqnAgent::new(config(), 4, 2).unwrap();
    let mut b = DqnAgent::new(config(), 4, 2).unwrap();
    fill(&mut a, 20);
    fill(&mut b, 20);
    assert_eq!(a.train().unwrap(), b.train().unwrap());
    assert_eq!(a.networks().eval().parameters(), b.networks().eval().parameters());
}
