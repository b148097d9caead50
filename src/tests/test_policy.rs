use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::DqnError;
use crate::policy::{EpsilonGreedy, EpsilonSchedule};
use super::constant_network;

fn schedule() -> EpsilonSchedule {
    EpsilonSchedule {
        eps_low: 0.1,
        eps_range: 0.8,
        eps_count: 10,
        start_step: 5,
    }
}

#[test]
fn test_epsilon_starts_at_low_plus_range() {
    let s = schedule();
    assert_eq!(s.epsilon(s.start_step), s.eps_low + s.eps_range);
}

#[test]
fn test_epsilon_clamps_at_low() {
    let s = schedule();
    for step in [15, 16, 100, 10_000] {
        assert_eq!(s.epsilon(step), s.eps_low);
    }
}

#[test]
fn test_epsilon_decays_linearly() {
    let s = schedule();
    let halfway = s.epsilon(10);
    assert!((halfway - (0.1 + 0.8 * 0.5)).abs() < 1e-6);
    assert!(s.epsilon(9) > s.epsilon(10));
    assert!(s.epsilon(10) > s.epsilon(11));
}

#[test]
fn test_epsilon_before_start_step_exceeds_upper_bound() {
    let s = schedule();
    assert!(s.epsilon(0) > s.eps_low + s.eps_range);
}

#[test]
fn test_schedule_validation() {
    assert!(schedule().validate().is_ok());

    let bad = EpsilonSchedule { eps_count: 1, ..schedule() };
    match bad.validate() {
        Err(DqnError::InvalidConfiguration { name, .. }) => assert_eq!(name, "eps_count"),
        other => panic!("expected InvalidConfiguration, got {:?}", other),
    }
}

#[test]
#[should_panic(expected = "eps_count must be greater than 1")]
fn test_epsilon_asserts_eps_count() {
    let bad = EpsilonSchedule { eps_count: 1, ..schedule() };
    bad.epsilon(0);
}

#[test]
fn test_zero_epsilon_always_exploits() {
    let network = constant_network(4, &[0.1, 0.7, -0.3]);
    let greedy = EpsilonGreedy::new(
        EpsilonSchedule { eps_low: 0.0, eps_range: 0.0, eps_count: 2, start_step: 0 },
        3,
    );
    let mut rng = StdRng::seed_from_u64(5);
    let obs = array![0.0, 1.0, 2.0, 3.0];

    for step in 0..50 {
        assert_eq!(greedy.select(&network, obs.view(), step, &mut rng).unwrap(), 1);
    }
}

#[test]
fn test_full_epsilon_samples_whole_action_space() {
    let network = constant_network(4, &[0.1, 0.7, -0.3]);
    let greedy = EpsilonGreedy::new(
        EpsilonSchedule { eps_low: 1.0, eps_range: 0.0, eps_count: 2, start_step: 0 },
        3,
    );
    let mut rng = StdRng::seed_from_u64(6);
    let obs = array![0.0, 0.0, 0.0, 0.0];

    let mut counts = [0usize; 3];
    for _ in 0..300 {
        let action = greedy.select(&network, obs.view(), 0, &mut rng).unwrap();
        assert!(action < 3);
        counts[action] += 1;
    }
    // Action 0 must be reachable.
    assert!(counts.iter().all(|&c| c > 0));
}
