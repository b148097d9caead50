use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::{DqnError, Stage};
use crate::layers::WeightInit;
use crate::loss::{HalfMeanSquared, Loss};
use crate::network::{argmax, argmax_rows, NeuralNetwork, OUTPUT_LAYER};
use crate::optimizer::{OptimizerWrapper, SGD};
use super::{constant_network, topology};

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
fn test_q_network_topology() {
    let network = network(0);
    let names: Vec<&str> = network.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["l1", "l2", "l3", OUTPUT_LAYER]);
    assert_eq!(network.input_size(), 4);
    assert_eq!(network.output_size(), 2);
    assert_eq!(network.layers[0].weights.dim(), (4, 8));
    assert_eq!(network.layers[3].weights.dim(), (8, 2));
}

#[test]
fn test_predict_matches_forward_batch() {
    let mut network = network(1);
    let inputs = array![[0.1, -0.2, 0.3, 0.4], [1.0, 0.5, -0.5, 0.0]];
    let predicted = network.predict_batch(inputs.view()).unwrap();
    let forwarded = network.forward_batch(inputs.view()).unwrap();
    assert_eq!(predicted, forwarded);

    let single = network.predict(inputs.row(1)).unwrap();
    for (a, b) in single.iter().zip(predicted.row(1).iter()) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_predict_rejects_wrong_input_size() {
    let network = network(2);
    match network.predict(array![1.0, 2.0].view()) {
        Err(DqnError::DimensionMismatch { .. }) => {}
        other => panic!("expected DimensionMismatch, got {:?}", other),
    }
}

#[test]
fn test_gradient_without_forward_pass_fails() {
    let mut network = network(3);
    let gradient = Array2::zeros((1, 2));
    let err = network.apply_output_gradient(gradient.view(), 0.1).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Optimization));
}

#[test]
fn test_non_finite_output_is_a_backend_error() {
    let mut network = constant_network(4, &[0.0, 0.0]);
    network.layers[3].biases[1] = f32::NAN;
    match network.predict(array![0.0, 0.0, 0.0, 0.0].view()) {
        Err(DqnError::Backend { stage, .. }) => assert_eq!(stage, Stage::ForwardPass),
        other => panic!("expected Backend error, got {:?}", other),
    }
}

#[test]
fn test_gradient_steps_reduce_loss() {
    let mut network = network(4);
    let inputs = array![[0.5, -0.5, 0.25, 1.0], [-1.0, 0.5, 0.0, 0.5]];
    let actions = [0, 1];
    let targets = array![1.0, -1.0];

    let initial = {
        let predictions = network.predict_batch(inputs.view()).unwrap();
        HalfMeanSquared.compute(predictions.view(), &actions, targets.view()).unwrap()
    };

    for _ in 0..300 {
        let predictions = network.forward_batch(inputs.view()).unwrap();
        let gradient = HalfMeanSquared.gradient(predictions.view(), &actions, targets.view()).unwrap();
        network.apply_output_gradient(gradient.view(), 0.05).unwrap();
    }

    let predictions = network.predict_batch(inputs.view()).unwrap();
    let trained = HalfMeanSquared.compute(predictions.view(), &actions, targets.view()).unwrap();
    assert!(trained < initial * 0.5, "loss {} -> {}", initial, trained);
}

#[test]
fn test_copy_parameters_by_name() {
    let source = network(5);
    let mut copy = network(6);
    assert_ne!(copy.parameters(), source.parameters());

    copy.copy_parameters_from(&source).unwrap();
    assert_eq!(copy.parameters(), source.parameters());

    // Independent storage: changing the source leaves the copy alone.
    let mut source = source;
    source.layers[0].weights[[0, 0]] += 1.0;
    assert_ne!(copy.layers[0].weights[[0, 0]], source.layers[0].weights[[0, 0]]);
}

#[test]
fn test_load_parameters_rejects_other_topology() {
    let mut rng = StdRng::seed_from_u64(7);
    let other = NeuralNetwork::q_network(
        &topology(3, 2),
        &WeightInit::HeNormal,
        OptimizerWrapper::SGD(SGD::new()),
        &mut rng,
    );
    let mut network = network(8);
    let before = network.parameters();

    assert!(network.load_parameters(&other.parameters()).is_err());
    assert_eq!(network.parameters(), before);
}

#[test]
fn test_argmax_prefers_first_of_ties() {
    assert_eq!(argmax(array![0.5, 2.0, 2.0, -1.0].view()), 1);
    assert_eq!(argmax_rows(array![[3.0, 1.0], [0.0, 0.1]].view()), vec![0, 1]);
}
