// Test modules for all components
pub mod test_agent;
pub mod test_checkpoint;
pub mod test_network;
pub mod test_policy;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::layers::WeightInit;
use crate::network::{NeuralNetwork, Topology};
use crate::optimizer::{OptimizerWrapper, SGD};

pub fn topology(observation_dim: usize, num_actions: usize) -> Topology {
    Topology {
        observation_dim,
        hidden_units: 8,
        hidden_layers: 3,
        num_actions,
        activation: Activation::Relu,
    }
}

/// A network whose output is `q` for every input: all weights are zero, so
/// only the output biases reach the result.
pub fn constant_network(observation_dim: usize, q: &[f32]) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(0);
    let mut network = NeuralNetwork::q_network(
        &topology(observation_dim, q.len()),
        &WeightInit::Zeros,
        OptimizerWrapper::SGD(SGD::new()),
        &mut rng,
    );
    if let Some(output) = network.layers.last_mut() {
        output.biases = Array1::from_vec(q.to_vec());
    }
    network
}
