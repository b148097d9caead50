use ndarray::{Array1, ArrayView2, Axis};
use rand::Rng;

use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::network::{argmax_rows, NeuralNetwork, Topology};
use crate::optimizer::{OptimizerConfig, OptimizerWrapper, SGD};

/// Evaluation and target networks of identical topology.
///
/// The two networks never share storage: the target only changes through
/// [`sync`](ValueNetworkPair::sync), which copies every evaluation tensor into
/// the same-named target tensor.
pub struct ValueNetworkPair {
    eval: NeuralNetwork,
    target: NeuralNetwork,
    use_double: bool,
}

impl ValueNetworkPair {
    /// Build both networks with independent random initialisations. Only the
    /// evaluation network gets the configured optimizer.
    ///
    /// Dueling heads are recognised but not implemented and are rejected
    /// with [`DqnError::NotImplemented`].
    pub fn new<R: Rng + ?Sized>(
        topology: &Topology,
        init: &WeightInit,
        optimizer: &OptimizerConfig,
        use_double: bool,
        dueling: bool,
        rng: &mut R,
    ) -> Result<Self> {
        if dueling {
            return Err(DqnError::NotImplemented("dueling network architecture".to_string()));
        }

        let eval = NeuralNetwork::q_network(topology, init, optimizer.build(), rng);
        let target = NeuralNetwork::q_network(topology, init, OptimizerWrapper::SGD(SGD::new()), rng);

        Ok(ValueNetworkPair { eval, target, use_double })
    }

    /// Pair two existing networks, which must have the same layer names
    /// and shapes.
    pub fn from_networks(eval: NeuralNetwork, target: NeuralNetwork, use_double: bool) -> Result<Self> {
        let layout = |network: &NeuralNetwork| {
            network
                .layers
                .iter()
                .map(|layer| (layer.name.clone(), layer.weights.dim()))
                .collect::<Vec<_>>()
        };
        if layout(&eval) != layout(&target) {
            return Err(DqnError::dimension_mismatch(
                format!("target layers {:?}", layout(&eval)),
                format!("{:?}", layout(&target)),
            ));
        }
        Ok(ValueNetworkPair { eval, target, use_double })
    }

    pub fn eval(&self) -> &NeuralNetwork {
        &self.eval
    }

    pub fn eval_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.eval
    }

    pub fn target(&self) -> &NeuralNetwork {
        &self.target
    }

    pub fn use_double(&self) -> bool {
        self.use_double
    }

    /// Copy every evaluation parameter into the target network.
    pub fn sync(&mut self) -> Result<()> {
        self.target.copy_parameters_from(&self.eval)
    }

    /// Value estimate of each next observation.
    ///
    /// Double DQN: the evaluation network picks the action, the target
    /// network scores it. Otherwise the target network's own maximum.
    pub fn bootstrap_values(&self, next_observations: ArrayView2<f32>) -> Result<Array1<f32>> {
        let target_q = self.target.predict_batch(next_observations)?;

        if self.use_double {
            let eval_q = self.eval.predict_batch(next_observations)?;
            let actions = argmax_rows(eval_q.view());
            Ok(actions
                .iter()
                .enumerate()
                .map(|(i, &action)| target_q[[i, action]])
                .collect())
        } else {
            Ok(target_q.map_axis(Axis(1), |row| {
                row.iter().copied().fold(f32::NEG_INFINITY, f32::max)
            }))
        }
    }
}
