use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result, Stage};
use crate::layers::{DenseLayer, WeightInit};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// Name of the output projection in a Q-network
pub const OUTPUT_LAYER: &str = "q";

/// Shape of a Q-network: observation size, hidden stack, action count.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub observation_dim: usize,
    pub hidden_units: usize,
    pub hidden_layers: usize,
    pub num_actions: usize,
    pub activation: Activation,
}

/// Weights and biases of one layer, keyed by the layer's name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerParameters {
    pub name: String,
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// All trainable parameters of a network, in layer order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NetworkParameters {
    pub layers: Vec<LayerParameters>,
}

/// A feed-forward network of dense layers plus the optimizer that trains it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Build a Q-network: `hidden_layers` projections of `hidden_units` with
    /// the topology's activation (named `l1`, `l2`, ...), followed by a
    /// linear output projection named [`OUTPUT_LAYER`] with one unit per action.
    pub fn q_network<R: Rng + ?Sized>(
        topology: &Topology,
        init: &WeightInit,
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(topology.hidden_layers + 1);
        let mut input_size = topology.observation_dim;
        for i in 0..topology.hidden_layers {
            layers.push(DenseLayer::new(
                format!("l{}", i + 1),
                input_size,
                topology.hidden_units,
                topology.activation,
                init,
                rng,
            ));
            input_size = topology.hidden_units;
        }
        layers.push(DenseLayer::new(
            OUTPUT_LAYER,
            input_size,
            topology.num_actions,
            Activation::Linear,
            init,
            rng,
        ));

        NeuralNetwork { layers, optimizer }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(DenseLayer::input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(DenseLayer::output_size).unwrap_or(0)
    }

    fn check_input(&self, inputs: ArrayView2<f32>) -> Result<()> {
        if self.layers.is_empty() {
            return Err(DqnError::backend(Stage::ForwardPass, "network has no layers"));
        }
        if inputs.ncols() != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.ncols()),
            ));
        }
        Ok(())
    }

    /// Action values for a single observation.
    pub fn predict(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.predict_batch(input.insert_axis(Axis(0)))?;
        Ok(output.row(0).to_owned())
    }

    /// Forward pass for a batch without touching the backprop caches.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.predict_batch(current_output.view());
        }
        check_finite(current_output.view(), Stage::ForwardPass)?;
        Ok(current_output)
    }

    /// Forward pass for a batch that caches activations for
    /// [`apply_output_gradient`](NeuralNetwork::apply_output_gradient).
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        check_finite(current_output.view(), Stage::ForwardPass)?;
        Ok(current_output)
    }

    /// Backpropagate the gradient of a scalar loss with respect to the
    /// outputs of the last [`forward_batch`](NeuralNetwork::forward_batch)
    /// and take one optimizer step.
    pub fn apply_output_gradient(&mut self, output_gradient: ArrayView2<f32>, learning_rate: f32) -> Result<()> {
        let gradients = self.backward_batch(output_gradient)?;
        for (weight_gradients, bias_gradients) in &gradients {
            check_finite(weight_gradients.view(), Stage::Optimization)?;
            if bias_gradients.iter().any(|v| !v.is_finite()) {
                return Err(DqnError::backend(Stage::Optimization, "non-finite bias gradient"));
            }
        }

        for (index, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }
        self.optimizer.finish_step();
        Ok(())
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// Snapshot of every layer's parameters
    pub fn parameters(&self) -> NetworkParameters {
        NetworkParameters {
            layers: self
                .layers
                .iter()
                .map(|layer| LayerParameters {
                    name: layer.name.clone(),
                    weights: layer.weights.clone(),
                    biases: layer.biases.clone(),
                })
                .collect(),
        }
    }

    /// Overwrite this network's parameters one-for-one by layer name.
    ///
    /// Every layer must find a twin of identical shape; nothing is written
    /// unless all of them do.
    pub fn load_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        let mut sources = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let source = parameters
                .layers
                .iter()
                .find(|p| p.name == layer.name)
                .ok_or_else(|| DqnError::dimension_mismatch(
                    format!("parameters for layer '{}'", layer.name),
                    "no such layer".to_string(),
                ))?;
            if source.weights.dim() != layer.weights.dim() || source.biases.dim() != layer.biases.dim() {
                return Err(DqnError::dimension_mismatch(
                    format!("layer '{}' of shape {:?}", layer.name, layer.weights.dim()),
                    format!("shape {:?}", source.weights.dim()),
                ));
            }
            sources.push(source);
        }

        for (layer, source) in self.layers.iter_mut().zip(sources) {
            layer.weights.assign(&source.weights);
            layer.biases.assign(&source.biases);
        }
        Ok(())
    }

    /// Copy every parameter tensor of `other` into the same-named layer of `self`.
    pub fn copy_parameters_from(&mut self, other: &NeuralNetwork) -> Result<()> {
        self.load_parameters(&other.parameters())
    }
}

/// Index of the largest value; the first index wins ties.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Row-wise [`argmax`]
pub fn argmax_rows(values: ArrayView2<f32>) -> Vec<usize> {
    values.outer_iter().map(argmax).collect()
}

fn check_finite(values: ArrayView2<f32>, stage: Stage) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DqnError::backend(stage, "non-finite value in network tensor"))
    }
}
