use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use crate::activations::Activation;
use crate::error::{DqnError, Result, Stage};
use super::initialization::WeightInit;

/// A fully connected (dense) layer: `activation(inputs . weights + biases)`.
///
/// The layer caches its last inputs and pre-activations during
/// [`forward_batch`](DenseLayer::forward_batch) so that
/// [`backward_batch`](DenseLayer::backward_batch) can produce gradients.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    /// Identifier used to pair this layer with its twin in another network
    pub name: String,
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with weights drawn from `init` and biases
    /// initialised the way `init` prescribes for biases.
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: &WeightInit,
        rng: &mut R,
    ) -> Self {
        DenseLayer {
            name: name.into(),
            weights: init.initialize_weights((input_size, output_size), rng),
            biases: init.initialize_biases(output_size, rng),
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Forward pass for a batch of row vectors, caching what backprop needs.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that leaves the backprop cache untouched.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Backward pass for a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)` where the
    /// adjusted error is the error with respect to the pre-activations.
    pub fn backward_batch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let (inputs, pre_activation_output) = match (&self.inputs, &self.pre_activation_output) {
            (Some(inputs), Some(pre)) => (inputs, pre),
            _ => {
                return Err(DqnError::backend(
                    Stage::Optimization,
                    format!("layer '{}' has no cached forward pass", self.name),
                ))
            }
        };
        if output_errors.dim() != pre_activation_output.dim() {
            return Err(DqnError::backend(
                Stage::Optimization,
                format!(
                    "layer '{}' received errors of shape {:?}, expected {:?}",
                    self.name,
                    output_errors.dim(),
                    pre_activation_output.dim()
                ),
            ));
        }

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Ok((adjusted_error, weight_gradients, bias_gradients))
    }
}
