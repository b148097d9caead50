use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{DqnError, Result};

/// A loss over the action values of the actions actually taken.
///
/// `predictions` holds one row of action values per transition, `actions`
/// selects one column per row and `targets` holds the bootstrapped value
/// for that selection.
pub trait Loss {
    /// Scalar loss over the batch
    fn compute(&self, predictions: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<f32>;

    /// Gradient of the loss with respect to every entry of `predictions`.
    /// Entries of actions that were not taken receive zero.
    fn gradient(&self, predictions: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<Array2<f32>>;
}

/// `0.5 * mean((target - prediction[action])^2)`
pub struct HalfMeanSquared;

fn check_batch(predictions: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<()> {
    let batch_size = predictions.nrows();
    if batch_size == 0 {
        return Err(DqnError::dimension_mismatch("a non-empty batch", "0 rows"));
    }
    if actions.len() != batch_size || targets.len() != batch_size {
        return Err(DqnError::dimension_mismatch(
            format!("{} actions and targets", batch_size),
            format!("{} actions, {} targets", actions.len(), targets.len()),
        ));
    }
    if let Some(&action) = actions.iter().find(|&&a| a >= predictions.ncols()) {
        return Err(DqnError::InvalidAction {
            action,
            num_actions: predictions.ncols(),
        });
    }
    Ok(())
}

impl Loss for HalfMeanSquared {
    fn compute(&self, predictions: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<f32> {
        check_batch(predictions, actions, targets)?;
        let sum: f32 = actions
            .iter()
            .zip(targets.iter())
            .enumerate()
            .map(|(i, (&action, &target))| {
                let diff = target - predictions[[i, action]];
                diff * diff
            })
            .sum();
        Ok(0.5 * sum / actions.len() as f32)
    }

    fn gradient(&self, predictions: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<Array2<f32>> {
        check_batch(predictions, actions, targets)?;
        let batch_size = actions.len() as f32;
        let mut gradient = Array2::zeros(predictions.dim());
        for (i, (&action, &target)) in actions.iter().zip(targets.iter()).enumerate() {
            gradient[[i, action]] = (predictions[[i, action]] - target) / batch_size;
        }
        Ok(gradient)
    }
}
