//! # Activation Functions
//!
//! Non-linearities applied after each hidden projection of the value
//! networks. The output projection always uses [`Activation::Linear`] so the
//! network can emit negative and unbounded action values.
//!
//! ```rust
//! use cartpole_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
