pub mod tracker;

pub use tracker::{Evaluation, TrainingHistory};
