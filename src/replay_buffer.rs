use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use std::collections::VecDeque;

use crate::error::{DqnError, Result};

/// One recorded step of interaction with the environment
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_observation: Array1<f32>,
    pub done: bool,
}

/// A sampled batch decomposed into parallel arrays, one row per transition
#[derive(Clone, Debug)]
pub struct MiniBatch {
    pub observations: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_observations: Array2<f32>,
    /// 1.0 where the transition ended an episode, 0.0 otherwise
    pub dones: Array1<f32>,
}

impl MiniBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let observation_dim = transitions
            .first()
            .map(|t| t.observation.len())
            .ok_or_else(|| DqnError::dimension_mismatch("a non-empty batch", "0 transitions"))?;
        let batch_size = transitions.len();

        let mut observations = Array2::zeros((batch_size, observation_dim));
        let mut next_observations = Array2::zeros((batch_size, observation_dim));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, transition) in transitions.iter().enumerate() {
            if transition.observation.len() != observation_dim
                || transition.next_observation.len() != observation_dim
            {
                return Err(DqnError::dimension_mismatch(
                    format!("observations of length {}", observation_dim),
                    format!(
                        "{} and {}",
                        transition.observation.len(),
                        transition.next_observation.len()
                    ),
                ));
            }
            observations.row_mut(i).assign(&transition.observation);
            next_observations.row_mut(i).assign(&transition.next_observation);
            actions.push(transition.action);
            rewards[i] = transition.reward;
            dones[i] = if transition.done { 1.0 } else { 0.0 };
        }

        Ok(MiniBatch {
            observations,
            actions,
            rewards,
            next_observations,
            dones,
        })
    }
}

/// Fixed-capacity transition store. Once full, every insertion evicts the
/// oldest transition.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a transition, overwriting the oldest one when at capacity.
    pub fn put(
        &mut self,
        observation: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_observation: ArrayView1<f32>,
        done: bool,
    ) {
        self.add(Transition {
            observation: observation.to_owned(),
            action,
            reward,
            next_observation: next_observation.to_owned(),
            done,
        });
    }

    pub fn add(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` transitions independently and uniformly at random.
    ///
    /// Fails with [`DqnError::InsufficientData`] while fewer than
    /// `batch_size` transitions have been recorded.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<MiniBatch> {
        if batch_size == 0 || self.buffer.len() < batch_size {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        let picked: Vec<&Transition> = (0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..self.buffer.len())])
            .collect();
        MiniBatch::from_transitions(&picked)
    }

    /// Transitions from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
