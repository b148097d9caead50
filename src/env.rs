//! Environments the agent can be trained against.

use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{DqnError, Result};

/// Outcome of one environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

/// An episodic environment with a flat observation vector and a discrete
/// action space `[0, num_actions)`.
pub trait Environment {
    /// Start a new episode and return its first observation
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Apply `action` and advance one step
    fn step(&mut self, action: usize) -> Result<Step>;

    /// Length of every observation vector
    fn observation_dim(&self) -> usize;

    /// Number of discrete actions
    fn num_actions(&self) -> usize;
}

/// Classic cart-pole balancing task.
///
/// Action 0 pushes the cart left, action 1 pushes it right. Every step
/// earns a reward of 1.0; the episode ends when the cart leaves
/// `[-2.4, 2.4]` or the pole tilts more than 12 degrees.
pub struct CartPole {
    x: f32,          // cart position
    x_dot: f32,      // cart velocity
    theta: f32,      // pole angle (radians)
    theta_dot: f32,  // pole angular velocity

    // Constants
    gravity: f32,
    mass_cart: f32,
    mass_pole: f32,
    length: f32,
    force_mag: f32,
    dt: f32,
    theta_threshold: f32,
    x_threshold: f32,

    rng: StdRng,
}

impl CartPole {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 10.0,
            dt: 0.02,
            theta_threshold: 12.0 * 2.0 * std::f32::consts::PI / 360.0,
            x_threshold: 2.4,
            rng,
        }
    }

    fn state(&self) -> Array1<f32> {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for CartPole {
    fn reset(&mut self) -> Result<Array1<f32>> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        Ok(self.state())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if action >= 2 {
            return Err(DqnError::InvalidAction { action, num_actions: 2 });
        }

        let force = if action == 0 { -self.force_mag } else { self.force_mag };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();
        let total_mass = self.mass_cart + self.mass_pole;
        let pole_mass_length = self.mass_pole * self.length;

        let temp = (force + pole_mass_length * self.theta_dot * self.theta_dot * sin_theta) / total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length * (4.0 / 3.0 - self.mass_pole * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.x += self.dt * self.x_dot;
        self.x_dot += self.dt * x_acc;
        self.theta += self.dt * self.theta_dot;
        self.theta_dot += self.dt * theta_acc;

        let done = self.x.abs() > self.x_threshold || self.theta.abs() > self.theta_threshold;

        Ok(Step {
            observation: self.state(),
            reward: 1.0,
            done,
        })
    }

    fn observation_dim(&self) -> usize {
        4
    }

    fn num_actions(&self) -> usize {
        2
    }
}
