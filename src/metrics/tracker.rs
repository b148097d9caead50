use serde::{Serialize, Deserialize};

/// Result of one held-out evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Training episode after which the pass ran
    pub episode: usize,
    /// Total reward of each evaluation episode
    pub rewards: Vec<f32>,
    pub mean_reward: f32,
}

impl Evaluation {
    pub fn new(episode: usize, rewards: Vec<f32>) -> Self {
        let mean_reward = mean(&rewards).unwrap_or(0.0);
        Evaluation {
            episode,
            rewards,
            mean_reward,
        }
    }
}

/// Loss and reward records kept for the lifetime of an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Mean mini-batch loss of each optimisation pass
    pub losses: Vec<f32>,

    /// Total reward of every evaluation episode, in order
    pub rewards: Vec<f32>,

    /// Evaluation passes, in order
    pub evaluations: Vec<Evaluation>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the mean loss of one optimisation pass
    pub fn record_loss(&mut self, loss: f32) {
        self.losses.push(loss);
    }

    /// Record an evaluation pass and its per-episode rewards
    pub fn record_evaluation(&mut self, evaluation: Evaluation) {
        self.rewards.extend_from_slice(&evaluation.rewards);
        self.evaluations.push(evaluation);
    }

    /// Get recent average loss
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        recent_mean(&self.losses, window)
    }

    /// Get recent average evaluation reward
    pub fn avg_reward(&self, window: usize) -> Option<f32> {
        recent_mean(&self.rewards, window)
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &str) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

pub(crate) fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

fn recent_mean(values: &[f32], window: usize) -> Option<f32> {
    let n = window.min(values.len());
    mean(&values[values.len() - n..])
}
