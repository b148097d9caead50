//! Evaluation-network checkpoints on disk.
//!
//! Each checkpoint is the bincode encoding of [`NetworkParameters`] stored as
//! `<dir>/eval-<step>.ckpt`. At most `max_to_keep` files are retained; the
//! lowest step is deleted first.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{DqnError, Result};
use crate::network::{NetworkParameters, NeuralNetwork};

const PREFIX: &str = "eval-";
const EXTENSION: &str = "ckpt";

pub struct CheckpointManager {
    dir: PathBuf,
    max_to_keep: usize,
    kept: BTreeMap<usize, PathBuf>,
}

impl CheckpointManager {
    /// Open (creating if needed) a checkpoint directory and index the
    /// checkpoints already in it.
    pub fn new<P: AsRef<Path>>(dir: P, max_to_keep: usize) -> Result<Self> {
        if max_to_keep == 0 {
            return Err(DqnError::invalid_configuration("max_to_keep", "must be positive"));
        }
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut kept = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(step) = step_of(&path) {
                kept.insert(step, path);
            }
        }

        let mut manager = CheckpointManager { dir, max_to_keep, kept };
        manager.prune()?;
        Ok(manager)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{}{}.{}", PREFIX, step, EXTENSION))
    }

    /// Steps with a retained checkpoint, ascending
    pub fn steps(&self) -> Vec<usize> {
        self.kept.keys().copied().collect()
    }

    pub fn latest(&self) -> Option<usize> {
        self.kept.keys().next_back().copied()
    }

    /// Persist `network`'s parameters under `step`.
    pub fn save(&mut self, network: &NeuralNetwork, step: usize) -> Result<PathBuf> {
        let path = self.path_for(step);
        let serialized = bincode::serialize(&network.parameters())?;
        fs::write(&path, serialized)?;
        info!(step, path = %path.display(), "saved evaluation network checkpoint");

        self.kept.insert(step, path.clone());
        self.prune()?;
        Ok(path)
    }

    pub fn load(&self, step: usize) -> Result<NetworkParameters> {
        let path = self.kept.get(&step).cloned().unwrap_or_else(|| self.path_for(step));
        let data = fs::read(&path)?;
        Ok(bincode::deserialize(&data)?)
    }

    fn prune(&mut self) -> Result<()> {
        while self.kept.len() > self.max_to_keep {
            let oldest = match self.kept.keys().next().copied() {
                Some(step) => step,
                None => break,
            };
            if let Some(path) = self.kept.remove(&oldest) {
                debug!(step = oldest, path = %path.display(), "removing old checkpoint");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(())
    }
}

fn step_of(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.strip_prefix(PREFIX)?.parse().ok()
}
