// src/checkpoint/memory.rs

use super::{CheckpointStore, StepStatus};
use crate::errors::Result;

/// Checkpoints held in memory only (lost on exit).
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    entries: Vec<(String, StepStatus)>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, name: &str) -> StepStatus {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| *s)
            .unwrap_or(StepStatus::Pending)
    }

    fn set(&mut self, name: &str, status: StepStatus) -> Result<()> {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = status,
            None => self.entries.push((name.to_string(), status)),
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, StepStatus)>> {
        Ok(self.entries.clone())
    }
}
