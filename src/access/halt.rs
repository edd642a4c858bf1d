// Halt gate - the only cross-cutting suspension mechanism

use serde::{Deserialize, Serialize};

/// Answers "is the system halted right now?"
pub trait HaltGate: Send + Sync {
    fn is_halted(&self) -> bool;
}

/// Simple in-memory pause flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSwitch {
    halted: bool,
}

impl PauseSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn resume(&mut self) {
        self.halted = false;
    }
}

impl HaltGate for PauseSwitch {
    fn is_halted(&self) -> bool {
        self.halted
    }
}
