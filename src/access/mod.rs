// Access module - Capability checks and the system-wide halt gate
// Both are injected into every mutating operation through a CallContext

mod capability;
mod context;
mod halt;

pub use capability::{Capability, CapabilityCheck, RoleRegistry};
pub use context::{AccessError, CallContext};
pub use halt::{HaltGate, PauseSwitch};
