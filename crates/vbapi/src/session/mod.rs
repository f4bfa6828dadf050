//! Session lifecycle: handshake gate and the manager that owns it.

mod gate;
mod manager;

pub use gate::{InitGate, SessionPhase};
pub use manager::SessionManager;
