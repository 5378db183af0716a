//! Camera Orchestrator (C9): Activate/Deactivate lifecycle with
//! compensating rollback, and the process-wide composition root wiring C1,
//! C3, C5, C6, C7, C8 together.

pub mod error;
pub mod orchestrator;

pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::CameraOrchestrator;
