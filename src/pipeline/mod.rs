pub mod errors;
pub mod events;
pub mod orchestrator;

pub use errors::{OrchestratorError, PipelineError};
pub use events::{EventListener, ListenerRegistry, LoggingListener, ProcessingEvent};
pub use orchestrator::{ContentResult, Orchestrator, OrchestratorConfig};
