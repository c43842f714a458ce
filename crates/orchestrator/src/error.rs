#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no strategy registered under name '{0}'")]
    NotFound(String),

    #[error("event bus publish failed: {0}")]
    Bus(#[from] event_bus::BusError),
}
