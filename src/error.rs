use thiserror::Error;

/// Failures surfaced by configuration intake, collaborators and the command surface.
///
/// Collaborator variants carry a human readable cause. None of them are retried by the
/// docking loop; the first one ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DockError {
    /// A mandatory setting is blank or a tuning value is out of range.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Camera, detector input or power sensor could not be read.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    /// The base rejected or failed to complete a motion command.
    #[error("actuator fault: {0}")]
    ActuatorFault(String),
    /// The detector failed to produce detections.
    #[error("model error: {0}")]
    ModelError(String),
    #[error("docking is already running")]
    AlreadyRunning,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

pub type DockResult<T> = std::result::Result<T, DockError>;
