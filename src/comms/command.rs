use std::str::FromStr;

use serde_json::{json, Value};

use crate::error::{DockError, DockResult};
use crate::missions::{
    action_context::{ImageSource, MotionActuator, ObjectDetector, VoltageSensor},
    dock::DockingController,
};

/// Operations a remote control plane may invoke on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    IsRunning,
    Status,
}

impl FromStr for Command {
    type Err = DockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "is_running" | "is-running" => Ok(Self::IsRunning),
            "status" => Ok(Self::Status),
            x => Err(DockError::UnknownCommand(x.to_string())),
        }
    }
}

/// Runs `command` against `controller`, replying with a JSON value.
pub fn dispatch<Con>(controller: &DockingController<Con>, command: &str) -> DockResult<Value>
where
    Con: ImageSource + ObjectDetector + MotionActuator + VoltageSensor + 'static,
{
    Ok(match command.parse::<Command>()? {
        Command::Start => json!(controller.start()?),
        Command::Stop => json!(controller.stop()),
        Command::IsRunning => json!(controller.is_running()),
        Command::Status => json!(controller.status()),
    })
}
