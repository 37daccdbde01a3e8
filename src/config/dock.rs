use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DockError, DockResult};

/// Docking loop tuning.
///
/// Velocities are in base units per second (mm/s, deg/s), distances in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection_class: String,
    pub spin_velocity: i32,
    pub straight_velocity: i32,
    pub search_spin_deg: f64,
    pub straight_distance: f64,
    /// Normalized horizontal offset allowed before steering, in (0, 1).
    pub center_tolerance: f64,
    /// Frames without exactly one target tolerated before a search spin.
    pub detection_try_max: u32,
    /// Bounding box to image width ratio that starts the final dock, in (0, 1).
    pub close_percent: f64,
    pub max_search_tries: u32,
    pub max_dock_tries: u32,
    /// Upper bound on any single camera, detector, base or sensor call.
    pub call_timeout_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection_class: "match".to_string(),
            spin_velocity: 800,
            straight_velocity: 350,
            search_spin_deg: 4.0,
            straight_distance: 50.0,
            center_tolerance: 0.05,
            detection_try_max: 4,
            close_percent: 0.45,
            max_search_tries: 100,
            max_dock_tries: 10,
            call_timeout_secs: 30.0,
        }
    }
}

impl Config {
    /// Saturates instead of panicking; `validate` rejects out of range values.
    pub fn call_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.call_timeout_secs).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> DockResult<()> {
        fn invalid(msg: String) -> DockResult<()> {
            Err(DockError::ConfigInvalid(msg))
        }

        if self.detection_class.trim().is_empty() {
            return invalid("detection_class must be defined".to_string());
        }
        for (name, value) in [
            ("spin_velocity", self.spin_velocity as f64),
            ("straight_velocity", self.straight_velocity as f64),
            ("search_spin_deg", self.search_spin_deg),
            ("straight_distance", self.straight_distance),
            ("detection_try_max", self.detection_try_max as f64),
            ("max_search_tries", self.max_search_tries as f64),
            ("max_dock_tries", self.max_dock_tries as f64),
            ("call_timeout_secs", self.call_timeout_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        for (name, value) in [
            ("center_tolerance", self.center_tolerance),
            ("close_percent", self.close_percent),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return invalid(format!("{name} must be within (0, 1), got {value}"));
            }
        }
        if let Err(e) = Duration::try_from_secs_f64(self.call_timeout_secs) {
            return invalid(format!("call_timeout_secs is not a duration: {e}"));
        }
        Ok(())
    }
}
