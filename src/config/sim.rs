use serde::{Deserialize, Serialize};

/// Parameters of the simulated robot used by the binary and tests.
///
/// Distances are in mm, angles in degrees. The dock starts `start_distance` ahead at
/// `start_bearing` (positive is to the right of the camera axis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image_width: u32,
    pub image_height: u32,
    /// Horizontal field of view of the camera.
    pub fov_deg: f64,
    pub visible_range: f64,
    /// Dock width; the apparent width ratio is `dock_width / distance`.
    pub dock_width: f64,
    pub start_distance: f64,
    pub start_bearing: f64,
    pub contact_distance: f64,
    pub contact_bearing: f64,
    pub battery_voltage: f64,
    pub charging_voltage: f64,
    pub label: String,
    /// Extra same-label detections reported whenever the dock is in view.
    pub decoys: u32,
    pub motion_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_width: 640,
            image_height: 480,
            fov_deg: 24.0,
            visible_range: 3000.0,
            dock_width: 150.0,
            start_distance: 1500.0,
            start_bearing: 10.0,
            contact_distance: 30.0,
            contact_bearing: 5.0,
            battery_voltage: 12.6,
            charging_voltage: 13.4,
            label: "match".to_string(),
            decoys: 0,
            motion_delay_ms: 0,
        }
    }
}
