use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::time::{sleep, Duration};

use crate::config::sim::Config;
use crate::error::{DockError, DockResult};
use crate::missions::action_context::{
    ImageSource, MotionActuator, ObjectDetector, VoltageSensor,
};
use crate::vision::{Detection, Image};

/// A base command as it was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Spin { degrees: f64, velocity: f64 },
    Straight { distance: f64, velocity: f64 },
}

#[derive(Debug)]
struct World {
    /// Distance from the camera to the dock face.
    distance: f64,
    /// Dock bearing from the camera axis, positive to the right.
    bearing: f64,
    motions: Vec<Motion>,
}

/// Deterministic robot facing a single dock.
///
/// Acts as camera, detector, base and power sensor at once. Straight moves travel along
/// the line to the dock, so only spins change the bearing.
#[derive(Debug)]
pub struct SimRobot {
    config: Config,
    frame: Bytes,
    world: Mutex<World>,
}

impl SimRobot {
    pub fn new(config: Config) -> Self {
        let frame = Bytes::from(vec![0; frame_len(config.image_width, config.image_height)]);
        let world = World {
            distance: config.start_distance,
            bearing: wrap_degrees(config.start_bearing),
            motions: vec![],
        };
        Self {
            config,
            frame,
            world: Mutex::new(world),
        }
    }

    pub fn distance(&self) -> f64 {
        self.world().distance
    }

    pub fn bearing(&self) -> f64 {
        self.world().bearing
    }

    pub fn motions(&self) -> Vec<Motion> {
        self.world().motions.clone()
    }

    pub fn in_contact(&self) -> bool {
        let world = self.world();
        world.distance <= self.config.contact_distance
            && world.bearing.abs() <= self.config.contact_bearing
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Horizontal pixel span of the dock, if the camera can see it.
    fn dock_span(&self) -> Option<(f64, f64)> {
        let world = self.world();
        let half_fov = self.config.fov_deg / 2.0;
        if world.distance > self.config.visible_range || world.bearing.abs() >= half_fov {
            return None;
        }

        let width = self.config.image_width as f64;
        let center = (0.5 + world.bearing / self.config.fov_deg) * width;
        let relative = (self.config.dock_width / world.distance.max(f64::EPSILON)).min(1.0);
        let half_span = relative * width / 2.0;
        Some((
            (center - half_span).max(0.0),
            (center + half_span).min(width),
        ))
    }

    async fn settle(&self) {
        if self.config.motion_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.motion_delay_ms)).await;
        }
    }
}

/// Byte length of a single-channel frame.
fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn wrap_degrees(angle: f64) -> f64 {
    let angle = angle % 360.0;
    if angle > 180.0 {
        angle - 360.0
    } else if angle <= -180.0 {
        angle + 360.0
    } else {
        angle
    }
}

impl ImageSource for SimRobot {
    async fn get_image(&self) -> DockResult<Image> {
        Ok(Image::new(
            self.config.image_width,
            self.config.image_height,
            self.frame.clone(),
        ))
    }
}

impl ObjectDetector for SimRobot {
    async fn get_detections(&self, image: &Image) -> DockResult<Vec<Detection>> {
        if *image.width() != self.config.image_width {
            return Err(DockError::ModelError(format!(
                "expected {} px wide input, got {}",
                self.config.image_width,
                image.width()
            )));
        }

        let height = self.config.image_height as f64;
        let rows = (height * 0.4, height * 0.6);
        let Some(span) = self.dock_span() else {
            return Ok(vec![]);
        };

        let width = self.config.image_width as f64;
        let decoy_half = width * 0.025;
        let mut detections = vec![Detection::new(&self.config.label, 0.9, span, rows)];
        detections.extend((0..self.config.decoys).map(|i| {
            let center = width * (i + 1) as f64 / (self.config.decoys + 1) as f64;
            Detection::new(
                &self.config.label,
                0.5,
                (center - decoy_half, center + decoy_half),
                rows,
            )
        }));
        Ok(detections)
    }
}

impl MotionActuator for SimRobot {
    async fn spin(&self, degrees: f64, velocity: f64) -> DockResult<()> {
        if velocity == 0.0 {
            return Err(DockError::ActuatorFault("spin with zero velocity".to_string()));
        }
        {
            let mut world = self.world();
            // Turning left (positive) swings the dock to the right of the camera axis
            world.bearing = wrap_degrees(world.bearing + degrees * velocity.signum());
            world.motions.push(Motion::Spin { degrees, velocity });
        }
        self.settle().await;
        Ok(())
    }

    async fn move_straight(&self, distance: f64, velocity: f64) -> DockResult<()> {
        if velocity == 0.0 {
            return Err(DockError::ActuatorFault(
                "move_straight with zero velocity".to_string(),
            ));
        }
        {
            let mut world = self.world();
            let travel = distance * velocity.signum();
            world.distance = (world.distance - travel).max(0.0);
            world
                .motions
                .push(Motion::Straight { distance, velocity });
        }
        self.settle().await;
        Ok(())
    }
}

impl VoltageSensor for SimRobot {
    async fn get_voltage(&self) -> DockResult<f64> {
        Ok(if self.in_contact() {
            self.config.charging_voltage
        } else {
            self.config.battery_voltage
        })
    }
}
