use std::{
    collections::VecDeque,
    future::pending,
    sync::{
        atomic::{AtomicU32, Ordering},
        Mutex,
    },
};

use bytes::Bytes;

use crate::comms::sim::Motion;
use crate::error::{DockError, DockResult};
use crate::vision::{Detection, Image};

use super::action_context::{ImageSource, MotionActuator, ObjectDetector, VoltageSensor};

/// Collaborator double replaying canned detections and voltages.
///
/// Queued frames are served in order, then `repeat` (or nothing) forever. The last
/// queued voltage is repeated once the queue drains.
#[derive(Debug)]
pub(crate) struct Scripted {
    width: u32,
    frames: Mutex<VecDeque<Vec<Detection>>>,
    repeat: Vec<Detection>,
    voltages: Mutex<VecDeque<f64>>,
    motions: Mutex<Vec<Motion>>,
    detector_calls: AtomicU32,
    detector_error: Option<DockError>,
    voltage_error: Option<DockError>,
    camera_panic: Option<&'static str>,
    hang_motion: bool,
}

impl Default for Scripted {
    fn default() -> Self {
        Self {
            width: 200,
            frames: Mutex::default(),
            repeat: vec![],
            voltages: Mutex::new(VecDeque::from([12.0])),
            motions: Mutex::default(),
            detector_calls: AtomicU32::new(0),
            detector_error: None,
            voltage_error: None,
            camera_panic: None,
            hang_motion: false,
        }
    }
}

impl Scripted {
    pub fn frames(self, frames: impl IntoIterator<Item = Vec<Detection>>) -> Self {
        *self.frames.lock().unwrap() = frames.into_iter().collect();
        self
    }

    pub fn repeat(mut self, frame: Vec<Detection>) -> Self {
        self.repeat = frame;
        self
    }

    pub fn voltages(self, voltages: impl IntoIterator<Item = f64>) -> Self {
        *self.voltages.lock().unwrap() = voltages.into_iter().collect();
        self
    }

    pub fn detector_error(mut self, err: DockError) -> Self {
        self.detector_error = Some(err);
        self
    }

    pub fn voltage_error(mut self, err: DockError) -> Self {
        self.voltage_error = Some(err);
        self
    }

    pub fn camera_panic(mut self, msg: &'static str) -> Self {
        self.camera_panic = Some(msg);
        self
    }

    pub fn hang_motion(mut self) -> Self {
        self.hang_motion = true;
        self
    }

    pub fn motions(&self) -> Vec<Motion> {
        self.motions.lock().unwrap().clone()
    }

    pub fn detector_calls(&self) -> u32 {
        self.detector_calls.load(Ordering::SeqCst)
    }

    async fn record(&self, motion: Motion) -> DockResult<()> {
        if self.hang_motion {
            pending::<()>().await;
        }
        self.motions.lock().unwrap().push(motion);
        Ok(())
    }
}

/// A `match` detection spanning `x_min..x_max`.
pub(crate) fn target(x_min: f64, x_max: f64) -> Detection {
    Detection::new("match", 0.9, (x_min, x_max), (10.0, 50.0))
}

impl ImageSource for Scripted {
    async fn get_image(&self) -> DockResult<Image> {
        if let Some(msg) = self.camera_panic {
            panic!("{msg}");
        }
        Ok(Image::new(self.width, 100, Bytes::new()))
    }
}

impl ObjectDetector for Scripted {
    async fn get_detections(&self, _image: &Image) -> DockResult<Vec<Detection>> {
        self.detector_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.detector_error {
            return Err(err.clone());
        }
        let frame = self.frames.lock().unwrap().pop_front();
        Ok(frame.unwrap_or_else(|| self.repeat.clone()))
    }
}

impl MotionActuator for Scripted {
    async fn spin(&self, degrees: f64, velocity: f64) -> DockResult<()> {
        self.record(Motion::Spin { degrees, velocity }).await
    }

    async fn move_straight(&self, distance: f64, velocity: f64) -> DockResult<()> {
        self.record(Motion::Straight { distance, velocity }).await
    }
}

impl VoltageSensor for Scripted {
    async fn get_voltage(&self) -> DockResult<f64> {
        if let Some(err) = &self.voltage_error {
            return Err(err.clone());
        }
        let mut voltages = self.voltages.lock().unwrap();
        let voltage = if voltages.len() > 1 {
            voltages.pop_front()
        } else {
            voltages.front().copied()
        };
        voltage.ok_or_else(|| DockError::SensorUnavailable("no voltage scripted".to_string()))
    }
}
