use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::timeout;

use crate::error::{DockError, DockResult};
use crate::vision::{Detection, Image};

/**
 * Inherit this trait if you have a camera
 */
pub trait ImageSource: Send + Sync {
    fn get_image(&self) -> impl Future<Output = DockResult<Image>> + Send;
}

/**
 * Inherit this trait if you can run an object detector over an image
 */
pub trait ObjectDetector: Send + Sync {
    fn get_detections(
        &self,
        image: &Image,
    ) -> impl Future<Output = DockResult<Vec<Detection>>> + Send;
}

/**
 * Inherit this trait if you have a drive base
 *
 * Both commands resolve once the motion has completed or been rejected. The
 * direction of travel is the product of the signs of the magnitude and velocity.
 */
pub trait MotionActuator: Send + Sync {
    fn spin(&self, degrees: f64, velocity: f64) -> impl Future<Output = DockResult<()>> + Send;
    fn move_straight(
        &self,
        distance: f64,
        velocity: f64,
    ) -> impl Future<Output = DockResult<()>> + Send;
}

/**
 * Inherit this trait if you have a power sensor
 */
pub trait VoltageSensor: Send + Sync {
    fn get_voltage(&self) -> impl Future<Output = DockResult<f64>> + Send;
}

impl<T: ImageSource> ImageSource for Arc<T> {
    fn get_image(&self) -> impl Future<Output = DockResult<Image>> + Send {
        (**self).get_image()
    }
}

impl<T: ObjectDetector> ObjectDetector for Arc<T> {
    fn get_detections(
        &self,
        image: &Image,
    ) -> impl Future<Output = DockResult<Vec<Detection>>> + Send {
        (**self).get_detections(image)
    }
}

impl<T: MotionActuator> MotionActuator for Arc<T> {
    fn spin(&self, degrees: f64, velocity: f64) -> impl Future<Output = DockResult<()>> + Send {
        (**self).spin(degrees, velocity)
    }

    fn move_straight(
        &self,
        distance: f64,
        velocity: f64,
    ) -> impl Future<Output = DockResult<()>> + Send {
        (**self).move_straight(distance, velocity)
    }
}

impl<T: VoltageSensor> VoltageSensor for Arc<T> {
    fn get_voltage(&self) -> impl Future<Output = DockResult<f64>> + Send {
        (**self).get_voltage()
    }
}

/// Camera, detector, base and power sensor resolved from separate dependencies.
#[derive(Debug, Clone)]
pub struct FullActionContext<Cam, Det, Base, Power> {
    camera: Cam,
    detector: Det,
    base: Base,
    power_sensor: Power,
}

impl<Cam, Det, Base, Power> FullActionContext<Cam, Det, Base, Power> {
    pub const fn new(camera: Cam, detector: Det, base: Base, power_sensor: Power) -> Self {
        Self {
            camera,
            detector,
            base,
            power_sensor,
        }
    }
}

impl<Cam: ImageSource, Det: Send + Sync, Base: Send + Sync, Power: Send + Sync> ImageSource
    for FullActionContext<Cam, Det, Base, Power>
{
    fn get_image(&self) -> impl Future<Output = DockResult<Image>> + Send {
        self.camera.get_image()
    }
}

impl<Cam: Send + Sync, Det: ObjectDetector, Base: Send + Sync, Power: Send + Sync>
    ObjectDetector for FullActionContext<Cam, Det, Base, Power>
{
    fn get_detections(
        &self,
        image: &Image,
    ) -> impl Future<Output = DockResult<Vec<Detection>>> + Send {
        self.detector.get_detections(image)
    }
}

impl<Cam: Send + Sync, Det: Send + Sync, Base: MotionActuator, Power: Send + Sync>
    MotionActuator for FullActionContext<Cam, Det, Base, Power>
{
    fn spin(&self, degrees: f64, velocity: f64) -> impl Future<Output = DockResult<()>> + Send {
        self.base.spin(degrees, velocity)
    }

    fn move_straight(
        &self,
        distance: f64,
        velocity: f64,
    ) -> impl Future<Output = DockResult<()>> + Send {
        self.base.move_straight(distance, velocity)
    }
}

impl<Cam: Send + Sync, Det: Send + Sync, Base: Send + Sync, Power: VoltageSensor> VoltageSensor
    for FullActionContext<Cam, Det, Base, Power>
{
    fn get_voltage(&self) -> impl Future<Output = DockResult<f64>> + Send {
        self.power_sensor.get_voltage()
    }
}

/// Wraps a context so no single collaborator call can stall longer than `limit`.
///
/// An expired sensor call becomes [`DockError::SensorUnavailable`], an expired
/// motion [`DockError::ActuatorFault`].
#[derive(Debug, Clone)]
pub struct Bounded<Con> {
    inner: Con,
    limit: Duration,
}

impl<Con> Bounded<Con> {
    pub const fn new(inner: Con, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn guard<T>(
        &self,
        call: impl Future<Output = DockResult<T>>,
        what: &str,
        on_expiry: fn(String) -> DockError,
    ) -> DockResult<T> {
        timeout(self.limit, call)
            .await
            .map_err(|_| on_expiry(format!("{what} timed out after {:?}", self.limit)))?
    }
}

impl<Con: ImageSource> ImageSource for Bounded<Con> {
    async fn get_image(&self) -> DockResult<Image> {
        self.guard(
            self.inner.get_image(),
            "camera",
            DockError::SensorUnavailable,
        )
        .await
    }
}

impl<Con: ObjectDetector> ObjectDetector for Bounded<Con> {
    async fn get_detections(&self, image: &Image) -> DockResult<Vec<Detection>> {
        self.guard(
            self.inner.get_detections(image),
            "detector",
            DockError::SensorUnavailable,
        )
        .await
    }
}

impl<Con: MotionActuator> MotionActuator for Bounded<Con> {
    async fn spin(&self, degrees: f64, velocity: f64) -> DockResult<()> {
        self.guard(
            self.inner.spin(degrees, velocity),
            "spin",
            DockError::ActuatorFault,
        )
        .await
    }

    async fn move_straight(&self, distance: f64, velocity: f64) -> DockResult<()> {
        self.guard(
            self.inner.move_straight(distance, velocity),
            "move_straight",
            DockError::ActuatorFault,
        )
        .await
    }
}

impl<Con: VoltageSensor> VoltageSensor for Bounded<Con> {
    async fn get_voltage(&self) -> DockResult<f64> {
        self.guard(
            self.inner.get_voltage(),
            "power sensor",
            DockError::SensorUnavailable,
        )
        .await
    }
}
