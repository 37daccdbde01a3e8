use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::config::dock::Config;
use crate::error::{DockError, DockResult};
use crate::vision::{of_class, Detection};

use super::{
    action::ActionExec,
    action_context::{Bounded, ImageSource, MotionActuator, ObjectDetector, VoltageSensor},
    final_dock::FinalDock,
};

/// Normalized offset corrected by one degree of spin.
pub const STEERING_GAIN: f64 = 0.04;
/// Multiple of `straight_distance` to back off after a failed final dock.
pub const BACKOFF_FACTOR: f64 = 10.0;
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Observable run state. Only the docking loop writes it, apart from `stop`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub is_running: bool,
    pub is_docked: bool,
    pub dock_try_count: u32,
    pub search_try_count: u32,
    pub detection_try_count: u32,
}

/// Why a docking run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DockOutcome {
    Docked,
    Stopped,
    SearchExhausted,
    DockExhausted,
    Failed(DockError),
    /// The loop task panicked or was cancelled by the runtime.
    Aborted(String),
}

/// What to do with the only target in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Approach {
    /// Spin `degrees` at `velocity`; negative velocity turns right.
    Center { degrees: f64, velocity: f64 },
    /// Step forward; `close` when the target is large enough to dock.
    Forward { close: bool },
}

/// Proportional steering toward a single detection.
pub fn plan_approach(target: &Detection, image_width: f64, config: &Config) -> Approach {
    let relative_size = target.relative_size(image_width);
    let centered = target.horizontal_offset(image_width);

    if centered.abs() > config.center_tolerance {
        let degrees = (centered.abs() - config.center_tolerance) / STEERING_GAIN;
        let speed = config.spin_velocity as f64;
        let velocity = if centered > 0.0 { -speed } else { speed };
        Approach::Center { degrees, velocity }
    } else {
        Approach::Forward {
            close: relative_size > config.close_percent,
        }
    }
}

fn read(status: &RwLock<Status>) -> Status {
    status
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn update<T>(status: &RwLock<Status>, f: impl FnOnce(&mut Status) -> T) -> T {
    let mut status = status.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut *status)
}

fn exit_reason(status: &Status, config: &Config) -> Option<DockOutcome> {
    if status.is_docked {
        Some(DockOutcome::Docked)
    } else if !status.is_running {
        Some(DockOutcome::Stopped)
    } else if status.search_try_count >= config.max_search_tries {
        Some(DockOutcome::SearchExhausted)
    } else if status.dock_try_count >= config.max_dock_tries {
        Some(DockOutcome::DockExhausted)
    } else {
        None
    }
}

/// Drives the robot onto a visually detected dock.
///
/// `start` spawns the loop on the current tokio runtime and returns at once. The loop
/// polls the `is_running` flag between iterations, so `stop` never interrupts a
/// maneuver already in flight.
pub struct DockingController<Con> {
    context: Arc<Con>,
    config: RwLock<Arc<Config>>,
    status: Arc<RwLock<Status>>,
    task: Mutex<Option<JoinHandle<DockOutcome>>>,
}

impl<Con> DockingController<Con>
where
    Con: ImageSource + ObjectDetector + MotionActuator + VoltageSensor + 'static,
{
    pub fn new(context: Arc<Con>, config: Config) -> DockResult<Self> {
        config.validate()?;
        Ok(Self {
            context,
            config: RwLock::new(Arc::new(config)),
            status: Arc::default(),
            task: Mutex::default(),
        })
    }

    pub fn config(&self) -> Arc<Config> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the tuning used by the next run.
    pub fn reconfigure(&self, config: Config) -> DockResult<()> {
        config.validate()?;
        if self.is_running() {
            return Err(DockError::AlreadyRunning);
        }
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        Ok(())
    }

    /// Resets the status and launches a run in the background.
    pub fn start(&self) -> DockResult<&'static str> {
        // A stopped loop may still be finishing its last maneuver
        if self.task().as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(DockError::AlreadyRunning);
        }
        update(&self.status, |status| {
            if status.is_running {
                return Err(DockError::AlreadyRunning);
            }
            *status = Status {
                is_running: true,
                ..Status::default()
            };
            Ok(())
        })?;

        let config = self.config();
        let context = Bounded::new(self.context.clone(), config.call_timeout());
        let handle = tokio::spawn(dock(context, config, self.status.clone()));
        *self.task() = Some(handle);
        Ok("OK")
    }

    /// Asks the loop to finish at its next condition check.
    pub fn stop(&self) -> &'static str {
        update(&self.status, |status| status.is_running = false);
        "OK"
    }

    pub fn is_running(&self) -> bool {
        read(&self.status).is_running
    }

    pub fn status(&self) -> Status {
        read(&self.status)
    }

    /// Waits for the last started run to end.
    ///
    /// `None` when nothing was started or the outcome was already collected.
    pub async fn wait(&self) -> Option<DockOutcome> {
        let handle = self.task().take()?;
        Some(
            handle
                .await
                .unwrap_or_else(|e| DockOutcome::Aborted(e.to_string())),
        )
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<DockOutcome>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<Con> Drop for DockingController<Con> {
    fn drop(&mut self) {
        update(&self.status, |status| status.is_running = false);
    }
}

/// Clears `is_running` when the loop exits, panics included.
struct RunGuard(Arc<RwLock<Status>>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        update(&self.0, |status| status.is_running = false);
    }
}

async fn dock<Con>(context: Con, config: Arc<Config>, status: Arc<RwLock<Status>>) -> DockOutcome
where
    Con: ImageSource + ObjectDetector + MotionActuator + VoltageSensor,
{
    let _running = RunGuard(status.clone());

    #[cfg(feature = "logging")]
    logln!("Starting dock, target class `{}`", config.detection_class);

    let outcome = loop {
        let snapshot = read(&status);
        if let Some(outcome) = exit_reason(&snapshot, &config) {
            break outcome;
        }
        if let Err(e) = dock_step(&context, &config, &status).await {
            #[cfg(feature = "logging")]
            logln!("Dock aborted: {e}");
            break DockOutcome::Failed(e);
        }
    };

    let _final = update(&status, |status| {
        status.is_running = false;
        status.clone()
    });

    #[cfg(feature = "logging")]
    logln!("Finished dock: {outcome:?}, {_final:?}");

    outcome
}

/// One sense and act cycle.
async fn dock_step<Con>(context: &Con, config: &Config, status: &RwLock<Status>) -> DockResult<()>
where
    Con: ImageSource + ObjectDetector + MotionActuator + VoltageSensor,
{
    let image = context.get_image().await?;
    let detections = context.get_detections(&image).await?;
    let targets = of_class(detections, &config.detection_class);

    match targets.as_slice() {
        [target] => {
            update(status, |status| status.detection_try_count = 0);
            approach(context, config, status, target, *image.width() as f64).await
        }
        _ => search(context, config, status, targets.len()).await,
    }
}

async fn approach<Con>(
    context: &Con,
    config: &Config,
    status: &RwLock<Status>,
    target: &Detection,
    image_width: f64,
) -> DockResult<()>
where
    Con: MotionActuator + VoltageSensor,
{
    match plan_approach(target, image_width, config) {
        Approach::Center { degrees, velocity } => {
            #[cfg(feature = "logging")]
            logln!(
                "Centering {} {degrees:.2} deg",
                if velocity < 0.0 { "right" } else { "left" }
            );
            context.spin(degrees, velocity).await
        }
        Approach::Forward { close } => {
            let velocity = config.straight_velocity as f64;

            #[cfg(feature = "logging")]
            logln!(
                "Moving forward, target at {:.3} of frame",
                target.relative_size(image_width)
            );
            context
                .move_straight(config.straight_distance, velocity)
                .await?;

            if close {
                let _attempt = update(status, |status| {
                    status.dock_try_count += 1;
                    status.dock_try_count
                });
                #[cfg(feature = "logging")]
                logln!("Final dock attempt {_attempt}/{}", config.max_dock_tries);

                if FinalDock::new(context, config).execute().await? {
                    update(status, |status| status.is_docked = true);
                } else {
                    // Retreat and realign before the next attempt
                    context
                        .move_straight(-config.straight_distance * BACKOFF_FACTOR, velocity)
                        .await?;
                }
            }

            sleep(SETTLE_DELAY).await;
            Ok(())
        }
    }
}

async fn search<Con>(
    context: &Con,
    config: &Config,
    status: &RwLock<Status>,
    _seen: usize,
) -> DockResult<()>
where
    Con: MotionActuator,
{
    let misses = update(status, |status| {
        status.detection_try_count += 1;
        status.detection_try_count
    });
    if misses <= config.detection_try_max {
        return Ok(());
    }

    #[cfg(feature = "logging")]
    logln!("Searching after {misses} frames without a single target (last saw {_seen})");

    context
        .spin(config.search_spin_deg, config.spin_velocity as f64)
        .await?;
    update(status, |status| {
        status.search_try_count += 1;
        status.detection_try_count = 0;
    });
    Ok(())
}
