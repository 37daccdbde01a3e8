use crate::config::dock::Config;
use crate::error::DockResult;

use super::{
    action::{Action, ActionExec},
    action_context::{MotionActuator, VoltageSensor},
};

/// Voltage rise (V) that confirms the contacts are seated.
pub const DOCKED_VOLTAGE_DELTA: f64 = 0.12;

const PUSH_FACTOR: f64 = 5.0;
const WIGGLE_FACTOR: f64 = 2.0;
const RETREAT_FACTOR: f64 = 0.3;

/// Fixed maneuver that drives onto the dock, then checks for a charging voltage rise.
///
/// Resolves to `Ok(false)` when the voltage did not rise enough. Collaborator errors are
/// returned as is, with no recovery between steps.
#[derive(Debug)]
pub struct FinalDock<'a, Con> {
    context: &'a Con,
    config: &'a Config,
}

impl<'a, Con> FinalDock<'a, Con> {
    pub const fn new(context: &'a Con, config: &'a Config) -> Self {
        Self { context, config }
    }
}

impl<Con> Action for FinalDock<'_, Con> {}

impl<Con: MotionActuator + VoltageSensor> ActionExec<DockResult<bool>> for FinalDock<'_, Con> {
    async fn execute(&mut self) -> DockResult<bool> {
        let base = self.context;
        let distance = self.config.straight_distance;
        let velocity = self.config.straight_velocity as f64;
        let wiggle = self.config.search_spin_deg * WIGGLE_FACTOR;

        let initial_voltage = self.context.get_voltage().await?;

        // One big push, then wiggle to seat the contacts
        base.move_straight(distance * PUSH_FACTOR, velocity * 2.0).await?;
        for direction in [1.0, -1.0, 1.0, -1.0] {
            base.spin(wiggle, velocity * direction).await?;
        }
        base.move_straight(distance, velocity * 2.0).await?;
        base.move_straight(distance * RETREAT_FACTOR, -velocity * 2.0).await?;

        let final_voltage = self.context.get_voltage().await?;
        let delta = final_voltage - initial_voltage;

        #[cfg(feature = "logging")]
        logln!("Final dock voltage {initial_voltage:.3} V -> {final_voltage:.3} V (delta {delta:.3})");

        Ok(delta > DOCKED_VOLTAGE_DELTA)
    }
}
