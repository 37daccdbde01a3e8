use anyhow::{bail, Result};
use std::env;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use detection_dock_lib::{
    comms::{command::dispatch, sim::SimRobot},
    config::{Config, SHUTDOWN_TIMEOUT},
    logln,
    missions::{
        action_context::FullActionContext,
        dock::{DockOutcome, DockingController},
    },
};
use tokio::{
    signal,
    sync::{
        mpsc::{self, UnboundedSender},
        OnceCell, Semaphore,
    },
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

type SimContext = FullActionContext<Arc<SimRobot>, Arc<SimRobot>, Arc<SimRobot>, Arc<SimRobot>>;

const STATUS_PERIOD: Duration = Duration::from_millis(500);

static CONFIG_CELL: OnceCell<Config> = OnceCell::const_new();
async fn config() -> &'static Config {
    CONFIG_CELL
        .get_or_init(|| async {
            Config::new().unwrap_or_else(|e| {
                logln!("Error getting config file: {:#?}\nUsing default config", e);
                Config::default()
            })
        })
        .await
}

static SIM_CELL: OnceCell<Arc<SimRobot>> = OnceCell::const_new();
async fn sim() -> &'static Arc<SimRobot> {
    SIM_CELL
        .get_or_init(|| async { Arc::new(SimRobot::new(config().await.sim.clone())) })
        .await
}

static CONTROLLER_CELL: OnceCell<DockingController<SimContext>> = OnceCell::const_new();
async fn controller() -> Result<&'static DockingController<SimContext>> {
    CONTROLLER_CELL
        .get_or_try_init(|| async {
            let config = config().await;
            config.validate()?;

            // Every dependency resolves to the simulator until hardware drivers exist
            logln!(
                "Resolving power_sensor `{}`, base `{}`, camera `{}`, detector `{}` to the simulator",
                config.power_sensor,
                config.base,
                config.camera,
                config.detector
            );
            let robot = sim().await;
            let context = FullActionContext::new(
                robot.clone(),
                robot.clone(),
                robot.clone(),
                robot.clone(),
            );
            Ok::<_, anyhow::Error>(DockingController::new(
                Arc::new(context),
                config.dock.clone(),
            )?)
        })
        .await
}

static SHUTDOWN_GUARD: Semaphore = Semaphore::const_new(1);

#[tokio::main]
async fn main() -> Result<()> {
    let (shutdown_tx, mission_ct) = shutdown_handler().await;

    for arg in env::args().skip(1).collect::<Vec<String>>() {
        let _guard = SHUTDOWN_GUARD.acquire().await?;
        if let Err(e) = run_mission(&arg, mission_ct.clone()).await {
            logln!("Mission `{arg}` failed: {e:#}");
            shutdown_tx.send(1)?;
            return Err(e);
        }
    }

    // Send shutdown signal
    shutdown_tx.send(0)?;
    Ok(())
}

/// Graceful shutdown, see <https://tokio.rs/tokio/topics/shutdown>
async fn shutdown_handler() -> (UnboundedSender<i32>, CancellationToken) {
    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel::<i32>();
    let mission_ct = CancellationToken::new();
    let mission_ct_clone = mission_ct.clone();
    tokio::spawn(async move {
        // Wait for shutdown signal
        let exit_status = tokio::select! {
            _ = signal::ctrl_c() => {
                logln!("CTRL-C RECV");
                1
            },
            Some(x) = shutdown_rx.recv() => {
                logln!("SHUTDOWN SIGNAL RECV");
                x
            }
        };

        // Let the docking loop wind down after its current maneuver
        if let Some(controller) = CONTROLLER_CELL.get() {
            controller.stop();
        }

        // If shutdown is unexpected, cancel running missions and exit nonzero
        if exit_status != 0 {
            mission_ct_clone.cancel();
            if timeout(
                Duration::from_secs(SHUTDOWN_TIMEOUT),
                SHUTDOWN_GUARD.acquire(),
            )
            .await
            .is_err()
            {
                logln!("Missions did not exit within {SHUTDOWN_TIMEOUT} seconds")
            }
            exit(exit_status)
        };
    });
    (shutdown_tx, mission_ct)
}

async fn run_mission(mission: &str, cancel: CancellationToken) -> Result<()> {
    match mission.to_lowercase().as_str() {
        "validate" => {
            config().await.validate()?;
            logln!("Config is valid");
            Ok(())
        }
        "dock" => dock(cancel).await,
        "status" => {
            logln!("{}", dispatch(controller().await?, "status")?);
            Ok(())
        }
        x => bail!("Invalid argument: [{x}]"),
    }
}

async fn dock(cancel: CancellationToken) -> Result<()> {
    let controller = controller().await?;
    logln!("start: {}", dispatch(controller, "start")?);

    let monitor = async {
        while controller.is_running() {
            sleep(STATUS_PERIOD).await;
            if let Ok(status) = dispatch(controller, "status") {
                logln!("status: {status}");
            }
        }
    };
    if cancel.run_until_cancelled(monitor).await.is_none() {
        logln!("stop: {}", controller.stop());
    }

    match controller.wait().await {
        Some(DockOutcome::Docked) => {
            let robot = sim().await;
            logln!(
                "Docked at {:.1} mm, bearing {:.2} deg",
                robot.distance(),
                robot.bearing()
            );
            Ok(())
        }
        Some(outcome) => bail!("Docking ended without contact: {outcome:?}"),
        None => bail!("No docking run to wait on"),
    }
}
