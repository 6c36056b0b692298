//! Command-line host for the security engine
//!
//! Loads state from the JSON state file, applies one action, and prints the
//! resulting system state. Status changes are echoed as they happen.

use anyhow::{bail, Context, Result};
use catpoint_core::common::Categorizable;
use catpoint_core::config::Config;
use catpoint_core::domains::security::classifier::FakeImageClassifier;
use catpoint_core::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, SensorType,
};
use catpoint_core::domains::security::store::JsonFileStore;
use catpoint_core::domains::security::SecurityService;
use catpoint_core::kernel::StatusListener;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catpoint")]
#[command(about = "Very secure home alarm controller")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show alarm status, arming status and sensors
    Status,

    /// Arm the system (home or away)
    Arm { mode: ArmMode },

    /// Disarm the system
    Disarm,

    /// Manage sensors
    Sensor {
        #[command(subcommand)]
        action: SensorAction,
    },

    /// Send a camera image to the cat detector
    Image { path: PathBuf },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ArmMode {
    Home,
    Away,
}

#[derive(Subcommand)]
enum SensorAction {
    /// Register a new sensor
    Add { name: String, sensor_type: SensorType },

    /// Unregister a sensor
    Remove { name: String, sensor_type: SensorType },

    /// Mark a sensor as triggered
    Activate { name: String, sensor_type: SensorType },

    /// Mark a sensor as quiet
    Deactivate { name: String, sensor_type: SensorType },
}

/// Echoes status changes to stdout, like the display panel did.
struct ConsoleListener;

impl StatusListener for ConsoleListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        println!("alarm: {}", status);
    }

    fn on_cat_detected(&self, detected: bool) {
        if detected {
            println!("camera: DANGER - CAT DETECTED");
        } else {
            println!("camera: cat-free");
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catpoint_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    let store = JsonFileStore::open(&config.state_path).with_context(|| {
        format!("Failed to open state file {}", config.state_path.display())
    })?;

    let service = SecurityService::builder(Arc::new(store), Arc::new(FakeImageClassifier::new()))
        .classifier_timeout(config.classifier_timeout)
        .listener_budget(config.listener_budget)
        .build()
        .context("Failed to load security state")?;
    service.add_status_listener(Arc::new(ConsoleListener));

    if let Err(e) = run(&service, &config, cli.command).await {
        if let Some(security_err) = e.downcast_ref::<catpoint_core::common::SecurityError>() {
            tracing::error!(error = %security_err, category = %security_err.category(), "Action failed");
            bail!("{}", security_err.safe_message());
        }
        return Err(e);
    }

    print_status(&service);
    Ok(())
}

async fn run(service: &SecurityService, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {}
        Commands::Arm { mode } => {
            let status = match mode {
                ArmMode::Home => ArmingStatus::ArmedHome,
                ArmMode::Away => ArmingStatus::ArmedAway,
            };
            service.set_arming_status(status)?;
        }
        Commands::Disarm => service.set_arming_status(ArmingStatus::Disarmed)?,
        Commands::Sensor { action } => match action {
            SensorAction::Add { name, sensor_type } => {
                if service.sensors().len() >= config.max_sensors {
                    bail!(
                        "To add more than {} sensors, please subscribe to our Premium Membership!",
                        config.max_sensors
                    );
                }
                service.add_sensor(Sensor::new(name, sensor_type))?;
            }
            SensorAction::Remove { name, sensor_type } => {
                service.remove_sensor(&SensorKey::new(name, sensor_type))?;
            }
            SensorAction::Activate { name, sensor_type } => {
                service.change_sensor_activation(&SensorKey::new(name, sensor_type), true)?;
            }
            SensorAction::Deactivate { name, sensor_type } => {
                service.change_sensor_activation(&SensorKey::new(name, sensor_type), false)?;
            }
        },
        Commands::Image { path } => {
            let image = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            service.process_image(&image).await?;
        }
    }
    Ok(())
}

fn print_status(service: &SecurityService) {
    let snapshot = service.snapshot();
    println!("System Status: {}", snapshot.alarm_status);
    println!("Arming: {}", snapshot.arming_status);
    if snapshot.sensors.is_empty() {
        println!("Sensors: none");
    } else {
        println!("Sensors:");
        for sensor in &snapshot.sensors {
            println!("  {}", sensor);
        }
    }
}
