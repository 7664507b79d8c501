//! Board discovery and fixture helpers for hardware tests.

use serialport::{available_ports, SerialPortType};
use uart_conformance::config::{Config, ConfigLoader};
use uart_conformance::RunnerSettings;

/// Probe serial numbers of every CMSIS-DAP device the OS reports.
pub fn discover_probes() -> Vec<String> {
    available_ports()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|port| match port.port_type {
            SerialPortType::UsbPort(info)
                if info
                    .product
                    .as_deref()
                    .is_some_and(|p| p.contains("CMSIS-DAP")) =>
            {
                info.serial_number
            }
            _ => None,
        })
        .collect()
}

/// Test fixture holding the resolved configuration for the attached board.
pub struct BoardFixture {
    pub config: Config,
    pub settings: RunnerSettings,
}

impl BoardFixture {
    /// Resolve the board from the environment; `None` when `SERIAL` is unset.
    pub fn setup() -> Option<Self> {
        std::env::var("SERIAL").ok()?;

        let config = match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                println!("Failed to load configuration: {}", e);
                return None;
            }
        };
        let settings = match RunnerSettings::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                println!("Cannot address board: {}", e);
                return None;
            }
        };

        println!("Using board at {}", settings.device_path);
        Some(Self { config, settings })
    }
}

/// Skip test with a clear message if no board is configured.
#[macro_export]
macro_rules! board_or_skip {
    () => {
        match $crate::hardware::utils::BoardFixture::setup() {
            Some(fixture) => fixture,
            None => {
                println!("Skipping: SERIAL environment variable not set");
                println!("   Set SERIAL=<probe serial number> to run hardware tests");
                return;
            }
        }
    };
}
