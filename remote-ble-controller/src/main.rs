//! Command line central for Remote BMS devices
//!
//! Scans for Remote devices, prints button presses, sends messages and
//! drives the Bond Management Service.

use clap::{Parser, Subcommand, ValueEnum};
use remote_ble_controller::{ControllerError, ble};
use remote_proto::bms::Operation;

#[derive(Parser)]
#[command(name = "remote-ble")]
#[command(about = "BLE central for Remote BMS devices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Print button presses until the device disconnects
    Watch {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Write a text message to the device
    Message {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        text: String,
    },
    /// Read the supported bond management operations
    Features {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Delete bonds on the device
    Delete {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// Which bonds to delete
        #[arg(value_enum)]
        which: Which,
        /// Authorization code
        #[arg(short, long, default_value = "ABCD")]
        code: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Which {
    /// The bond of this host
    Requesting,
    /// Every bond
    All,
    /// Every bond except this host's
    Rest,
}

impl From<Which> for Operation {
    fn from(which: Which) -> Self {
        match which {
            Which::Requesting => Operation::DeleteRequesting,
            Which::All => Operation::DeleteAll,
            Which::Rest => Operation::DeleteRest,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { duration } => {
            println!("Scanning for devices ({} seconds)...", duration);
            let devices = ble::scan(duration).await?;

            println!("\nFound {} devices:", devices.len());
            for device in devices {
                let rssi = device.rssi.map(|r| format!("{} dBm", r)).unwrap_or_else(|| "N/A".to_string());
                let marker = if device.is_remote { " [REMOTE]" } else { "" };
                println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
            }
        }
        Commands::Watch { device } => {
            println!("Waiting for button presses (Ctrl-C to stop)...");
            ble::watch_buttons(device.as_deref(), |button| {
                println!("Button {} pressed", button);
            })
            .await?;
            println!("Disconnected");
        }
        Commands::Message { device, text } => {
            ble::send_message(device.as_deref(), &text).await?;
            println!("Sent {} bytes", text.len());
        }
        Commands::Features { device } => {
            let features = ble::read_features(device.as_deref()).await?;
            println!("Feature mask: 0x{:06x}", features.mask());
            for op in [Operation::DeleteRequesting, Operation::DeleteAll, Operation::DeleteRest] {
                let support = features.support(op);
                let state = match (support.supported, support.authorize) {
                    (false, _) => "unsupported",
                    (true, false) => "supported",
                    (true, true) => "supported, authorization required",
                };
                println!("  {}: {}", op, state);
            }
        }
        Commands::Delete { device, which, code } => {
            let op = Operation::from(which);
            ble::bond_management(device.as_deref(), op, code.as_bytes()).await?;
            println!("{} accepted", op);
        }
    }

    Ok(())
}
