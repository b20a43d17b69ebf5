//! BLE host tool for Dwara pinpads
//!
//! Scans for pinpad peripherals and submits `user:code` writes to the
//! pinpad characteristic.

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// Dwara pinpad GATT UUIDs
// These must match dwara_proto::ble::{SERVICE_UUID, PINPAD_UUID, STATUS_UUID}
#[allow(dead_code)]
const SERVICE_UUID: Uuid = Uuid::from_u128(0xd3a41000_6f2c_4b1e_0000_000000000000);
const PINPAD_UUID: Uuid = Uuid::from_u128(0xd3a41001_6f2c_4b1e_0000_000000000000);
const STATUS_UUID: Uuid = Uuid::from_u128(0xd3a41002_6f2c_4b1e_0000_000000000000);

#[derive(Parser)]
#[command(name = "dwara-ble")]
#[command(about = "BLE host tool for Dwara pinpad peripherals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for Dwara pinpads
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Submit a passcode to a pinpad
    Submit {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// User identifier to submit as
        #[arg(short, long)]
        user: String,
        /// The code to submit; omit to derive it from --secret
        #[arg(short, long)]
        code: Option<String>,
        /// Shared secret (ASCII) to derive the current TOTP code from
        #[arg(short, long)]
        secret: Option<String>,
    },
    /// Read the status characteristic, optionally watching for changes
    Status {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// Keep the connection open and print status notifications
        #[arg(short, long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    let adapter = adapters.into_iter().next().ok_or("No Bluetooth adapter found")?;

    match cli.command {
        Commands::Scan { duration } => {
            scan_pinpads(&adapter, duration).await?;
        }
        Commands::Submit { device, user, code, secret } => {
            let code = resolve_code(code, secret)?;
            submit_code(&adapter, device, &user, &code).await?;
        }
        Commands::Status { device, watch } => {
            read_status(&adapter, device, watch).await?;
        }
    }

    Ok(())
}

/// Use an explicit code when given, otherwise derive the current 6-digit
/// TOTP code from the shared secret.
fn resolve_code(
    code: Option<String>,
    secret: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    match (code, secret) {
        (Some(code), _) => Ok(code),
        (None, Some(secret)) => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            let code = dwara_otp::totp_at(
                secret.as_bytes(),
                now,
                dwara_otp::DEFAULT_PERIOD,
                dwara_otp::DEFAULT_DIGITS,
            );
            Ok(format!("{code:06}"))
        }
        (None, None) => Err("Provide either --code or --secret".into()),
    }
}

async fn scan_pinpads(adapter: &Adapter, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for Dwara pinpads ({} seconds)...", duration);

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration)).await;

    let peripherals = adapter.peripherals().await?;

    println!("\nFound {} devices:", peripherals.len());
    for peripheral in peripherals {
        let props = peripheral.properties().await?;
        if let Some(props) = props {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let addr = peripheral.address();
            let rssi = props.rssi.map(|r| format!("{} dBm", r)).unwrap_or_else(|| "N/A".to_string());

            let is_pinpad = name.starts_with("Dwara");
            let marker = if is_pinpad { " [DWARA]" } else { "" };

            println!("  {} ({}) RSSI: {}{}", name, addr, rssi, marker);
        }
    }

    adapter.stop_scan().await?;
    Ok(())
}

async fn find_pinpad(
    adapter: &Adapter,
    target: Option<String>,
) -> Result<Peripheral, Box<dyn std::error::Error>> {
    println!("Scanning for Dwara pinpads...");

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        let props = peripheral.properties().await?;
        if let Some(props) = props {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            // Match by target (name or address) or take any Dwara pinpad
            let matches = match &target {
                Some(t) => name.contains(t) || addr.contains(t),
                None => name.starts_with("Dwara"),
            };

            if matches {
                adapter.stop_scan().await?;
                println!("Found device: {} ({})", name, addr);
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err("No Dwara pinpad found".into())
}

async fn submit_code(
    adapter: &Adapter,
    target: Option<String>,
    user: &str,
    code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = find_pinpad(adapter, target).await?;

    println!("Connecting...");
    device.connect().await?;
    println!("Connected!");

    println!("Discovering services...");
    device.discover_services().await?;

    let characteristics = device.characteristics();

    let pinpad_char = characteristics.iter()
        .find(|c| c.uuid == PINPAD_UUID)
        .ok_or("Pinpad characteristic not found")?;

    let submission = format!("{user}:{code}");
    println!("Submitting as '{}'...", user);
    device.write(pinpad_char, submission.as_bytes(), WriteType::WithResponse).await?;

    // The outcome is on the status characteristic; read it back if exposed.
    if let Some(status_char) = characteristics.iter().find(|c| c.uuid == STATUS_UUID) {
        let value = device.read(status_char).await?;
        println!("Pinpad status: {}", String::from_utf8_lossy(&value));
    }

    device.disconnect().await?;
    Ok(())
}

async fn read_status(
    adapter: &Adapter,
    target: Option<String>,
    watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = find_pinpad(adapter, target).await?;

    println!("Connecting...");
    device.connect().await?;

    device.discover_services().await?;

    let characteristics = device.characteristics();
    let status_char = characteristics.iter()
        .find(|c| c.uuid == STATUS_UUID)
        .ok_or("Status characteristic not found")?
        .clone();

    let value = device.read(&status_char).await?;
    println!("Pinpad status: {}", String::from_utf8_lossy(&value));

    if watch {
        device.subscribe(&status_char).await?;
        println!("Watching for status changes (Ctrl-C to stop)...");

        let mut notifications = device.notifications().await?;
        while let Some(notification) = notifications.next().await {
            if notification.uuid == STATUS_UUID {
                println!("Pinpad status: {}", String::from_utf8_lossy(&notification.value));
            }
        }
    }

    device.disconnect().await?;
    Ok(())
}
