//! Example: reading and writing PLC devices
//!
//! Run with: cargo run --example read_write -- 192.168.1.10 5007
//!
//! Set `RUST_LOG=melsec_mc=debug` to see every frame in hex.
//!
//! This example demonstrates:
//! - Word and bit batch access
//! - Random access to scattered devices
//! - Typed tags spanning several words
//! - CPU diagnostics and the PLC clock

use melsec_mc::{Client, ClientConfig, DataType, PlcSeries, Tag};
use tracing_subscriber::EnvFilter;

fn main() -> melsec_mc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "192.168.1.10".to_string());
    let port = args
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(melsec_mc::DEFAULT_MC_PORT);

    // =========================================================================
    // Connect to PLC
    // =========================================================================

    let config = ClientConfig::new(host, PlcSeries::Q).with_port(port);
    let mut client = Client::new(config);
    client.connect()?;

    // =========================================================================
    // Batch access
    // =========================================================================

    println!("=== Batch access ===\n");

    let words = client.batch_read_words("D100", 5)?;
    println!("D100-D104: {:?}", words);

    client.batch_write_words("D200", &[1, -2, 3])?;
    client.batch_write_bits("M100", &[true, false, true])?;
    println!("M100-M102: {:?}", client.batch_read_bits("M100", 3)?);

    // =========================================================================
    // Random access
    // =========================================================================

    println!("\n=== Random access ===\n");

    client.random_write(&[("D300", 10), ("D310", -10)], &[("D320", 100_000)])?;
    let (w, d) = client.random_read(&["D300", "D310"], &["D320"])?;
    println!("D300, D310: {:?}  D320 (dword): {:?}", w, d);
    client.random_write_bits(&[("M200", true), ("Y10", false)])?;

    // =========================================================================
    // Typed tags
    // =========================================================================

    println!("\n=== Typed tags ===\n");

    let failed = client.write(&[
        Tag::with_value("D400", DataType::Float, 12.5f32),
        Tag::with_value("D402", DataType::SDWord, -123_456i32),
        Tag::with_value("D404", DataType::Double, 1234.5678f64),
        Tag::with_value("M300", DataType::Bit, true),
    ])?;
    if let Some(failed) = failed {
        for tag in failed {
            println!("not written: {}", tag);
        }
    }

    let tags = client.read(&[
        Tag::new("D400", "f"),
        Tag::new("D402", "i"),
        Tag::new("D404", "d"),
        Tag::new("M300", "b"),
    ])?;
    for tag in &tags {
        println!("{}", tag);
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    println!("\n=== Diagnostics ===\n");

    println!("CPU model:  {}", client.read_cpu_model()?);
    println!("CPU status: {}", client.read_cpu_status());
    match client.read_switch_status() {
        Some(status) => println!("Switch:     {}", status),
        None => println!("Switch:     unexpected register value"),
    }
    println!("Loopback:   {}", client.loopback_test("HELLO123")?);
    println!("PLC clock:  {}", client.read_plc_time()?);

    client.close()
}
