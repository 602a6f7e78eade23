//! Example: reading and writing PLC memory over FINS/TCP
//!
//! Run with: cargo run --example read_write -- 192.168.1.250
//!
//! This example demonstrates:
//! - Connecting and printing the negotiated node numbers
//! - Reading and writing words, bits and REALs
//! - Handling recoverable warnings and PLC errors
//!
//! Set `RUST_LOG=omron_fins_tcp=debug` to see every frame.

use omron_fins_tcp::{Client, ClientConfig, FinsError, MemoryArea};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> omron_fins_tcp::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.250".to_string());

    let mut client = Client::new(ClientConfig::new(host));
    let identity = client.connect().await?;
    println!("Connected: {}", identity);

    // =========================================================================
    // Words
    // =========================================================================

    println!("\n=== Words ===\n");

    let reply = client.read_words(MemoryArea::DM, 100, 5).await?;
    println!("DM100-DM104: {:?}", reply.value);
    if let Some(warning) = reply.warning {
        println!("  warning: {}", warning);
    }

    client.write_words(MemoryArea::DM, 200, &[0x1234, -1]).await?;
    let reply = client.read_words(MemoryArea::DM, 200, 2).await?;
    println!("DM200-DM201 after write: {:?}", reply.value);

    // =========================================================================
    // Bits
    // =========================================================================

    println!("\n=== Bits ===\n");

    let bit = client.read_bit(MemoryArea::CIO, "0.05").await?;
    println!("CIO 0.05 = {}", bit.value);

    client.write_bit(MemoryArea::WR, "10.00", true).await?;
    println!("W10.00 set");

    match client.read_bit(MemoryArea::CIO, "not-an-address").await {
        Err(e @ FinsError::AddressFormat { .. }) => println!("Rejected locally: {}", e),
        other => println!("Unexpected: {:?}", other),
    }

    // =========================================================================
    // REAL
    // =========================================================================

    println!("\n=== REAL ===\n");

    client.write_real(MemoryArea::DM, 300, 3.14).await?;
    let real = client.read_real(MemoryArea::DM, 300).await?;
    println!("DM300 (REAL) = {}", real.value);

    // =========================================================================
    // PLC errors
    // =========================================================================

    match client.read_words(MemoryArea::DM, 32767, 10).await {
        Ok(reply) => println!("\nDM32767: {:?}", reply.value),
        Err(e) => println!(
            "\nPLC error: main=0x{:02X} sub=0x{:02X} ({}), recoverable: {}",
            e.main_code(),
            e.sub_code(),
            e.description(),
            e.is_recoverable()
        ),
    }

    client.disconnect().await;
    Ok(())
}
