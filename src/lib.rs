//! # Omron FINS/TCP Protocol Library
//!
//! A Rust library for communicating with Omron PLCs using the FINS (Factory
//! Interface Network Service) protocol over TCP.
//!
//! This is a **protocol-only** library: no polling, schedulers or
//! application-level features. Each call produces exactly 1 request and 1
//! response. No automatic retries, caching, or reconnection.
//!
//! ## Features
//!
//! - **Protocol-only** — node address handshake, memory reads and writes
//! - **Deterministic** — fixed-offset frames, computed response lengths
//! - **Type-safe** — memory areas as enums, bit addresses validated before any I/O
//! - **No panics** — all errors returned as `Result<T, FinsError>`
//! - **Async** — tokio at the transport boundary, pluggable [`Transport`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use omron_fins_tcp::{Client, ClientConfig, MemoryArea};
//!
//! #[tokio::main]
//! async fn main() -> omron_fins_tcp::Result<()> {
//!     // Factory default IP of CJ/CS/NJ Ethernet units
//!     let mut client = Client::new(ClientConfig::new("192.168.1.250"));
//!     let identity = client.connect().await?;
//!     println!("connected as {}", identity);
//!
//!     // Read 10 words from DM100
//!     let reply = client.read_words(MemoryArea::DM, 100, 10).await?;
//!     println!("DM100-109: {:?}", reply.value);
//!
//!     // Write values to DM200
//!     client.write_words(MemoryArea::DM, 200, &[0x1234, 0x5678]).await?;
//!
//!     // Read a single bit from CIO 0.05
//!     let bit = client.read_bit(MemoryArea::CIO, "0.05").await?;
//!     println!("CIO 0.05 = {}", bit.value);
//!
//!     // REAL (two words)
//!     client.write_real(MemoryArea::DM, 300, 3.14).await?;
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Memory Areas
//!
//! | Area | Description | Word code | Bit code |
//! |------|-------------|:---------:|:--------:|
//! | [`MemoryArea::CIO`] | Core I/O - inputs, outputs, internal relays | 0xB0 | 0x30 |
//! | [`MemoryArea::WR`] | Work area - temporary work bits/words | 0xB1 | 0x31 |
//! | [`MemoryArea::HR`] | Holding area - retentive bits/words | 0xB2 | 0x32 |
//! | [`MemoryArea::AR`] | Auxiliary Relay - system status/control | 0xB3 | 0x33 |
//! | [`MemoryArea::DM`] | Data Memory - numeric data storage | 0x82 | 0x02 |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, FinsError>`]. Every error answers
//! `main_code()`, `sub_code()`, `description()` and `is_recoverable()`.
//!
//! ```no_run
//! use omron_fins_tcp::{Client, ClientConfig, FinsError, MemoryArea};
//!
//! # async fn run(client: &mut Client) {
//! match client.read_words(MemoryArea::DM, 100, 10).await {
//!     Ok(reply) if reply.has_warning() => println!("Data with warning: {:?}", reply.value),
//!     Ok(reply) => println!("Data: {:?}", reply.value),
//!     Err(FinsError::EndCode(status)) => println!("PLC error: {}", status),
//!     Err(e @ FinsError::Transport { .. }) => println!("Connection lost: {}", e),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! A recoverable end code (0x00, 0x40) is not an error: the operation
//! succeeds and the code is reported on [`Reply::warning`].
//!
//! ## Design Philosophy
//!
//! 1. Each operation does exactly what it says
//! 2. One request in flight per connection
//! 3. The application has full control over retry and reconnection
//! 4. Errors are always explicit and descriptive

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod command;
mod error;
mod handshake;
mod header;
mod memory;
mod response;
pub mod status;
mod transport;
mod value;

#[cfg(test)]
mod testing;

// Public re-exports
pub use client::{Client, ClientConfig};
pub use command::{
    Address, HandshakeCommand, ReadBitCommand, ReadWordCommand, WriteBitCommand, WriteWordCommand,
    COMMAND_FRAME_SIZE, HANDSHAKE_REQUEST_SIZE, HANDSHAKE_RESPONSE_SIZE, MAX_WORDS_PER_COMMAND,
    RESPONSE_HEADER_SIZE,
};
pub use error::{FinsError, Result};
pub use handshake::{parse_handshake_response, Handshake, HandshakeState};
pub use header::{FinsHeader, NodeIdentity, TcpHeader, FINS_HEADER_SIZE, TCP_HEADER_SIZE};
pub use memory::{AccessGranularity, MemoryArea};
pub use response::{FinsResponse, Reply};
pub use status::FinsStatus;
pub use transport::{TcpTransport, Transport, DEFAULT_FINS_PORT, DEFAULT_PROBE_TIMEOUT};
pub use value::RealLayout;
