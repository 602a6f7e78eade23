//! End-to-end tests against an in-process FINS/TCP server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use omron_fins_tcp::{Client, ClientConfig, FinsError, MemoryArea, NodeIdentity};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const CLIENT_NODE: u8 = 0x0A;
const PLC_NODE: u8 = 0x01;

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Normal,
    /// Sends part of the response, then closes the connection.
    Truncate,
    /// Rejects every command at the FINS/TCP header level.
    RejectHeader,
}

#[derive(Debug, Default)]
struct PlcMemory {
    dm: HashMap<u16, i16>,
    cio_bits: HashMap<(u16, u8), bool>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("omron_fins_tcp=debug")
        .with_test_writer()
        .try_init();
}

/// Starts a fake PLC and returns its port.
///
/// Every connection that does not send a node address request is treated as
/// a reachability probe and dropped.
async fn spawn_plc(behavior: Behavior) -> (u16, Arc<Mutex<PlcMemory>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let memory = Arc::new(Mutex::new(PlcMemory::default()));

    let shared = Arc::clone(&memory);
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(serve(socket, Arc::clone(&shared), behavior));
        }
    });

    (port, memory)
}

async fn serve(mut socket: TcpStream, memory: Arc<Mutex<PlcMemory>>, behavior: Behavior) {
    let mut request = [0u8; 20];
    if socket.read_exact(&mut request).await.is_err() {
        return;
    }
    assert_eq!(&request[..4], b"FINS");
    assert_eq!(&request[4..8], &[0x00, 0x00, 0x00, 0x0C]);
    socket.write_all(&handshake_response()).await.unwrap();

    loop {
        let mut head = [0u8; 16];
        if socket.read_exact(&mut head).await.is_err() {
            return;
        }
        let length = u32::from_be_bytes([head[4], head[5], head[6], head[7]]) as usize;
        let mut body = vec![0u8; length - 8];
        socket.read_exact(&mut body).await.unwrap();
        let frame = [head.as_slice(), body.as_slice()].concat();

        match behavior {
            Behavior::Normal => {
                let reply = execute(&frame, &memory);
                socket.write_all(&reply).await.unwrap();
            }
            Behavior::Truncate => {
                let reply = execute(&frame, &memory);
                socket.write_all(&reply[..20]).await.unwrap();
                return;
            }
            Behavior::RejectHeader => {
                let mut header = [0u8; 16];
                header[..4].copy_from_slice(b"FINS");
                header[7] = 0x08;
                header[11] = 0x03;
                header[15] = 0x03;
                socket.write_all(&header).await.unwrap();
                return;
            }
        }
    }
}

fn handshake_response() -> [u8; 24] {
    let mut bytes = [0u8; 24];
    bytes[..4].copy_from_slice(b"FINS");
    bytes[7] = 0x10;
    bytes[11] = 0x01;
    bytes[19] = CLIENT_NODE;
    bytes[23] = PLC_NODE;
    bytes
}

fn execute(frame: &[u8], memory: &Mutex<PlcMemory>) -> Vec<u8> {
    assert_eq!(frame[16], 0x80);
    assert_eq!(frame[20], PLC_NODE);
    assert_eq!(frame[23], CLIENT_NODE);
    assert_eq!(frame[25], 0xFF);

    let command = u16::from_be_bytes([frame[26], frame[27]]);
    let area = frame[28];
    let address = u16::from_be_bytes([frame[29], frame[30]]);
    let bit = frame[31];
    let count = u16::from_be_bytes([frame[32], frame[33]]);
    let payload = &frame[34..];
    let mut memory = memory.lock().unwrap();

    let (end_code, data): ([u8; 2], Vec<u8>) = match (command, area) {
        (0x0101, 0x82) => {
            let data = (0..count)
                .flat_map(|i| memory.dm.get(&(address + i)).copied().unwrap_or(0).to_be_bytes())
                .collect();
            ([0x00, 0x00], data)
        }
        (0x0102, 0x82) => {
            for (i, word) in payload.chunks_exact(2).enumerate() {
                memory
                    .dm
                    .insert(address + i as u16, i16::from_be_bytes([word[0], word[1]]));
            }
            ([0x00, 0x00], Vec::new())
        }
        (0x0101, 0x30) => {
            let value = memory.cio_bits.get(&(address, bit)).copied().unwrap_or(false);
            ([0x00, 0x00], vec![u8::from(value)])
        }
        (0x0102, 0x30) => {
            memory.cio_bits.insert((address, bit), payload[0] == 1);
            ([0x00, 0x00], Vec::new())
        }
        // AR reads succeed with the continuable alarm set
        (0x0101, 0xB3) => ([0x00, 0x40], vec![0x00; 2 * count as usize]),
        // area not available on this CPU
        _ => ([0x11, 0x01], Vec::new()),
    };

    let mut reply = b"FINS".to_vec();
    reply.extend_from_slice(&(22 + data.len() as u32).to_be_bytes());
    reply.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 0]);
    reply.extend_from_slice(&[
        0xC0, 0x00, 0x02, 0x00, CLIENT_NODE, 0x00, 0x00, PLC_NODE, 0x00, 0xFF,
    ]);
    reply.extend_from_slice(&command.to_be_bytes());
    reply.extend_from_slice(&end_code);
    reply.extend_from_slice(&data);
    reply
}

async fn connect(port: u16) -> Client {
    init_tracing();
    let config = ClientConfig::new("127.0.0.1")
        .with_port(port)
        .with_probe_timeout(Duration::from_secs(1));
    let mut client = Client::new(config);
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn test_handshake_assigns_nodes() {
    let (port, _) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    assert!(client.is_connected());
    assert_eq!(
        client.node_identity(),
        Some(NodeIdentity::new(CLIENT_NODE, PLC_NODE))
    );

    client.disconnect().await;
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_write_then_read_words() {
    let (port, memory) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    client
        .write_words(MemoryArea::DM, 200, &[1, -32768, 32767])
        .await
        .unwrap();
    assert_eq!(memory.lock().unwrap().dm.get(&201), Some(&i16::MIN));

    let reply = client.read_words(MemoryArea::DM, 200, 3).await.unwrap();
    assert_eq!(reply.value, vec![1, -32768, 32767]);
    assert!(!reply.has_warning());

    client.write_word(MemoryArea::DM, 5, 42).await.unwrap();
    assert_eq!(client.read_word(MemoryArea::DM, 5).await.unwrap().value, 42);
}

#[tokio::test]
async fn test_write_then_read_bit() {
    let (port, memory) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    client.write_bit(MemoryArea::CIO, "100.05", true).await.unwrap();
    assert_eq!(memory.lock().unwrap().cio_bits.get(&(100, 5)), Some(&true));

    assert!(client.read_bit(MemoryArea::CIO, "100.05").await.unwrap().value);
    assert!(!client.read_bit(MemoryArea::CIO, "100.06").await.unwrap().value);
}

#[tokio::test]
async fn test_real_round_trip() {
    let (port, _) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    client.write_real(MemoryArea::DM, 300, 3.14).await.unwrap();
    assert_eq!(client.read_real(MemoryArea::DM, 300).await.unwrap().value, 3.14);
}

#[tokio::test]
async fn test_end_code_error_keeps_connection() {
    let (port, _) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    let err = client.read_words(MemoryArea::HR, 0, 4).await.unwrap_err();
    assert!(matches!(err, FinsError::EndCode(_)));
    assert_eq!((err.main_code(), err.sub_code()), (0x11, 0x01));
    assert!(!err.is_recoverable());

    assert!(client.is_connected());
    assert_eq!(client.read_words(MemoryArea::DM, 0, 1).await.unwrap().value, vec![0]);
}

#[tokio::test]
async fn test_recoverable_end_code_reported_as_warning() {
    let (port, _) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    let reply = client.read_words(MemoryArea::AR, 0, 2).await.unwrap();

    assert_eq!(reply.value, vec![0, 0]);
    let warning = reply.warning.unwrap();
    assert_eq!((warning.main_code, warning.sub_code), (0x00, 0x40));
}

#[tokio::test]
async fn test_malformed_bit_address_is_local() {
    let (port, _) = spawn_plc(Behavior::Normal).await;
    let mut client = connect(port).await;

    let err = client.read_bit(MemoryArea::CIO, "abc.5").await.unwrap_err();
    assert!(matches!(err, FinsError::AddressFormat { .. }));
    let err = client.read_bit(MemoryArea::CIO, "100").await.unwrap_err();
    assert!(matches!(err, FinsError::AddressFormat { .. }));

    // the stream is still aligned
    assert!(client.read_words(MemoryArea::DM, 0, 1).await.is_ok());
}

#[tokio::test]
async fn test_truncated_response_drops_connection() {
    let (port, _) = spawn_plc(Behavior::Truncate).await;
    let mut client = connect(port).await;

    let err = client.read_words(MemoryArea::DM, 0, 2).await.unwrap_err();

    assert!(matches!(err, FinsError::ProtocolFraming { .. }));
    assert!(!client.is_connected());
    assert!(matches!(
        client.read_words(MemoryArea::DM, 0, 2).await,
        Err(FinsError::NotConnected)
    ));
}

#[tokio::test]
async fn test_head_status_rejection() {
    let (port, _) = spawn_plc(Behavior::RejectHeader).await;
    let mut client = connect(port).await;

    let err = client.read_words(MemoryArea::DM, 0, 1).await.unwrap_err();

    match err {
        FinsError::HeadStatus { code, description } => {
            assert_eq!(code, 0x03);
            assert_eq!(description, "command not supported");
        }
        other => panic!("expected head status error, got {:?}", other),
    }
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_unreachable_plc() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ClientConfig::new("127.0.0.1")
        .with_port(port)
        .with_probe_timeout(Duration::from_millis(500));
    let mut client = Client::new(config);

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, FinsError::Transport { .. }));
    assert!(!client.is_connected());
}
