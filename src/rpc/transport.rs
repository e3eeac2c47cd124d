//! Framed TCP transport (§6 wire encoding, §5 timeouts).
//!
//! Each frame is a 4-byte big-endian length prefix followed by a
//! `bincode`-encoded envelope. `call` is the one piece every outbound
//! RPC site in this crate goes through: dial, send, read-reply, all
//! under a single deadline.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::TransportError;
use crate::rpc::messages::{Request, Response};

/// Every outbound call fails fast rather than hanging a handler loop
/// indefinitely on a dead peer (§5 Cancellation & timeouts).
pub const CALL_DEADLINE: Duration = Duration::from_secs(5);

const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

pub async fn write_frame<T: serde::Serialize>(
    stream: &mut TcpStream,
    msg: &T,
) -> Result<(), TransportError> {
    let payload = bincode::serialize(msg)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| TransportError::Codec(Box::new(bincode::ErrorKind::SizeLimit)))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&payload).await?;
    Ok(())
}

pub async fn read_frame<T: serde::de::DeserializeOwned>(
    stream: &mut TcpStream,
) -> Result<T, TransportError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(TransportError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(TransportError::Codec(Box::new(bincode::ErrorKind::SizeLimit)));
    }
    let mut payload = BytesMut::zeroed(len as usize);
    stream.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}

/// Dial `endpoint`, send `request`, and wait for the reply — all within
/// `CALL_DEADLINE`. Used by both coordinator and backend handler loops
/// whenever they need to issue an outbound RPC.
pub async fn call(endpoint: &str, request: Request) -> Result<Response, TransportError> {
    timeout(CALL_DEADLINE, call_inner(endpoint, request))
        .await
        .map_err(|_| TransportError::Timeout)?
}

async fn call_inner(endpoint: &str, request: Request) -> Result<Response, TransportError> {
    let mut stream = TcpStream::connect(endpoint).await?;
    write_frame(&mut stream, &request).await?;
    read_frame(&mut stream).await
}
