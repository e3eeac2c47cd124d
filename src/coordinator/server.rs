//! TCP front door for the coordinator. `Join` is the one verb that
//! needs the accepting connection itself: the node's endpoint is
//! derived from the peer's source IP plus the port it asked for,
//! exactly at the moment the inbound connection is accepted.

use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::rpc::transport::{read_frame, write_frame};
use crate::rpc::{Request, Response};

use super::handle::CoordinatorHandle;

pub async fn run(listener: TcpListener, handle: CoordinatorHandle) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "coordinator: connection accepted");
                let handle = handle.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, peer.ip().to_string(), handle).await {
                        warn!(%peer, error = %e, "coordinator: connection dropped");
                    }
                });
            }
            Err(e) => warn!(error = %e, "coordinator: accept failed"),
        }
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    peer_ip: String,
    handle: CoordinatorHandle,
) -> Result<(), crate::error::TransportError> {
    let request: Request = read_frame(&mut stream).await?;
    let response = dispatch(&handle, request, &peer_ip).await;
    write_frame(&mut stream, &response).await
}

async fn dispatch(handle: &CoordinatorHandle, request: Request, peer_ip: &str) -> Response {
    match request {
        Request::Join(args) => {
            let endpoint = format!("{peer_ip}:{}", args.port);
            Response::Ack(handle.join(args, endpoint).await)
        }
        Request::Leave(args) => Response::Ack(handle.leave(args).await),
        Request::Forward(args) => Response::Ack(handle.forward(args).await),
        other => {
            warn!(?other, "coordinator received a backend-only verb");
            Response::ack(false)
        }
    }
}
