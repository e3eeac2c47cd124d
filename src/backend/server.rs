//! TCP front door for a backend node: one task per connection reads a
//! framed `Request`, dispatches it to the handle, and writes back the
//! `Response` (§5: dispatch tasks are lightweight adapters around the
//! single handler loop).

use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::rpc::transport::{read_frame, write_frame};
use crate::rpc::{Request, Response};

use super::handle::BackendHandle;

pub async fn run(listener: TcpListener, handle: BackendHandle) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "backend: connection accepted");
                let handle = handle.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, handle).await {
                        warn!(%peer, error = %e, "backend: connection dropped");
                    }
                });
            }
            Err(e) => warn!(error = %e, "backend: accept failed"),
        }
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    handle: BackendHandle,
) -> Result<(), crate::error::TransportError> {
    let request: Request = read_frame(&mut stream).await?;
    let response = dispatch(&handle, request).await;
    write_frame(&mut stream, &response).await
}

async fn dispatch(handle: &BackendHandle, request: Request) -> Response {
    match request {
        Request::GetRequest(args) => Response::Ack(handle.get_request(args).await),
        Request::GetReplicas(args) => Response::Ack(handle.get_replicas(args).await),
        Request::RecvState(args) => Response::Ack(handle.recv_state(args).await),
        Request::Lookup(args) => Response::Ack(handle.lookup(args).await),
        Request::CopyBulk(args) => Response::Bulk(handle.copy_bulk(args).await),
        Request::RemoveAll(args) => Response::Ack(handle.remove_all(args).await),
        Request::Copy(args) => Response::Ack(handle.copy(args).await),
        Request::Replace(args) => Response::Ack(handle.replace(args).await),
        Request::Join(_) | Request::Leave(_) | Request::Forward(_) => {
            warn!("backend received a coordinator-only verb");
            Response::ack(false)
        }
    }
}
