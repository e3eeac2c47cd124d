//! Backend node launcher (§6 CLI surface:
//! `node -p PORT -w WEIGHT -i ID -d COORDINATOR_ENDPOINT`).

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use ringkv::backend::{server, BackendActor};
use ringkv::error::CliError;
use ringkv::rpc::messages::{JoinArgs, LeaveArgs};
use ringkv::rpc::{call, Request};

/// Start a backend node and join the cluster.
#[derive(Parser, Debug)]
#[command(name = "node")]
struct Args {
    /// Port to listen on.
    #[arg(short, long)]
    port: u16,
    /// Ring weight (number of points this node contributes).
    #[arg(short, long, default_value_t = 1)]
    weight: u32,
    /// Node id; defaults to this node's own listen address.
    #[arg(short, long)]
    id: Option<String>,
    /// Coordinator's `host:port`.
    #[arg(short = 'd', long = "coordinator")]
    coordinator: String,
}

#[tokio::main]
async fn main() {
    ringkv::logging::init();
    let args = Args::parse();

    let listener = match TcpListener::bind(("0.0.0.0", args.port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(port = args.port, error = %e, "node: failed to bind listener");
            eprintln!("node: failed to bind port {}: {e}", args.port);
            std::process::exit(1);
        }
    };

    let endpoint = format!("127.0.0.1:{}", args.port);
    let id = args.id.clone().unwrap_or_else(|| endpoint.clone());

    // The accept loop must be live before Join is sent: the coordinator's
    // Join handler calls straight back into this node (GetReplicas,
    // Lookup, RemoveAll) as part of the same request, and those calls
    // must not find a closed door.
    let handle = BackendActor::spawn(id.clone(), args.weight, endpoint);
    let server_handle = handle.clone();
    tokio::spawn(async move {
        server::run(listener, server_handle).await;
    });

    let join = Request::Join(JoinArgs {
        port: args.port,
        id: id.clone(),
        weight: args.weight,
    });
    let join_result: Result<(), CliError> = match call(&args.coordinator, join).await {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(_) => Err(CliError::Rejected(format!("coordinator rejected Join for id {id}"))),
        Err(e) => Err(CliError::Connect(format!(
            "could not reach coordinator at {}: {e}",
            args.coordinator
        ))),
    };
    if let Err(e) = join_result {
        eprintln!("node: {e}");
        std::process::exit(1);
    }
    info!(id = %id, coordinator = %args.coordinator, "node: joined cluster");

    if tokio::signal::ctrl_c().await.is_ok() {
        info!(id = %id, "node: stop signal received, leaving cluster");
        let leave = Request::Leave(LeaveArgs { id: id.clone() });
        if let Err(e) = call(&args.coordinator, leave).await {
            warn!(id = %id, error = %e, "node: Leave on shutdown failed");
        }
    }
}
