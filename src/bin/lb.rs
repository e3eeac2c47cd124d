//! Coordinator launcher (§6 CLI surface: `lb -p PORT`).

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use ringkv::coordinator::{server, CoordinatorActor};

/// Start the coordinator, the single process that owns the ring.
#[derive(Parser, Debug)]
#[command(name = "lb")]
struct Args {
    /// Port to listen on.
    #[arg(short, long)]
    port: u16,
}

#[tokio::main]
async fn main() {
    ringkv::logging::init();
    let args = Args::parse();

    let listener = match TcpListener::bind(("0.0.0.0", args.port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(port = args.port, error = %e, "lb: failed to bind listener");
            eprintln!("lb: failed to bind port {}: {e}", args.port);
            std::process::exit(1);
        }
    };

    info!(port = args.port, "lb: coordinator listening");
    let handle = CoordinatorActor::spawn();
    server::run(listener, handle).await;
}
