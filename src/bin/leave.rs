//! One-shot client that issues a single `Leave` (§6 CLI surface:
//! `leave -i NODEID -d COORDINATOR_ENDPOINT`).

use clap::Parser;

use ringkv::error::CliError;
use ringkv::rpc::messages::LeaveArgs;
use ringkv::rpc::{call, Request};

#[derive(Parser, Debug)]
#[command(name = "leave")]
struct Args {
    /// Node id to remove from the ring.
    #[arg(short, long)]
    id: String,
    /// Coordinator's `host:port`.
    #[arg(short = 'd', long = "coordinator")]
    coordinator: String,
}

#[tokio::main]
async fn main() {
    ringkv::logging::init();
    let args = Args::parse();

    let request = Request::Leave(LeaveArgs { id: args.id.clone() });
    let result: Result<(), CliError> = match call(&args.coordinator, request).await {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(_) => Err(CliError::Rejected(format!("coordinator rejected Leave for {}", args.id))),
        Err(e) => Err(CliError::Connect(format!(
            "could not reach coordinator at {}: {e}",
            args.coordinator
        ))),
    };

    if let Err(e) = result {
        eprintln!("leave: {e}");
        std::process::exit(1);
    }
    println!("ok");
}
