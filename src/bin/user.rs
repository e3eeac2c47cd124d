//! One-shot client that issues a single `Forward` (§6 CLI surface:
//! `user -i USERID -d COORDINATOR_ENDPOINT`).

use clap::Parser;

use ringkv::error::CliError;
use ringkv::rpc::messages::ForwardArgs;
use ringkv::rpc::{call, Request};

#[derive(Parser, Debug)]
#[command(name = "user")]
struct Args {
    /// User id to route a request for.
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

    let request = Request::Forward(ForwardArgs { id: args.id.clone(), node_id: None });
    let result: Result<(), CliError> = match call(&args.coordinator, request).await {
        Ok(resp) if resp.is_success() => Ok(()),
        Ok(_) => Err(CliError::Rejected(format!("request for {} failed", args.id))),
        Err(e) => Err(CliError::Connect(format!(
            "could not reach coordinator at {}: {e}",
            args.coordinator
        ))),
    };

    if let Err(e) = result {
        eprintln!("user: {e}");
        std::process::exit(1);
    }
    println!("ok");
}
