// Sends a control message to a running router, e.g. to take a link down by
// hand: `dive-control R2 127.0.0.1:9001` makes the router at that address
// treat its link to R2 as failed.

use clap::Parser;

use dive_router::client::ProtocolClient;
use dive_router::protocol::{encode, ControlMessage, WireMessage, DOWN_COMMAND};
use dive_router::utils::{init_logger, Logger, RetryPolicy};

#[derive(Parser)]
#[command(name = "dive-control", about = "Send a control message to a router")]
struct Cli {
    /// Router the message claims to come from
    origin_id: String,

    /// Destination router as host:port
    address: String,

    /// Command to send
    #[arg(long, default_value = DOWN_COMMAND)]
    command: String,

    /// Connection attempts before giving up on a refusing peer
    #[arg(long, default_value_t = 5)]
    attempts: u32,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logger(false);

    let Some((host, port)) = cli.address.rsplit_once(':') else {
        eprintln!("Invalid address {} (expected host:port)", cli.address);
        std::process::exit(1);
    };
    let port: u16 = match port.parse() {
        Ok(port) => port,
        Err(_) => {
            eprintln!("Invalid port in {}", cli.address);
            std::process::exit(1);
        }
    };

    let message = WireMessage::ControlMessage(ControlMessage {
        origin_id: cli.origin_id.clone(),
        command: cli.command.clone(),
    });
    let payload = match encode(&message) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let retry = RetryPolicy {
        max_attempts: Some(cli.attempts.max(1)),
        ..RetryPolicy::default()
    };
    let client = ProtocolClient::new(retry, Logger::new("control"));
    match client.send_to(host, port, &payload).await {
        Ok(sent) => println!("Message '{}' sent to {} ({} bytes)", cli.command, cli.address, sent),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
