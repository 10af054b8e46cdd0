use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "orders-cli")]
#[command(about = "Command-line client for the order service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service health and parts breaker state
    Health,
    /// List all orders
    List,
    /// Show one order
    Get { order_id: u64 },
    /// Place an order
    Create {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        part_id: i64,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
    },
    /// Delete an order
    Delete { order_id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::List => client.get(format!("{base}/api/orders")).send().await?,
        Commands::Get { order_id } => {
            client
                .get(format!("{base}/api/orders/{order_id}"))
                .send()
                .await?
        }
        Commands::Create {
            user_id,
            part_id,
            quantity,
        } => {
            client
                .post(format!("{base}/api/orders"))
                .json(&json!({
                    "user_id": user_id,
                    "part_id": part_id,
                    "quantity": quantity,
                }))
                .send()
                .await?
        }
        Commands::Delete { order_id } => {
            client
                .delete(format!("{base}/api/orders/{order_id}"))
                .send()
                .await?
        }
    };

    print_response(res).await
}

#[derive(Debug, Error)]
#[error("order service returned status {status}")]
struct StatusError {
    status: reqwest::StatusCode,
}

fn ensure_success(status: reqwest::StatusCode) -> Result<(), StatusError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(StatusError { status })
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if let Err(e) = ensure_success(status) {
        eprintln!("Error: {}", e);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Err(e.into());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
