use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "order-cli")]
#[command(about = "Management CLI for the order service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, needed for status and dead-letter commands.
    #[arg(short, long, env = "ORDER_SERVICE_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an order
    Create { item: String, quantity: u32 },
    /// Fetch one order
    Get { id: String },
    /// Replace an order's item and quantity
    Update {
        id: String,
        item: String,
        quantity: u32,
    },
    /// Delete an order
    Delete { id: String },
    /// List all orders
    List,
    /// Show service status
    Status,
    /// Show cache statistics
    Cache,
    /// Show events waiting in the dead-letter queue
    DeadLetters,
    /// Redeliver every dead-lettered event
    Redrive,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut admin_headers = HeaderMap::new();
    if !cli.key.is_empty() {
        admin_headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let res = match cli.command {
        Commands::Create { item, quantity } => {
            client
                .post(format!("{}/v1/orders", base))
                .json(&json!({ "item": item, "quantity": quantity }))
                .send()
                .await?
        }
        Commands::Get { id } => client.get(format!("{}/v1/orders/{}", base, id)).send().await?,
        Commands::Update { id, item, quantity } => {
            client
                .put(format!("{}/v1/orders/{}", base, id))
                .json(&json!({ "item": item, "quantity": quantity }))
                .send()
                .await?
        }
        Commands::Delete { id } => {
            client
                .delete(format!("{}/v1/orders/{}", base, id))
                .send()
                .await?
        }
        Commands::List => client.get(format!("{}/v1/orders", base)).send().await?,
        Commands::Status => {
            client
                .get(format!("{}/admin/status", base))
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::Cache => {
            client
                .get(format!("{}/admin/cache", base))
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::DeadLetters => {
            client
                .get(format!("{}/admin/dead-letters", base))
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::Redrive => {
            client
                .post(format!("{}/admin/dead-letters/redrive", base))
                .headers(admin_headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if !status.is_success() {
        eprintln!("Error: service returned status {} (request {})", status, request_id);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
