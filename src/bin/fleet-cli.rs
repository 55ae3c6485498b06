use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "fleet-cli")]
#[command(about = "Management CLI for the fleet controller", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check controller status and fleet counts
    Status,
    /// List every registered host
    Hosts,
    /// Show one host
    Host { host: String },
    /// Register or re-register a host
    Register {
        host: String,
        /// Replicas the host already runs
        #[arg(long, default_value_t = 0)]
        replicas: u32,
        /// Register as running instead of unknown
        #[arg(long)]
        running: bool,
    },
    /// Set the replica count of a host
    Scale { host: String, replicas: u32 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
        Commands::Hosts => client.get(format!("{}/hosts", base)).send().await?,
        Commands::Host { host } => client.get(format!("{}/hosts/{}", base, host)).send().await?,
        Commands::Register {
            host,
            replicas,
            running,
        } => {
            let status = if running { "running" } else { "unknown" };
            client
                .post(format!("{}/register", base))
                .json(&json!({ "host": host, "status": status, "replicas": replicas }))
                .send()
                .await?
        }
        Commands::Scale { host, replicas } => {
            client
                .post(format!("{}/scale", base))
                .json(&json!({ "host": host, "replicas": replicas }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: controller returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
