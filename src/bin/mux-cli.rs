use clap::{ArgGroup, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mux-cli")]
#[command(about = "Management CLI for the dynamic mux admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "MUX_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mux status
    Status,
    /// List registered patterns
    Routes,
    /// Register a pattern
    #[command(group(ArgGroup::new("handler").required(true).args(["body", "redirect", "proxy"])))]
    Register {
        pattern: String,
        /// Answer with a fixed text body
        #[arg(long)]
        body: Option<String>,
        /// Answer with a permanent redirect to this location
        #[arg(long)]
        redirect: Option<String>,
        /// Forward requests to this upstream host:port
        #[arg(long)]
        proxy: Option<String>,
    },
    /// Remove a registered pattern
    Deregister { pattern: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let routes_url = format!("{}/admin/routes", cli.url);

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let res = client.get(&routes_url).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Register {
            pattern,
            body,
            redirect,
            proxy,
        } => {
            let handler = match (body, redirect, proxy) {
                (Some(body), _, _) => json!({ "type": "static", "body": body }),
                (_, Some(location), _) => json!({ "type": "redirect", "location": location }),
                (_, _, Some(upstream)) => json!({ "type": "proxy", "upstream": upstream }),
                (None, None, None) => unreachable!("clap requires one handler flag"),
            };
            let res = client
                .post(&routes_url)
                .headers(headers)
                .json(&json!({ "pattern": pattern, "handler": handler }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Deregister { pattern } => {
            let res = client
                .delete(&routes_url)
                .headers(headers)
                .query(&[("pattern", pattern.as_str())])
                .send()
                .await?;
            let status = res.status();
            if status.is_success() {
                println!("deregistered {}", pattern);
            } else {
                print_response(res).await?;
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
