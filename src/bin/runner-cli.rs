use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "runner-cli")]
#[command(about = "Client for the request runner API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a request through the service
    Run {
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Target URL
        #[arg(short, long)]
        target: String,

        /// Header as "Name: value"; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body text
        #[arg(short, long)]
        data: Option<String>,

        /// Timeout in milliseconds (0 selects the server default)
        #[arg(long, default_value_t = 0)]
        timeout: i64,

        /// Print the response body as text instead of base64
        #[arg(long)]
        decode_body: bool,
    },
    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Run {
            method,
            target,
            headers,
            data,
            timeout,
            decode_body,
        } => {
            let mut description = json!({
                "method": method,
                "url": target,
                "headers": parse_headers(&headers)?,
                "timeout": timeout,
            });
            if let Some(data) = data {
                description["body"] = Value::String(data);
            }

            let res = client
                .post(format!("{}/api/v1/request", cli.url))
                .json(&description)
                .send()
                .await?;
            print_response(res, decode_body).await?;
        }
        Commands::Health => {
            let res = client
                .get(format!("{}/api/v1/healthcheck", cli.url))
                .send()
                .await?;
            print_response(res, false).await?;
        }
    }

    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<Map<String, Value>, String> {
    let mut headers = Map::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("header '{line}' is not in 'Name: value' form"))?;
        let values = headers
            .entry(name.trim().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value.trim().to_string()));
        }
    }
    Ok(headers)
}

async fn print_response(res: reqwest::Response, decode_body: bool) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let mut json: Value = res.json().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }

    if decode_body {
        if let Some(Value::String(encoded)) = json.get("body") {
            let bytes = BASE64.decode(encoded)?;
            json["body"] = Value::String(String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
