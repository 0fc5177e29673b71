use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the retina prediction gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cached inference service health
    Health {
        /// Also probe every endpoint
        #[arg(long)]
        full: bool,
    },
    /// Probe every endpoint and print remediation advice
    Diagnostics,
    /// Classify a retina image
    Predict {
        image: PathBuf,

        /// Content type sent with the image; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let request_id = uuid::Uuid::new_v4().to_string();

    let request = match cli.command {
        Commands::Health { full } => client
            .get(format!("{}/api/health", cli.url))
            .query(&[("full_test", full)]),
        Commands::Diagnostics => client.get(format!("{}/api/diagnostics", cli.url)),
        Commands::Predict { image, content_type } => {
            let bytes = tokio::fs::read(&image).await?;
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&image).to_string());
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("retina-image")
                .to_string();
            let part = Part::bytes(bytes).file_name(file_name).mime_str(&content_type)?;
            client
                .post(format!("{}/api/predict", cli.url))
                .multipart(Form::new().part("file", part))
        }
    };

    let res = request.header("x-request-id", &request_id).send().await?;
    print_response(res).await
}

fn guess_content_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
