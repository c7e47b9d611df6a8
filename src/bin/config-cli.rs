use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Query and manage the domain configuration service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin key, sent as a Bearer token.
    #[arg(short, long, env = "CONFIG_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a domain's config for a language
    Query {
        domain: String,
        #[arg(short, long)]
        lang: Option<String>,
        /// Sent as the Accept-Language header
        #[arg(long)]
        accept_language: Option<String>,
    },
    /// Resolve a domain's default-language config
    Default { domain: String },
    /// Show service status
    Status,
    /// Drop cached entries for one domain
    InvalidateDomain { domain: String },
    /// Drop cached entries for every domain using a config
    InvalidateConfig { config_id: i64 },
    /// Drop every cached entry
    InvalidateAll,
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
        Commands::Query { domain, lang, accept_language } => {
            let mut query = vec![("domain", domain)];
            if let Some(lang) = lang {
                query.push(("lang", lang));
            }
            let mut headers = HeaderMap::new();
            if let Some(value) = accept_language {
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&value)?);
            }
            client.get(format!("{base}/api/query/language"))
                .query(&query)
                .headers(headers)
                .send()
                .await?
        }
        Commands::Default { domain } => {
            client.get(format!("{base}/api/query/default"))
                .query(&[("domain", domain)])
                .send()
                .await?
        }
        Commands::Status => {
            client.get(format!("{base}/admin/status"))
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::InvalidateDomain { domain } => {
            let mut url = reqwest::Url::parse(&format!("{base}/admin/cache/invalidate/domain/"))?;
            url.path_segments_mut()
                .map_err(|_| "service URL cannot be a base")?
                .pop_if_empty()
                .push(&domain);
            client.post(url)
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::InvalidateConfig { config_id } => {
            client.post(format!("{base}/admin/cache/invalidate/config/{config_id}"))
                .headers(admin_headers)
                .send()
                .await?
        }
        Commands::InvalidateAll => {
            client.post(format!("{base}/admin/cache/invalidate"))
                .headers(admin_headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{body}");
    } else {
        eprintln!("Error: service returned status {status}");
        eprintln!("{body}");
        std::process::exit(1);
    }
    Ok(())
}
