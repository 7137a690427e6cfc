use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use inbox_assist_lib::config::{resolve_public_base_url, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "inbox-assist", version, about = "OAuth, Gmail and AI backend for a browser email assistant")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "INBOX_ASSIST_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Public URL the browser reaches this server at; the OAuth redirect URI is derived from it
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Host name assigned by the hosting platform, used when no public URL is given
    #[arg(long, env = "VERCEL_URL", hide = true)]
    platform_host: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_ID", hide_env_values = true)]
    google_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    google_client_secret: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: Option<String>,

    /// Timeout for each call to Google or OpenAI, in seconds
    #[arg(long, env = "INBOX_ASSIST_UPSTREAM_TIMEOUT", default_value_t = 30)]
    upstream_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("inbox_assist=info,inbox_assist_lib=info,warp=warn")),
        )
        .init();

    let args = Args::parse();

    let base_url = resolve_public_base_url(
        args.public_base_url.as_deref(),
        args.platform_host.as_deref(),
        args.bind.port(),
    );

    let config = ServerConfig::new(&base_url)
        .context("invalid public base URL")?
        .with_google_credentials(args.google_client_id, args.google_client_secret)
        .with_openai(args.openai_api_key, args.openai_model)
        .with_upstream_timeout(Duration::from_secs(args.upstream_timeout_secs));

    inbox_assist_lib::run(config, args.bind)
        .await
        .context("API server failed")
}
