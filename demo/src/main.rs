//! streamcp-demo: drive a live MCP server through one full session.
//!
//! ```text
//! streamcp-demo --url http://localhost:3001
//! RUST_LOG=streamcp=debug streamcp-demo --config client.toml --log-json
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use streamcp_client::{ClientConfig, CloseOutcome, McpClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run initialize, tools, resources, prompts, ping and close against an MCP server
#[derive(Parser, Debug)]
#[command(name = "streamcp-demo", version, about)]
struct Cli {
    /// Server base URL; overrides `base_url` from the config file
    #[arg(long, env = "STREAMCP_URL")]
    url: Option<String>,

    /// Configuration file (toml, yaml or json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

const DEFAULT_URL: &str = "http://localhost:3001";

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::new(DEFAULT_URL),
        };
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamcp=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[derive(Debug, Default)]
struct Summary {
    steps: Vec<(&'static str, Result<String, String>)>,
}

impl Summary {
    fn record<T>(
        &mut self,
        step: &'static str,
        outcome: streamcp_client::Result<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.steps.push((step, Ok(describe(&value))));
                Some(value)
            }
            Err(e) => {
                warn!(step, category = %e.category(), error = %e, "Step failed");
                self.steps.push((step, Err(e.to_string())));
                None
            }
        }
    }

    fn failures(&self) -> usize {
        self.steps.iter().filter(|(_, r)| r.is_err()).count()
    }

    fn print(&self) {
        for (step, outcome) in &self.steps {
            match outcome {
                Ok(detail) => println!("  ok    {step:<16} {detail}"),
                Err(error) => println!("  FAIL  {step:<16} {error}"),
            }
        }
        println!("{} step(s), {} failed", self.steps.len(), self.failures());
    }
}

async fn run(client: &McpClient) -> Summary {
    let mut summary = Summary::default();

    let Some(session) = summary.record("initialize", client.initialize().await, |s| {
        format!("session {} ({})", s.session_id(), s.server_info())
    }) else {
        return summary;
    };
    info!(features = ?session.features(), "Server capabilities");

    summary.record("list tools", client.list_tools().await, |tools| {
        format!("{} tool(s)", tools.len())
    });
    summary.record(
        "echo",
        client.call_tool("echo", json!({"message": "hello from streamcp"})).await,
        |result| result.text(),
    );
    summary.record("add", client.add(2.0, 3.0).await, |sum| format!("2 + 3 = {sum}"));
    summary.record("list resources", client.list_resources().await, |resources| {
        format!("{} resource(s)", resources.len())
    });
    summary.record("list prompts", client.list_prompts().await, |prompts| {
        format!("{} prompt(s)", prompts.len())
    });

    let started = Instant::now();
    summary.record("ping", client.ping().await, |_| {
        format!("{} ms", started.elapsed().as_millis())
    });

    summary.record("close", client.close().await, |outcome| match outcome {
        CloseOutcome::Acknowledged => "server acknowledged".to_string(),
        CloseOutcome::NotAcknowledged => "closed locally".to_string(),
        CloseOutcome::NoSession => "no session".to_string(),
    });
    summary
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.client_config()?;
    let endpoint = config.endpoint_url()?;
    let client = McpClient::new(config).context("invalid client configuration")?;

    println!("MCP endpoint {endpoint}");
    let summary = run(&client).await;
    summary.print();

    if summary.failures() > 0 {
        anyhow::bail!("{} step(s) failed", summary.failures());
    }
    Ok(())
}
