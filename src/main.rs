mod cli;

use yuzu::{
    config,
    metadata::{Inputs, Provider},
    server::{self, AppContext},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting yuzu server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let ctx = AppContext::new(config)?;
    server::start_server(ctx).await
}

async fn run_provider(
    id: &str,
    inputs: Vec<(String, String)>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::new(config)?;
    ctx.registry.load_dirs(&ctx.config.providers.dirs);

    let provider = ctx.registry.get(id)?;
    let inputs: Inputs = inputs.into_iter().collect();

    let rendered = ctx
        .engine
        .run(&provider, &inputs)
        .await
        .with_context(|| format!("Provider {id} failed"))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&rendered.body)?;
    writeln!(stdout)?;
    Ok(())
}

fn validate_providers(paths: &[PathBuf]) -> Result<()> {
    let mut failed = 0;

    for path in paths {
        match Provider::from_path(path) {
            Ok(provider) => {
                println!("✓ {}", path.display());
                println!("  Id: {}", provider.id);
                println!("  Endpoints: {}", provider.endpoints.len());
                match provider.mime_type() {
                    Some(mime) => println!("  Output: {} ({})", provider.output.kind, mime),
                    None => println!("  Output: {} (unsupported)", provider.output.kind),
                }
            }
            Err(e) => {
                failed += 1;
                println!("✗ {}", path.display());
                println!("  {}", e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} provider files are invalid", failed, paths.len());
    }
    Ok(())
}

fn list_providers(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::new(config)?;
    ctx.registry.load_dirs(&ctx.config.providers.dirs);

    for id in ctx.registry.ids() {
        println!("{}", id);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "yuzu=trace,yuzu_common=debug,tower_http=debug".to_string()
        } else {
            "yuzu=debug,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `run` output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Run { id, inputs } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_provider(&id, inputs, cli.config.as_deref()))
        }
        Commands::Validate { paths } => validate_providers(&paths),
        Commands::Providers => list_providers(cli.config.as_deref()),
        Commands::Version => {
            println!("yuzu {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
