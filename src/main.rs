mod cli;

use markify::{
    config,
    convert::{AdvancedConverter, ConversionMode, Converter, ConverterRegistry, SourceDocument},
    jobs::{JobQueue, JobService, JobStore, WorkerPool},
    server,
    storage::DocumentStorage,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn start_server(
    host: String,
    port: u16,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting markify server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    // Storage layout for uploads and artifacts
    let storage = Arc::new(DocumentStorage::new(&config.jobs.data_dir)?);
    tracing::info!("Using data directory {:?}", config.jobs.data_dir);

    // Converter backends from config
    let registry = Arc::new(ConverterRegistry::from_config(&config.converters));
    for mode in [
        ConversionMode::Fast,
        ConversionMode::Advanced,
        ConversionMode::Cloud,
    ] {
        if registry.supports(mode) {
            tracing::info!("Conversion mode '{}' enabled", mode);
        } else {
            tracing::warn!("Conversion mode '{}' not configured, submissions will be rejected", mode);
        }
    }

    // Job engine: store + queue + service facade
    let store = Arc::new(JobStore::new(config.jobs.max_jobs));
    let queue = Arc::new(JobQueue::new(config.jobs.queue_capacity));
    let service = Arc::new(JobService::new(
        store.clone(),
        queue.clone(),
        registry.clone(),
        storage.clone(),
    ));

    // Start worker pool
    let pool = WorkerPool::spawn(config.jobs.workers, store, queue.clone(), registry, storage);

    // Start HTTP server; returns after the shutdown signal
    let server_result = server::start_server(config, service).await;

    // Cleanup
    tracing::info!("Shutting down...");
    queue.close();
    pool.join().await;

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "markify=trace,tower_http=debug".to_string()
        } else {
            "markify=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert {
            input,
            mode,
            output,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&input, &mode, output.as_deref(), cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("markify {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    input: &std::path::Path,
    mode: &str,
    output: Option<&std::path::Path>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let mode: ConversionMode = mode.parse()?;
    let registry = ConverterRegistry::from_config(&config.converters);
    let converter = registry
        .get(mode)
        .ok_or_else(|| anyhow::anyhow!("Conversion mode '{}' is not configured", mode))?;

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    let content = std::fs::read(input)?;

    tracing::info!("Converting {:?} with mode '{}'", input, mode);
    let markdown = converter
        .convert(SourceDocument { filename, content })
        .await?;

    match output {
        Some(path) => {
            std::fs::write(path, markdown.text.as_bytes())?;
            println!("Wrote {:?}", path);
        }
        None => print!("{}", markdown.text),
    }

    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking conversion backends...\n");

    println!("✓ fast (built-in plain text)");

    if config.converters.advanced.command.is_empty() {
        println!("✗ advanced - disabled (no command configured)");
    } else {
        let advanced = AdvancedConverter::new(&config.converters.advanced);
        match advanced.find_tool() {
            Some(path) => println!("✓ advanced ({}) - {}", advanced.command(), path.display()),
            None => println!(
                "✗ advanced ({}) - not found on PATH",
                advanced.command()
            ),
        }
    }

    match &config.converters.cloud.endpoint {
        Some(endpoint) => println!("✓ cloud - {}", endpoint),
        None => println!("✗ cloud - disabled (no endpoint configured)"),
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Workers: {}", config.jobs.workers);
            println!("  Queue capacity: {}", config.jobs.queue_capacity);
            println!("  Data dir: {:?}", config.jobs.data_dir);
            println!(
                "  Cloud mode: {}",
                if config.converters.cloud.endpoint.is_some() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
