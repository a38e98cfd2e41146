// ABOUTME: Entry point for the tagpull CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use output::Output;
use std::env;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tagpull::bridge::BridgeLocator;
use tagpull::config::{self, CONFIG_FILENAME, Config};
use tagpull::error::Result;
use tagpull::progress::ProgressRenderer;
use tagpull::pull::ImagePuller;
use tagpull::registry::RegistryClient;
use tagpull::resolve::{LocalCandidates, RegistryCandidates, TagResolver};
use tagpull::runtime::BollardEngine;
use tagpull::types::ImageName;
use tracing_subscriber::EnvFilter;

type Resolver = TagResolver<LocalCandidates<BollardEngine>, RegistryCandidates<RegistryClient>>;
type Puller = ImagePuller<BollardEngine, LocalCandidates<BollardEngine>, RegistryCandidates<RegistryClient>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());
    let result = run(cli, &mut output).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            output.result("initialized", &format!("Created {}", CONFIG_FILENAME));
            Ok(())
        }
        Commands::Resolve { ref image, force } => {
            let image = ImageName::parse(image)?;
            // Exact tags need neither the engine nor the registry
            if !image.needs_resolution() {
                output.result("resolved", image.tag());
                return Ok(());
            }

            let config = load_config(cli.config.as_deref(), &cwd)?;
            let resolver = build_resolver(&config)?.0;
            let tag = resolver.resolve(&image, force).await?;
            output.result("resolved", &tag);
            Ok(())
        }
        Commands::Pull { ref image, force } => {
            let image = ImageName::parse(image)?;
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let auth = config.registry.credentials()?;
            let puller = build_puller(&config)?;

            output.progress(&format!("Pulling {}", image));
            output.start_timer();
            let mut display = renderer(output);
            let resolved = puller.pull(&image, auth.as_ref(), force, &mut display).await?;
            output.result("pulled", &resolved.to_string());
            Ok(())
        }
        Commands::BridgeIp => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let probe_image = config.bridge.probe_image()?;
            let puller = build_puller(&config)?;

            let locator = BridgeLocator::new(&puller, probe_image);
            let mut display = renderer(output);
            let gateway = locator.locate(&mut display).await?;
            output.result("bridge_ip", &gateway);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, cwd: &Path) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover_or_default(cwd),
    }
}

fn build_resolver(config: &Config) -> Result<(Resolver, Arc<BollardEngine>)> {
    let engine = Arc::new(BollardEngine::connect(&config.engine_settings())?);
    let registry = RegistryClient::new(config.registry.timeout)?
        .with_auth(config.registry.credentials()?);

    let resolver = TagResolver::new(
        LocalCandidates::new(Arc::clone(&engine)),
        RegistryCandidates::new(Arc::new(registry)),
    );
    Ok((resolver, engine))
}

fn build_puller(config: &Config) -> Result<Puller> {
    let (resolver, engine) = build_resolver(config)?;
    Ok(ImagePuller::new(engine, resolver).with_pipe_capacity(config.pipe_capacity))
}

fn renderer(output: &Output) -> ProgressRenderer<Box<dyn Write>> {
    if output.shows_progress() {
        ProgressRenderer::stderr()
    } else {
        ProgressRenderer::silent()
    }
}
