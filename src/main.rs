use akira::api::ImagesResponse;
use akira::cancel::CancelToken;
use akira::config::{self, AkiraConfig};
use akira::dispatch::Dispatcher;
use akira::imaging::{OutputFormat, Quality, RustEngine};
use akira::{output, server, sizes};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that run the worker pool.
#[derive(clap::Args, Clone)]
struct PoolArgs {
    /// Number of resize jobs that may run at once (overrides processing.pool_size)
    #[arg(long)]
    pool_size: Option<usize>,
}

#[derive(Parser)]
#[command(name = "akira")]
#[command(about = "Multi-size image resizing service")]
#[command(long_about = "\
Multi-size image resizing service

POST an image and a size list to /resize and get back one base64 data URI
per requested size:

  curl -F image=@photo.jpg -F 'size=64x64;128x128;;512x512' -F quality=80 \\
       http://localhost:8000/resize

  {\"images\": [{\"size\": \"64x64\", \"base64\": \"data:image/jpeg;base64,...\"}, ...],
   \"error\": false}

Sizes are WIDTHxHEIGHT, separated by ';'. Empty entries are ignored. Quality
is 0-100 and defaults to 100.

Run 'akira gen-config' to generate a documented akira.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Interface to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Resize a local image once and report the result
    Resize {
        /// Image file to resize
        image: PathBuf,
        /// Size list, e.g. "64x64;128x128"
        #[arg(long)]
        size: String,
        /// Encoding quality, 0-100 (overrides resize.default_quality)
        #[arg(long)]
        quality: Option<String>,
        /// Output container: jpeg or avif (overrides processing.output_format)
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Print the HTTP response body instead of a report
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Print a stock akira.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve { host, port, pool } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            apply_pool_args(&mut config, &pool)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::serve(config))?;
        }
        Command::Resize {
            image,
            size,
            quality,
            format,
            json,
            pool,
        } => {
            let mut config = config::load_config(cli.config.as_deref())?;
            if let Some(format) = format {
                config.processing.output_format = format;
            }
            apply_pool_args(&mut config, &pool)?;
            let quality = match quality {
                Some(raw) => Quality::parse(&raw)?,
                None => config.resize.default_quality,
            };

            let raw: Arc<[u8]> = Arc::from(std::fs::read(&image)?);
            let tokens = sizes::split_size_list(&size);
            let dispatcher = Dispatcher::new(RustEngine::new(), config.dispatch_config())?;
            info!(image = %image.display(), sizes = %size, %quality, "resizing");
            let results = dispatcher.resize_all(raw, tokens.clone(), quality, &CancelToken::new());

            if json {
                let body = ImagesResponse::from_results(results, config.resize.report_failures);
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                output::print_resize_report(&image.display().to_string(), &tokens, quality, &results);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_pool_args(config: &mut AkiraConfig, pool: &PoolArgs) -> Result<(), config::ConfigError> {
    if let Some(pool_size) = pool.pool_size {
        config.processing.pool_size = pool_size;
    }
    config.validate()
}
