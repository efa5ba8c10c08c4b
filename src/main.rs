use album_resizer::config::{self, DEFAULT_CONFIG_FILE, PipelineConfig};
use album_resizer::imaging::RustBackend;
use album_resizer::listener::{Listener, ListenerError};
use album_resizer::notification::S3Event;
use album_resizer::pipeline::Pipeline;
use album_resizer::report;
use album_resizer::storage::S3Store;
use album_resizer::storage::s3::load_sdk_config;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "album-resizer")]
#[command(about = "Generate resized derivatives for photo albums in S3")]
#[command(long_about = "\
Generate resized derivatives for photo albums in S3

Originals are uploaded under {album}/full/{file}. For every configured size,
a JPEG bounded on its longer edge is written to {album}/{size}/{file}.
Deleting an original deletes its derivatives. Any other key is left alone.

  photos/
  ├── vacation/full/sunset.jpg     # original (triggers processing)
  ├── vacation/thumb/sunset.jpg    # derivative, longer edge 256
  └── vacation/small/sunset.jpg    # derivative, longer edge 512

Uploaded images anywhere in the bucket also have their EXIF tags logged.

Run 'album-resizer gen-config' to generate a documented album-resizer.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults are used if it does not exist)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one S3 event document
    Handle {
        /// Event JSON file, or '-' for stdin
        #[arg(long, default_value = "-")]
        event: String,
    },
    /// Long-poll an SQS queue of S3 notifications until Ctrl-C
    Listen {
        /// Overrides listener.queue_url
        #[arg(long)]
        queue_url: Option<String>,
    },
    /// Print a stock album-resizer.toml with all options documented
    GenConfig,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("album_resizer=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_event(source: &str) -> Result<String, std::io::Error> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source)
    }
}

async fn build_pipeline(
    config: &PipelineConfig,
) -> Result<(Pipeline<S3Store, RustBackend>, aws_config::SdkConfig), Box<dyn std::error::Error>> {
    let sdk = load_sdk_config(&config.storage).await;
    let store = Arc::new(S3Store::from_sdk_config(&sdk, &config.storage));
    let pipeline = Pipeline::from_config(store, Arc::new(RustBackend::new()), config)?;
    Ok((pipeline, sdk))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Handle { event } => {
            let config = config::load_config(&cli.config)?;
            let (pipeline, _) = build_pipeline(&config).await?;
            let event = S3Event::from_json(&read_event(&event)?)?;
            match pipeline.handle_event(event).await {
                Ok(outcomes) => report::print_outcomes(&outcomes),
                Err(e) => {
                    if !e.completed().is_empty() {
                        report::print_outcomes(e.completed());
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Listen { queue_url } => {
            let config = config::load_config(&cli.config)?;
            let queue_url = queue_url
                .or_else(|| config.listener.queue_url.clone())
                .ok_or(ListenerError::MissingQueueUrl)?;
            let (pipeline, sdk) = build_pipeline(&config).await?;
            let listener = Listener::new(
                aws_sdk_sqs::Client::new(&sdk),
                queue_url,
                &config.listener,
            );
            listener.run(&pipeline, shutdown_signal()).await?;
        }
    }

    Ok(())
}
