mod console;

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use reel_pipeline::config::DEFAULT_ENDPOINT;
use reel_pipeline::{Pipeline, PipelineConfig, ReelClient, RunOutcome};
use tracing_subscriber::{prelude::*, EnvFilter};

use console::ConsoleReporter;

/// Generate a narrated, illustrated video from a story using a remote
/// generation server.
#[derive(Parser, Debug)]
#[command(name = "reel-pipeline", version, about)]
struct Cli {
    /// Base URL of the generation server.
    #[arg(long, env = "REEL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Seconds between status checks.
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    /// Status checks per stage before giving up.
    #[arg(long, default_value_t = 60)]
    max_attempts: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Narrator voice.
    #[arg(long, default_value = "af_bella")]
    voice: String,

    /// Narration speed multiplier.
    #[arg(long, default_value_t = 0.85)]
    speed: f64,

    /// Visual style for generated images.
    #[arg(long, default_value = "Cinematic")]
    style: String,

    /// Video bitrate.
    #[arg(long, default_value = "4000k")]
    quality: String,

    /// Skip the film dust overlay.
    #[arg(long)]
    no_dust_overlay: bool,

    /// Print the final artifacts as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> Result<PipelineConfig> {
        let config = PipelineConfig::builder()
            .with_endpoint(self.endpoint.clone())
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_attempts(self.max_attempts)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_voice(self.voice.clone())
            .with_speed(self.speed)
            .with_image_style(self.style.clone())
            .with_video_quality(self.quality.clone())
            .with_dust_overlay(!self.no_dust_overlay)
            .build()?;
        Ok(config)
    }
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing()?;

    let config = cli.config()?;
    let client = ReelClient::from_config(&config);
    let reporter = ConsoleReporter::new(&config.endpoint);
    let pipeline = Pipeline::new(client, reporter, config)?;

    match pipeline.generate().await {
        RunOutcome::Completed(artifacts) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&artifacts)?);
            }
            Ok(())
        }
        RunOutcome::Failed(e) => Err(e.into()),
        RunOutcome::Rejected => bail!("a generation run is already in progress"),
    }
}
