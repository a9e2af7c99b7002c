//! Marionette CLI - stream motion frames and steer them with text commands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use marionette::command_parser::NlpParser;
use marionette::config::{ChannelConfig, NormalizationParams, StreamSettings};
use marionette::intents::Intent;
use marionette::osc_transport::OscTransport;
use marionette::repl::StreamSession;
use marionette::router::IntentRouter;
use marionette::scheduler::{FrameScheduler, SchedulerConfig};
use marionette::sequence::{MockProvider, NeutralProvider, RecordedProvider, SequenceProvider};
use marionette::transform::{Denormalizer, TransformTable};

#[derive(Parser)]
#[command(name = "marionette")]
#[command(about = "Natural-language-steerable OSC motion streamer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive streaming session
    Stream {
        /// Channel configuration JSON
        config: PathBuf,

        /// Normalization parameters JSON (pairs with --sequences)
        #[arg(long)]
        norm: Option<PathBuf>,

        /// Recorded movement sequences JSON
        #[arg(long)]
        sequences: Option<PathBuf>,

        /// Use the deterministic mock motion source instead of recordings
        #[arg(long)]
        mock: bool,

        /// Override the target host from the config's meta block
        #[arg(long)]
        host: Option<String>,

        /// Override the target port
        #[arg(long)]
        port: Option<u16>,

        /// Override the frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Turn/baseline ramp duration in seconds
        #[arg(long, default_value = "1.5")]
        duration: f32,

        /// Hold time at full amplitude in seconds
        #[arg(long, default_value = "0.0")]
        hold: f32,
    },

    /// Parse one command, route it, and exit
    Send {
        /// Command text, e.g. "turn left 30 degrees"
        text: String,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,

        /// Print what would be sent without touching the wire
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the OSC address schema
    Schema {},

    /// Validate a channel configuration file
    CheckConfig {
        config: PathBuf,

        /// Also check channel mapping against normalization parameters
        #[arg(long)]
        norm: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stream {
            config,
            norm,
            sequences,
            mock,
            host,
            port,
            fps,
            duration,
            hold,
        } => {
            let channel_config = ChannelConfig::load(&config)?;
            let mut settings = StreamSettings::from_meta(&channel_config.meta);
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(fps) = fps {
                settings.fps = fps;
            }
            settings.turn_duration_s = duration;
            settings.hold_s = hold;
            settings.validate()?;

            // Provider + normalization pairing: recorded sequences use the
            // trained normalization, everything else emits real units
            let (provider, feature_columns): (Box<dyn SequenceProvider>, Vec<String>) =
                match (&norm, &sequences, mock) {
                    (_, _, true) => {
                        let columns = source_columns(&channel_config);
                        (Box::new(MockProvider::new(columns.len())), columns)
                    }
                    (Some(norm_path), Some(seq_path), false) => {
                        let params = NormalizationParams::load(norm_path)?;
                        let provider = RecordedProvider::load(seq_path)?;
                        if provider.features() != params.feature_columns.len() {
                            return Err(format!(
                                "sequences have {} features but normalization covers {}",
                                provider.features(),
                                params.feature_columns.len()
                            )
                            .into());
                        }
                        let columns = params.feature_columns.clone();
                        let denorm = Denormalizer::from_params(&params);
                        let table =
                            TransformTable::new(channel_config.channels.clone(), &columns);
                        return run_session(table, denorm, Box::new(provider), &settings);
                    }
                    _ => {
                        let columns = source_columns(&channel_config);
                        (Box::new(NeutralProvider::new(columns.len())), columns)
                    }
                };

            let denorm = Denormalizer::identity(feature_columns.len());
            let table = TransformTable::new(channel_config.channels, &feature_columns);
            run_session(table, denorm, provider, &settings)
        }

        Commands::Send {
            text,
            host,
            port,
            dry_run,
        } => {
            let transport = OscTransport::new(&host, port)?;
            let mut router = IntentRouter::new(transport);
            if dry_run {
                router.route(&Intent::DryRun);
            }

            let intent = NlpParser::new().parse(&text);
            let (success, message) = router.route(&intent);
            println!("{}", message);
            if !success {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Schema {} => {
            let transport = OscTransport::new("127.0.0.1", 8000)?;
            let router = IntentRouter::new(transport);
            println!("{}", router.get_osc_schema());
            Ok(())
        }

        Commands::CheckConfig { config, norm } => {
            let channel_config = ChannelConfig::load(&config)?;
            println!(
                "ok: {} channels, target {}:{} @ {} fps ({})",
                channel_config.channels.len(),
                channel_config.meta.host,
                channel_config.meta.port,
                channel_config.meta.rate,
                channel_config.meta.units,
            );

            if let Some(norm_path) = norm {
                let params = NormalizationParams::load(&norm_path)?;
                let table = TransformTable::new(
                    channel_config.channels.clone(),
                    &params.feature_columns,
                );
                println!(
                    "mapping: {}/{} channels resolve to features",
                    table.mapped_count(),
                    table.len()
                );
            }
            Ok(())
        }
    }
}

/// Unique channel source columns, in configuration order
fn source_columns(config: &ChannelConfig) -> Vec<String> {
    let mut columns = Vec::new();
    for channel in &config.channels {
        if !columns.contains(&channel.source_column) {
            columns.push(channel.source_column.clone());
        }
    }
    columns
}

fn run_session(
    table: TransformTable,
    denorm: Denormalizer,
    provider: Box<dyn SequenceProvider>,
    settings: &StreamSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let stream_transport = OscTransport::new(&settings.host, settings.port)?;
    let scheduler = FrameScheduler::spawn(
        table,
        denorm,
        provider,
        Box::new(stream_transport),
        SchedulerConfig::from_settings(settings),
    )?;

    // Commands and frames travel on separate sockets toward the same rig
    let command_transport = OscTransport::new(&settings.host, settings.port)?;
    let session = StreamSession::new(IntentRouter::new(command_transport), scheduler);
    session.run()?;
    Ok(())
}
