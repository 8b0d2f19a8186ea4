//! ziotc-bridge - Zebra IoT Connector to raddec bridge
//!
//! Listens to a reader's tag data interface over MQTT and/or WebSocket
//! (or a synthetic generator), normalizes every tag data event into a
//! radio-decoding record, and hands the records to a console or JSONL
//! sink.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use ziotc_core::{Bridge, DecodingOptions, Raddec, RaddecSink};
use ziotc_decode::ZiotcDecoder;
use ziotc_export::{ConsoleSink, JsonlSink, JsonlSinkConfig};
use ziotc_listen::{
    MqttListener, MqttListenerConfig, TestListener, TestListenerConfig, WsListener,
    WsListenerConfig,
};

#[derive(Parser)]
#[command(name = "ziotc-bridge")]
#[command(version)]
#[command(about = "Zebra IoT Connector tag-event to raddec bridge", long_about = None)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bridge a live reader's tag data interface
    Run {
        /// MQTT broker URL (mqtt://host[:port])
        #[arg(long, env = "ZIOTC_MQTT_URL")]
        mqtt_url: Option<String>,

        /// MQTT topic filter for tag data events
        #[arg(long, default_value = "ziotc/#")]
        topic: String,

        /// MQTT client identifier
        #[arg(long, default_value = "ziotc-bridge")]
        client_id: String,

        /// WebSocket address of the reader's tag data interface
        #[arg(long, env = "ZIOTC_WS_URL")]
        ws_url: Option<String>,

        /// Output file for JSONL records (console when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty print records
        #[arg(long)]
        pretty: bool,
    },

    /// Run the synthetic generator through the full pipeline
    Simulate {
        /// Event generation interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval: u64,

        /// Number of events to generate (0 = infinite)
        #[arg(long, default_value = "0")]
        count: u64,

        /// Output file for JSONL records (console when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty print records
        #[arg(long)]
        pretty: bool,
    },

    /// Show records from a JSONL file
    Show {
        /// Input file (JSONL)
        #[arg(short, long)]
        input: PathBuf,

        /// Filter by transmitter identifier
        #[arg(short, long)]
        transmitter: Option<String>,

        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        num: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            mqtt_url,
            topic,
            client_id,
            ws_url,
            output,
            pretty,
        } => {
            run_command(RunConfig {
                mqtt_url,
                topic,
                client_id,
                ws_url,
                output,
                pretty,
            })
            .await
        }
        Commands::Simulate {
            interval,
            count,
            output,
            pretty,
        } => {
            simulate_command(SimulateConfig {
                interval_ms: interval,
                event_count: count,
                output,
                pretty,
            })
            .await
        }
        Commands::Show {
            input,
            transmitter,
            num,
        } => show_command(&input, transmitter, num).await,
    }
}

/// Sink plus the concrete JSONL handle, kept for the shutdown flush
struct SinkHandles {
    sink: Arc<dyn RaddecSink>,
    jsonl: Option<Arc<JsonlSink>>,
}

fn build_sink(output: Option<PathBuf>, pretty: bool) -> anyhow::Result<SinkHandles> {
    match output {
        Some(path) => {
            let jsonl = Arc::new(JsonlSink::open(JsonlSinkConfig {
                path,
                append: true,
                pretty,
                flush_each: true,
            })?);
            Ok(SinkHandles {
                sink: jsonl.clone(),
                jsonl: Some(jsonl),
            })
        }
        None => Ok(SinkHandles {
            sink: Arc::new(ConsoleSink::new(pretty)),
            jsonl: None,
        }),
    }
}

struct RunConfig {
    mqtt_url: Option<String>,
    topic: String,
    client_id: String,
    ws_url: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
}

async fn run_command(config: RunConfig) -> anyhow::Result<()> {
    if config.mqtt_url.is_none() && config.ws_url.is_none() {
        anyhow::bail!("no transport selected: pass --mqtt-url and/or --ws-url");
    }

    let handles = build_sink(config.output, config.pretty)?;
    let decoder = Arc::new(ZiotcDecoder::new(handles.sink.clone()));

    let mut bridge = Bridge::new();

    if let Some(url) = config.mqtt_url {
        bridge.add_listener(Box::new(MqttListener::new(
            MqttListenerConfig {
                url,
                topic: config.topic,
                client_id: config.client_id,
                decoding_options: DecodingOptions::default(),
            },
            decoder.clone(),
        )));
    }

    if let Some(address) = config.ws_url {
        bridge.add_listener(Box::new(WsListener::new(
            WsListenerConfig {
                address,
                decoding_options: DecodingOptions::default(),
            },
            decoder.clone(),
        )));
    }

    info!(transports = bridge.len(), "Starting listeners");
    bridge.start_all().await?;

    println!();
    println!("  ziotc-bridge v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    tokio::signal::ctrl_c().await?;

    bridge.stop_all().await;
    log_final_stats(&bridge, &decoder);

    if let Some(jsonl) = &handles.jsonl {
        jsonl.flush()?;
        info!(records = jsonl.records_written(), "JSONL sink flushed");
    }

    Ok(())
}

struct SimulateConfig {
    interval_ms: u64,
    event_count: u64,
    output: Option<PathBuf>,
    pretty: bool,
}

/// Simulate mode - runs the synthetic generator through the pipeline
async fn simulate_command(config: SimulateConfig) -> anyhow::Result<()> {
    println!();
    println!("  ziotc-bridge v{} - SIMULATE", env!("CARGO_PKG_VERSION"));
    println!();
    println!("  Generating tag data events every {}ms", config.interval_ms);
    if config.event_count > 0 {
        println!("  Will generate {} events total", config.event_count);
    } else {
        println!("  Generating events indefinitely");
    }
    if let Some(path) = &config.output {
        println!("  Output: {}", path.display());
    }
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let handles = build_sink(config.output, config.pretty)?;
    let decoder = Arc::new(ZiotcDecoder::new(handles.sink.clone()));

    let mut bridge = Bridge::new();
    bridge.add_listener(Box::new(TestListener::new(
        TestListenerConfig {
            period_ms: config.interval_ms,
            event_count: config.event_count,
            decoding_options: DecodingOptions::default(),
        },
        decoder.clone(),
    )));

    bridge.start_all().await?;

    if config.event_count > 0 {
        // Bounded run: stop when the generator exhausts its budget,
        // or earlier on Ctrl+C
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = wait_until_stopped(&bridge) => {}
        }
    } else {
        tokio::signal::ctrl_c().await?;
    }

    bridge.stop_all().await;
    log_final_stats(&bridge, &decoder);

    if let Some(jsonl) = &handles.jsonl {
        jsonl.flush()?;
        info!(records = jsonl.records_written(), "JSONL sink flushed");
    }

    Ok(())
}

async fn wait_until_stopped(bridge: &Bridge) {
    while bridge.any_running() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn show_command(
    input: &PathBuf,
    transmitter: Option<String>,
    num: usize,
) -> anyhow::Result<()> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(input)?;
    let reader = BufReader::new(file);

    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        let raddec: Raddec = serde_json::from_str(&line)?;

        // Filter by transmitter identifier if specified
        if let Some(ref filter) = transmitter {
            if !raddec.transmitter_id.contains(&filter.to_lowercase()) {
                continue;
            }
        }

        println!("{}", serde_json::to_string_pretty(&raddec)?);

        count += 1;
        if count >= num {
            break;
        }
    }

    Ok(())
}

fn log_final_stats(bridge: &Bridge, decoder: &ZiotcDecoder) {
    let listener_stats = bridge.stats();
    info!(
        payloads = listener_stats.payloads_forwarded,
        bytes = listener_stats.bytes_forwarded,
        transport_errors = listener_stats.transport_errors,
        "Listener totals"
    );

    let decoder_stats = decoder.stats();
    info!(
        payloads = decoder_stats.payloads_ingested,
        fragments = decoder_stats.fragments_seen,
        dropped = decoder_stats.fragments_dropped,
        without_id = decoder_stats.events_without_id,
        records = decoder_stats.records_emitted,
        "Decoder totals"
    );
}
