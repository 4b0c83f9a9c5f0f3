use anyhow::{Context, Result};
use clap::Parser;
use converse_client::media::{
    negotiate, select_format, CaptureConfig, EncodingFormat, NativeFormatProbe,
};
use converse_client::{
    Config, ConversationClient, NativeMediaHost, RecorderFactory, RecorderSession, RodioSink,
    SpeechStatus, TurnClient,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Voice conversation client")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/converse-client")]
    config: String,

    /// Override the backend base URL from the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Override the anti-forgery token from the config file
    #[arg(long)]
    csrf_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.base_url {
        cfg.server.base_url = url;
    }
    if let Some(token) = args.csrf_token {
        cfg.server.csrf_token = token;
    }

    info!("converse-client v{}", env!("CARGO_PKG_VERSION"));

    let host = NativeMediaHost::new(CaptureConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
    });
    let (caps, stream) = negotiate(&host)
        .await
        .context("media capability negotiation failed")?;

    let format = select_format(&NativeFormatProbe, &EncodingFormat::DEFAULT_CANDIDATES);
    let mut session = RecorderSession::new();
    let recording_enabled = match format {
        Some(format) => {
            let recorder = RecorderFactory::create(
                format,
                stream.clone(),
                Duration::from_millis(cfg.audio.chunk_interval_ms),
            )?;
            session.ready(recorder);
            true
        }
        None => {
            eprintln!("No supported recording format on this host; recording is disabled.");
            false
        }
    };

    let backend = TurnClient::new(
        &cfg.server.base_url,
        cfg.server.csrf_token.clone(),
        cfg.server.request_timeout(),
    )?;
    let speech = RodioSink::new()?;

    let mut client = ConversationClient::new(
        caps,
        session,
        Box::new(backend),
        Box::new(speech),
        stream.video(),
        cfg.snapshot.clone(),
    );

    if !caps.has_video_input {
        println!("No camera detected; image attachment is unavailable.");
    }
    println!("Commands: start | stop | attach on|off | reset | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "start" if !recording_enabled => {
                println!("Recording is disabled: no supported format.");
            }
            "start" => match client.start_recording().await {
                Ok(()) => println!("Recording..."),
                Err(e) => println!("{e}"),
            },
            "stop" => {
                println!("Processing...");
                match client.finish_turn().await {
                    Ok(summary) => {
                        println!("You: {}", summary.transcription);
                        println!("Assistant: {}", summary.answer);
                        if summary.speech == SpeechStatus::Unavailable {
                            println!("(response speech unavailable)");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            "attach on" => {
                if client.set_attach_snapshot(true) {
                    println!("Snapshots will be attached to each turn.");
                } else {
                    println!("No camera available; cannot attach snapshots.");
                }
            }
            "attach off" => {
                client.set_attach_snapshot(false);
                println!("Snapshots will not be attached.");
            }
            "reset" => {
                println!("Clear the whole conversation? Type 'y' to confirm.");
                let confirmed = matches!(
                    lines.next_line().await?.as_deref().map(str::trim),
                    Some("y") | Some("Y")
                );
                match client.reset(confirmed).await {
                    Ok(true) => println!("Conversation cleared."),
                    Ok(false) => println!("Reset cancelled."),
                    Err(e) => println!("{e}"),
                }
            }
            "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown command: {other}"),
        }
    }

    Ok(())
}
