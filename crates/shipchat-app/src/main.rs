//! Shipchat binary: composition root and interactive loop.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Install the tracing subscriber
//! 3. Build the backend, action registry and analysis tiers
//! 4. Probe the remote tiers once
//! 5. Answer stdin lines until EOF

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use shipchat_action::{ActionDispatcher, ActionRegistry, HttpLogisticsBackend};
use shipchat_chat::{ChatEngine, RealtimeAnalyzer, RemoteHttpAnalyzer, TcpConnector};
use shipchat_core::{ConversationContext, Credential, ShipchatConfig};
use shipchat_nlu::{IntentRegistry, ThreadRandom};

use cli::CliArgs;

fn build_engine(
    args: &CliArgs,
    config: &ShipchatConfig,
) -> Result<ChatEngine, Box<dyn std::error::Error>> {
    let registry = Arc::new(IntentRegistry::standard());

    let backend = HttpLogisticsBackend::new(&config.backend)?;
    let mut actions = ActionRegistry::new();
    actions.register_defaults(Arc::new(backend));
    tracing::info!(handlers = actions.len(), base_url = %config.backend.base_url, "Action handlers registered");

    let context = ConversationContext::new(Credential::new(args.resolve_token()))
        .with_user_name(args.resolve_user_name(&config.general.user_name));

    let mut engine = ChatEngine::new(
        registry,
        ActionDispatcher::new(Arc::new(actions)),
        context,
        Box::new(ThreadRandom),
    )
    .with_dialogue_config(config.dialogue.clone());

    if args.local_only {
        tracing::info!("Remote analysis tiers disabled by --local-only");
        return Ok(engine);
    }

    if config.realtime.enabled {
        let connector = TcpConnector::from_config(&config.realtime);
        engine = engine.with_analyzer(Box::new(RealtimeAnalyzer::new(
            Box::new(connector),
            config.realtime.response_timeout(),
        )));
        tracing::info!(address = %config.realtime.address, "Realtime tier enabled");
    }
    if config.remote.enabled {
        engine = engine.with_analyzer(Box::new(RemoteHttpAnalyzer::from_config(&config.remote)?));
        tracing::info!(base_url = %config.remote.base_url, "Remote HTTP tier enabled");
    }

    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = ShipchatConfig::load_or_default(&config_file);

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting shipchat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let mut engine = build_engine(&args, &config)?;
    if !args.local_only && config.remote.probe_on_start {
        engine.probe_tiers().await;
    }
    for tier in engine.tier_order() {
        tracing::debug!(tier = %tier, health = %engine.tier_health(tier), "Tier available");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/reset" => {
                engine.reset();
                println!("🔄 تم بدء محادثة جديدة.");
            }
            "/quit" | "/exit" => break,
            _ => {
                let reply = engine.process_message(&line).await;
                println!("{}", reply.content);
            }
        }
    }

    tracing::info!(messages = engine.history().len(), "Shipchat stopped");
    Ok(())
}
