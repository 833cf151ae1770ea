//! remora - Discord reminder bot
//!
//! Thin wiring layer: loads config, initializes logging, builds the
//! organizer with the Discord notifier, and runs the gateway client. The
//! scan loop is started from the `ready` event so a gateway reconnect
//! cannot start a second loop (start is idempotent anyway).

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use clap::Parser;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::http::Http;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use remora_channels::discord::{DiscordNotifier, IncomingReply, ReplyRouter};
use remora_core::OrganizerConfig;
use remora_scheduler::{ReminderOrganizer, ReminderStore};

use config::BotConfig;

#[derive(Parser)]
#[command(name = "remora", about = "Discord reminder bot", version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "remora.toml")]
    config: PathBuf,
}

struct Handler {
    organizer: Arc<ReminderOrganizer>,
    router: ReplyRouter,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("connected as {}", ready.user.name);
        self.organizer.start();
    }

    async fn message(&self, _ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        // Feed confirmation waits; command dispatch lives in the framework
        // layer and is not routed through here.
        self.router.route(IncomingReply {
            author_id: message.author.id.get(),
            channel_id: message.channel_id.get(),
            content: message.content,
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let bot_config = BotConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&bot_config.log_filter)),
        )
        .init();

    let mut organizer_config = OrganizerConfig::default();
    if let Some(data_dir) = bot_config.data_dir.clone() {
        organizer_config.data_dir = data_dir;
    }

    let store = ReminderStore::load(
        organizer_config.data_dir.clone(),
        organizer_config.max_reminders,
    )
    .context("failed to load reminder store")?;
    info!(dir = %organizer_config.data_dir.display(), "reminder store loaded");

    let http = Arc::new(Http::new(&bot_config.discord_token));
    let notifier = Arc::new(DiscordNotifier::new(http));
    let router = ReplyRouter::new();
    let organizer = Arc::new(ReminderOrganizer::new(
        organizer_config,
        store,
        notifier,
        Arc::new(router.clone()),
    ));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&bot_config.discord_token, intents)
        .event_handler(Handler { organizer, router })
        .await
        .context("failed to build Discord client")?;

    if let Err(err) = client.start().await {
        error!("client error: {err}");
        return Err(err.into());
    }
    Ok(())
}
