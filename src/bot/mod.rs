mod commands;
mod extension;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::all as serenity;
use tokio::sync::watch;
use tracing::{error, info, info_span};
use tracing_futures::Instrument;

use crate::config::{COMMAND_PREFIX, PRESENCE_INTERVAL, Settings};
use crate::error::{BotError, Error};
use crate::health::HealthServer;
use crate::identity::BotIdentity;
use crate::presence::PresenceUpdater;
use crate::session::Session;
use extension::Extension;

/// Owns the gateway client and the resources that live as long as it does.
pub struct Bot {
    client: serenity::Client,
    session: Arc<Session>,
    sync_failed: Arc<AtomicBool>,
}

impl Bot {
    /// Opens the HTTP session, loads the command extension and builds the client.
    ///
    /// Commands are synced with Discord on the first ready event, and only
    /// then is the presence updater started.
    pub async fn new(settings: &Settings) -> Result<Self, BotError> {
        let session = Arc::new(Session::open());
        let identity = BotIdentity::new();

        let options = poise::FrameworkOptions {
            commands: load_commands(&extension::INFO_COMMANDS),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(COMMAND_PREFIX.to_string()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        };

        let (ready_tx, ready_rx) = watch::channel(None);

        let sync_failed = Arc::new(AtomicBool::new(false));
        let setup_sync_failed = Arc::clone(&sync_failed);

        let data = UserData {
            session: Arc::clone(&session),
            identity: identity.clone(),
        };
        let framework = poise::Framework::new(options, move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                if let Err(why) = poise::builtins::register_globally(ctx, commands).await {
                    setup_sync_failed.store(true, Ordering::SeqCst);
                    return Err(why.into());
                }
                info!("Synced {} commands", commands.len());

                tokio::spawn(
                    PresenceUpdater::new(ready_rx, PRESENCE_INTERVAL)
                        .run()
                        .instrument(info_span!("presence")),
                );

                Ok(data)
            })
        });

        let intents =
            serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;
        let client = serenity::Client::builder(&settings.token, intents)
            .event_handler(Handler::new(settings, identity, ready_tx))
            .framework(framework)
            .await?;

        Ok(Bot {
            client,
            session,
            sync_failed,
        })
    }

    /// Runs until every shard has stopped.
    ///
    /// A clean stop after the command sync failed still counts as a failure.
    pub async fn start(&mut self) -> Result<(), BotError> {
        let result = self.client.start().await;
        run_outcome(result, self.sync_failed.load(Ordering::SeqCst))
    }

    /// Closes the HTTP session and disconnects every shard. Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.session.close() {
            info!("Closed HTTP session");
        }
        self.client.shard_manager.shutdown_all().await;
    }
}

/// Shared with every command invocation.
pub struct UserData {
    session: Arc<Session>,
    identity: BotIdentity,
}

type Context<'a> = poise::Context<'a, UserData, Error>;
type Command = poise::Command<UserData, Error>;

fn run_outcome(result: Result<(), serenity::Error>, sync_failed: bool) -> Result<(), BotError> {
    result?;
    if sync_failed {
        return Err(BotError::CommandSync);
    }
    Ok(())
}

fn load_commands(extension: &Extension) -> Vec<Command> {
    match extension.load() {
        Ok(commands) => {
            info!(
                "Loaded extension `{}` with {} commands",
                extension.name(),
                commands.len()
            );
            commands
        }
        Err(why) => {
            error!("Failed to load extension `{}`: {:?}", extension.name(), why);
            Vec::new()
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, UserData, Error>) {
    match error {
        poise::FrameworkError::Setup {
            error, framework, ..
        } => {
            error!("Failed to sync commands, shutting down: {:?}", error);
            framework.shard_manager().shutdown_all().await;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(why) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {:?}", why);
            }
        }
    }
}

struct Handler {
    identity: BotIdentity,
    health: Option<HealthServer>,
    ready: watch::Sender<Option<serenity::Context>>,
}

impl Handler {
    fn new(
        settings: &Settings,
        identity: BotIdentity,
        ready: watch::Sender<Option<serenity::Context>>,
    ) -> Self {
        let health = settings
            .hosted
            .then(|| HealthServer::new(identity.clone(), settings.health_addr()));

        Handler {
            identity,
            health,
            ready,
        }
    }

    /// Records who we are and brings up the health check if this is the first ready.
    fn record_ready(&self, name: String, guilds: usize) -> Option<SocketAddr> {
        self.identity.set(name);
        info!("Connected as {}", self.identity);
        info!("Serving {} servers", guilds);

        let health = self.health.as_ref()?;
        match health.launch() {
            Ok(addr) => addr,
            Err(why) => {
                error!(
                    "Failed to start health check on {}: {:?}",
                    health.addr(),
                    why
                );
                None
            }
        }
    }
}

#[serenity::async_trait]
impl serenity::EventHandler for Handler {
    async fn ready(&self, ctx: serenity::Context, ready: serenity::Ready) {
        self.record_ready(ready.user.tag(), ready.guilds.len());
        self.ready.send_replace(Some(ctx));
    }
}
