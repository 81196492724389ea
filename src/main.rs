mod bot;
mod config;
mod error;
mod health;
mod identity;
mod presence;
mod session;

use std::process::ExitCode;

use bot::Bot;
use config::Settings;
use error::BotError;
use tracing::{debug, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; the real environment may carry everything.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            error!("Bot stopped: {:?}", why);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BotError> {
    let settings = Settings::from_env()?;
    debug!("Loaded {:?}", settings);

    let mut bot = Bot::new(&settings).await?;

    let outcome = tokio::select! {
        result = bot.start() => result,
        _signal_err = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down.");
            Ok(())
        }
    };

    bot.shutdown().await;
    outcome
}
