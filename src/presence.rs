use std::time::Duration;

use serenity::all::{ActivityData, Cache, Context};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Error;

/// Where presence updates go. Implemented for the gateway context; tests use fakes.
pub trait PresenceSink: Clone + Send + Sync + 'static {
    fn guild_count(&self) -> usize;

    fn set_activity(&self, activity: ActivityData) -> Result<(), Error>;
}

impl PresenceSink for Context {
    fn guild_count(&self) -> usize {
        known_guilds(&self.cache)
    }

    fn set_activity(&self, activity: ActivityData) -> Result<(), Error> {
        Context::set_activity(self, Some(activity));
        Ok(())
    }
}

/// Every guild the bot is in, including ones still waiting for their GuildCreate.
fn known_guilds(cache: &Cache) -> usize {
    cache.guilds().len()
}

pub fn activity_for(guild_count: usize) -> ActivityData {
    ActivityData::watching(format!("{guild_count} servers"))
}

enum State<S> {
    WaitingForReady,
    Running(S),
}

/// Periodically shows the number of servers the bot is in as its activity.
///
/// Nothing is sent until a sink arrives on the ready channel. After that the
/// activity is refreshed every `period` for as long as the process lives.
pub struct PresenceUpdater<S> {
    ready: watch::Receiver<Option<S>>,
    period: Duration,
    state: State<S>,
}

impl<S: PresenceSink> PresenceUpdater<S> {
    pub fn new(ready: watch::Receiver<Option<S>>, period: Duration) -> Self {
        Self {
            ready,
            period,
            state: State::WaitingForReady,
        }
    }

    pub async fn run(mut self) {
        if !self.wait_for_ready().await {
            debug!("Ready channel closed before the bot was ready, not updating presence");
            return;
        }
        info!("Updating presence every {:?}", self.period);

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.pick_up_reconnect();

            if let Err(why) = self.update() {
                warn!("Status update failed: {:?}", why);
            }
        }
    }

    async fn wait_for_ready(&mut self) -> bool {
        let sink = self
            .ready
            .wait_for(Option::is_some)
            .await
            .map(|sink| sink.clone());

        match sink {
            Ok(Some(sink)) => {
                self.state = State::Running(sink);
                true
            }
            _ => false,
        }
    }

    /// Switches to the newest context if the gateway has signalled ready again.
    fn pick_up_reconnect(&mut self) {
        if !self.ready.has_changed().unwrap_or(false) {
            return;
        }
        if let Some(sink) = self.ready.borrow_and_update().clone() {
            self.state = State::Running(sink);
        }
    }

    fn update(&self) -> Result<(), Error> {
        let State::Running(sink) = &self.state else {
            return Ok(());
        };

        let activity = activity_for(sink.guild_count());
        debug!("Setting activity to {:?}", activity.name);
        sink.set_activity(activity)
    }
}
