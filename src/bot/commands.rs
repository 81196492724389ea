use std::time::Instant;

use poise::CreateReply;
use serenity::all::{CreateEmbed, Mentionable};
use tracing::error;

use super::{Command, Context};
use crate::error::Error;

type CommandResult = Result<(), Error>;

/// Cheap unauthenticated endpoint used to time a REST round trip.
const REST_PING_URL: &str = "https://discord.com/api/v10/gateway";

pub fn all() -> Vec<Command> {
    vec![ping(), botinfo(), serverinfo()]
}

/// Show gateway and REST latency
#[poise::command(slash_command, prefix_command)]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    let gateway = ctx.ping().await;

    let rest = match ctx.data().session.client() {
        Some(http) => {
            let started = Instant::now();
            match http.get(REST_PING_URL).send().await {
                Ok(_) => format!("{} ms", started.elapsed().as_millis()),
                Err(why) => {
                    error!("REST ping failed: {:?}", why);
                    "unreachable".to_string()
                }
            }
        }
        None => "session closed".to_string(),
    };

    ctx.say(format!(
        "Pong! Gateway: {} ms, REST: {rest}",
        gateway.as_millis()
    ))
    .await?;

    Ok(())
}

/// Show who the bot is and how many servers it is in
#[poise::command(slash_command, prefix_command)]
pub async fn botinfo(ctx: Context<'_>) -> CommandResult {
    let servers = ctx.cache().guild_count();

    let embed = CreateEmbed::new()
        .title(ctx.data().identity.to_string())
        .field("Servers", servers.to_string(), true)
        .field("Version", env!("CARGO_PKG_VERSION"), true);

    if let Err(why) = ctx.send(CreateReply::default().embed(embed)).await {
        error!("Error sending message: {:?}", why);
    }

    Ok(())
}

/// Show details about this server
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn serverinfo(ctx: Context<'_>) -> CommandResult {
    let summary = ctx
        .guild()
        .map(|guild| (guild.name.clone(), guild.member_count, guild.owner_id));

    let Some((name, members, owner)) = summary else {
        if let Err(why) = ctx.reply("Server details are not cached yet").await {
            error!("Error sending message: {:?}", why);
        }
        return Ok(());
    };

    let embed = CreateEmbed::new()
        .title(name)
        .field("Members", members.to_string(), true)
        .field("Owner", owner.mention().to_string(), true);

    if let Err(why) = ctx
        .send(CreateReply::default().embed(embed).reply(true))
        .await
    {
        error!("Error sending message: {:?}", why);
    }

    Ok(())
}
