use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jukebox::commands::music::{
    clear::*, join::*, leave::*, pause::*, play::*, queue::*, remove::*, shuffle::*, skip::*,
    ui::*,
};
use jukebox::commands::music::audio_sources::youtube::YoutubeApi;
use jukebox::commands::music::utils::embedded_messages;
use jukebox::commands::music::utils::music_manager::{MusicError, MusicManager};
use jukebox::config::Config;
use jukebox::{CommandResult, Context, Data, Error, events};

#[poise::command(slash_command, prefix_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

/// Renders user-facing errors as an embed, everything else the poise way.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    if let poise::FrameworkError::Command { error, ctx, .. } = &error {
        if let Some(music_error) = error.downcast_ref::<MusicError>() {
            info!("Command {} failed: {}", ctx.command().name, music_error);
            if let Err(e) = ctx.send(embedded_messages::error(music_error)).await {
                error!("Failed to send error message: {}", e);
            }
            return;
        }
    }

    if let Err(e) = poise::builtins::on_error(error).await {
        error!("Error while handling error: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jukebox=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Music commands
        join(),
        play(),
        play_file(),
        shuffle(),
        pause(),
        resume(),
        skip(),
        remove(),
        clear(),
        queue(),
        leave(),
        ui(),
    ];

    let setup_config = Arc::clone(&config);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match setup_config.dev_guild_id {
                    Some(guild_id) => {
                        info!("Registering commands in guild {}", guild_id);
                        poise::builtins::register_in_guild(ctx, commands, guild_id).await?;
                    }
                    None => poise::builtins::register_globally(ctx, commands).await?,
                }

                // Lives for the whole process; songbird wants a static program name.
                let ytdlp_program: &'static str =
                    Box::leak(setup_config.ytdlp_path.clone().into_boxed_str());

                Ok(Data {
                    resolver: Arc::new(YoutubeApi::new(setup_config.ytdlp_path.clone())),
                    music: Arc::new(MusicManager::new()),
                    http_client: reqwest::Client::new(),
                    ytdlp_program,
                    config: setup_config,
                })
            })
        });

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    client.start().await.map_err(Into::into)
}
