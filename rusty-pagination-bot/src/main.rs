use std::env;
use std::sync::Arc;

use tracing::{error, info};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::channel::message::component::{Button, ButtonStyle};
use twilight_model::gateway::event::Event;
use twilight_model::gateway::payload::incoming::MessageCreate;
use twilight_model::id::{Id, marker::UserMarker};
use twilight_standby::Standby;
use twilight_util::builder::embed::EmbedBuilder;

use rustls::crypto::ring::default_provider;

use rusty_pagination::{
    ButtonPagination, ControllerAction, DEFAULT_END_TIMER, PageResolvable, PaginationContext,
    PaginationEvent, PaginationTrigger, ReactionOnEnd, ReactionPagination, SendAs, SendOptions,
};

const DEMO_EMBED_COLOR: u32 = 0x90_54_30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let token = env::var("DISCORD_TOKEN")?;

    let http = Arc::new(Client::new(token.clone()));
    let standby = Arc::new(Standby::new());

    let intents = Intents::GUILDS
        | Intents::GUILD_MESSAGES
        | Intents::MESSAGE_CONTENT
        | Intents::GUILD_MESSAGE_REACTIONS;

    let mut shard = Shard::new(ShardId::new(0, 1), token, intents);
    let mut current_user_id: Option<Id<UserMarker>> = None;

    info!("pagination demo connecting...");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        // Collectors never see activity unless standby observes every event.
        standby.process(&event);

        match event {
            Event::Ready(ready) => {
                current_user_id = Some(ready.user.id);
                info!("pagination demo is ready");
            }
            Event::MessageCreate(msg) => {
                if msg.author.bot {
                    continue;
                }

                let context = PaginationContext {
                    http: Arc::clone(&http),
                    standby: Arc::clone(&standby),
                    current_user_id,
                };

                let result = match msg.content.as_str() {
                    "!pages" => run_button_demo(context, &msg).await,
                    "!rpages" => run_reaction_demo(context, &msg).await,
                    _ => Ok(()),
                };

                if let Err(source) = result {
                    error!(?source, "pagination demo command failed");
                }
            }
            _ => {} // Ignore unused events
        }
    }

    Ok(())
}

/// Reply with a button-paginated message and log its lifecycle events.
async fn run_button_demo(context: PaginationContext, msg: &MessageCreate) -> anyhow::Result<()> {
    let session = ButtonPagination::new()
        .pages(demo_pages()?)
        .end_timer(Some(DEFAULT_END_TIMER))
        .add_button(nav_button("demo:first", "First"), ControllerAction::FirstPage)
        .add_button(
            nav_button("demo:previous", "Previous"),
            ControllerAction::PreviousPage,
        )
        .add_button(nav_button("demo:next", "Next"), ControllerAction::NextPage)
        .add_button(nav_button("demo:last", "Last"), ControllerAction::LastPage)
        .add_button(nav_button("demo:stop", "Stop"), ControllerAction::Stop)
        .send(
            context,
            SendOptions::new(PaginationTrigger::message(msg), SendAs::ReplyMessage),
        )
        .await?;

    spawn_event_logger(session.subscribe());

    Ok(())
}

/// Reply with a reaction-paginated message and log its lifecycle events.
async fn run_reaction_demo(context: PaginationContext, msg: &MessageCreate) -> anyhow::Result<()> {
    let session = ReactionPagination::new()
        .pages(demo_pages()?)
        .end_timer(Some(DEFAULT_END_TIMER))
        .add_reaction("⏮".parse()?, ControllerAction::FirstPage)
        .add_reaction("⬅".parse()?, ControllerAction::PreviousPage)
        .add_reaction("➡".parse()?, ControllerAction::NextPage)
        .add_reaction("⏭".parse()?, ControllerAction::LastPage)
        .add_reaction("⏹".parse()?, ControllerAction::Stop)
        .on_end(ReactionOnEnd::ClearPaginationReactions)
        .send(
            context,
            SendOptions::new(PaginationTrigger::message(msg), SendAs::ReplyMessage),
        )
        .await?;

    spawn_event_logger(session.subscribe());

    Ok(())
}

fn spawn_event_logger(
    mut events: tokio::sync::broadcast::Receiver<PaginationEvent>,
) {
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PaginationEvent::Ready => info!("pagination ready"),
                PaginationEvent::PageChange { index, .. } => info!(index, "page changed"),
                PaginationEvent::End(reason) => {
                    info!(reason = %reason, "pagination ended");
                    break;
                }
                PaginationEvent::Error(source) => error!(?source, "pagination error"),
                _ => {}
            }
        }
    });
}

fn demo_pages() -> anyhow::Result<Vec<PageResolvable>> {
    let mut pages = Vec::new();

    for index in 1..=3 {
        let embed = EmbedBuilder::new()
            .title("Pagination Demo")
            .color(DEMO_EMBED_COLOR)
            .description(format!("This is page {index} of 3."))
            .validate()?
            .build();
        pages.push(PageResolvable::from(embed));
    }

    Ok(pages)
}

fn nav_button(custom_id: &str, label: &str) -> Button {
    Button {
        id: None,
        custom_id: Some(custom_id.to_owned()),
        disabled: false,
        emoji: None,
        label: Some(label.to_owned()),
        style: ButtonStyle::Secondary,
        url: None,
        sku_id: None,
    }
}
