//! Reaction-driven pagination sessions.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use twilight_model::channel::message::Component;
use twilight_model::gateway::GatewayReaction;
use twilight_model::gateway::event::Event;
use twilight_model::gateway::payload::incoming::ReactionAdd;
use twilight_model::id::{Id, marker::UserMarker};
use twilight_standby::future::{WaitForEventStream, WaitForReactionStream};

use crate::base::{BasePagination, BasePaginationOptions};
use crate::context::PaginationContext;
use crate::controller::{
    ActionRowGroup, CollectorOptions, ControllerAction, ReactionController, passes_author_filter,
};
use crate::emoji::ReactionEmoji;
use crate::error::{PaginationError, PaginationResult};
use crate::events::{CollectedEvent, EndReason, PaginationEvent};
use crate::page::{PageData, PageResolvable};
use crate::send::{PaginationTrigger, SendOptions, SentPagination};

/// What happens to the live message when a reaction session ends.
///
/// Reactions cannot be visually disabled, so there is no disable policy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReactionOnEnd {
    /// Leave the message as-is.
    #[default]
    Ignore,
    /// Clear every reaction on the message.
    ClearAllReactions,
    /// Clear only the configured controller reactions.
    ClearPaginationReactions,
    /// Delete the live message.
    DeletePagination,
}

impl FromStr for ReactionOnEnd {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "clear-all-reactions" => Ok(Self::ClearAllReactions),
            "clear-pagination-reactions" => Ok(Self::ClearPaginationReactions),
            "delete-pagination" => Ok(Self::DeletePagination),
            _ => Err(PaginationError::InvalidConfigValue(s.to_owned())),
        }
    }
}

/// Full configuration of a reaction pagination, exportable for recreation.
#[derive(Clone, Debug)]
pub struct ReactionPaginationOptions {
    pub base: BasePaginationOptions,
    pub reactions: Vec<ReactionController>,
    pub on_end: ReactionOnEnd,
    /// Remove a user's reaction right after it is processed so the same
    /// emoji can be reused for repeated navigation.
    pub remove_reaction_on_react: bool,
}

impl Default for ReactionPaginationOptions {
    fn default() -> Self {
        Self {
            base: BasePaginationOptions {
                components_order: ActionRowGroup::reaction_order(),
                ..BasePaginationOptions::default()
            },
            reactions: Vec::new(),
            on_end: ReactionOnEnd::default(),
            remove_reaction_on_react: true,
        }
    }
}

/// Unsent reaction pagination builder.
pub struct ReactionPagination {
    base: BasePagination,
    reactions: Vec<ReactionController>,
    on_end: ReactionOnEnd,
    remove_reaction_on_react: bool,
}

impl ReactionPagination {
    pub fn new() -> Self {
        Self::from_options(ReactionPaginationOptions::default())
    }

    /// Recreate a builder from exported options.
    pub fn from_options(options: ReactionPaginationOptions) -> Self {
        Self {
            base: BasePagination::new(options.base),
            reactions: options.reactions,
            on_end: options.on_end,
            remove_reaction_on_react: options.remove_reaction_on_react,
        }
    }

    /// Export the full configuration as a plain options value.
    pub fn to_options(&self) -> ReactionPaginationOptions {
        ReactionPaginationOptions {
            base: self.base.to_options(),
            reactions: self.reactions.clone(),
            on_end: self.on_end,
            remove_reaction_on_react: self.remove_reaction_on_react,
        }
    }

    /// Replace the page list.
    pub fn pages(mut self, pages: impl IntoIterator<Item = PageResolvable>) -> Self {
        self.base.pages = crate::page::resolve_static_pages(pages);
        self
    }

    /// Append a page.
    pub fn add_page(mut self, page: impl Into<PageResolvable>) -> Self {
        self.base
            .pages
            .extend(crate::page::resolve_static_pages([page.into()]));
        self
    }

    /// Restrict controls to a specific user.
    pub fn author_id(mut self, author_id: Id<UserMarker>) -> Self {
        self.base.author_id = Some(author_id);
        self
    }

    pub fn author_dependent(mut self, author_dependent: bool) -> Self {
        self.base.author_dependent = author_dependent;
        self
    }

    /// Inactivity timeout; `None` keeps the session open until stopped.
    pub fn end_timer(mut self, end_timer: Option<Duration>) -> Self {
        self.base.end_timer = end_timer;
        self
    }

    pub fn single_page_no_controllers(mut self, suppress: bool) -> Self {
        self.base.single_page_no_controllers = suppress;
        self
    }

    pub fn additional_action_rows(mut self, rows: Vec<Component>) -> Self {
        self.base.additional_action_rows = rows;
        self
    }

    pub fn components_order(mut self, order: Vec<ActionRowGroup>) -> Self {
        self.base.components_order = order;
        self
    }

    pub fn collector_options(mut self, options: CollectorOptions) -> Self {
        self.base.collector_options = options;
        self
    }

    /// Bind an emoji to a navigation action.
    pub fn add_reaction(mut self, emoji: ReactionEmoji, action: ControllerAction) -> Self {
        self.reactions.push(ReactionController { emoji, action });
        self
    }

    /// Replace the configured reaction controllers.
    pub fn reactions(mut self, reactions: Vec<ReactionController>) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn on_end(mut self, on_end: ReactionOnEnd) -> Self {
        self.on_end = on_end;
        self
    }

    pub fn remove_reaction_on_react(mut self, remove: bool) -> Self {
        self.remove_reaction_on_react = remove;
        self
    }

    /// Subscribe to session events before sending.
    pub fn subscribe(&self) -> broadcast::Receiver<PaginationEvent> {
        self.base.subscribe()
    }

    /// Resolve and assemble the page at `index`.
    pub async fn get_page(&self, index: usize) -> PaginationResult<Option<PageData>> {
        self.base.get_page(index).await
    }

    pub fn current_page_index(&self) -> usize {
        self.base.current_page_index()
    }

    /// Transmit the initial page, attach the controller reactions and the
    /// reaction collector, and hand the running session back.
    ///
    /// Fails when the pagination has no pages, was already sent, or the
    /// initial page would be ephemeral without follow-up delivery: reactions
    /// cannot attach to a private response.
    pub async fn send(
        mut self,
        context: PaginationContext,
        options: SendOptions,
    ) -> PaginationResult<ReactionPaginationSession> {
        self.base.ensure_sendable()?;

        self.base.context = Some(context.clone());
        self.base.command = Some(options.command);

        let index = self.base.current_page_index();
        let page = self
            .base
            .get_page(index)
            .await?
            .ok_or(PaginationError::PageOutOfRange(index))?;

        let interaction_trigger =
            matches!(self.base.command, Some(PaginationTrigger::Interaction(_)));
        if interaction_trigger && options.follow_up.is_none() && page.ephemeral {
            return Err(PaginationError::EphemeralReactions);
        }

        self.base
            .send_initial_page(&page, options.send_as, options.follow_up)
            .await?;
        self.react(&context).await?;

        let message = self
            .base
            .sent_pagination()
            .ok_or(PaginationError::NotSent)?;
        let message_id = message.message_id;
        let additions = context
            .standby
            .wait_for_reaction_stream(message_id, |_: &ReactionAdd| true);
        let removals = context.standby.wait_for_event_stream(move |event: &Event| {
            matches!(event, Event::ReactionRemove(removal) if removal.message_id == message_id)
        });

        self.base.emit(PaginationEvent::Ready);

        let events = self.base.events.clone();
        let config = ReactionCollectorConfig {
            context,
            events: events.clone(),
            reactions: self.reactions,
            on_end: self.on_end,
            remove_reaction_on_react: self.remove_reaction_on_react,
            author_dependent: self.base.author_dependent,
            author_id: self.base.author_id(),
            end_timer: self.base.end_timer,
            max_events: self.base.collector_options.max_events,
            message,
        };

        let inner = Arc::new(tokio::sync::Mutex::new(self.base));
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_collector(
            Arc::clone(&inner),
            config,
            additions,
            removals,
            stop_rx,
        ));

        Ok(ReactionPaginationSession {
            inner,
            events,
            stop: stop_tx,
            task,
        })
    }

    /// Attach the configured controller reactions to the live message.
    ///
    /// Skipped entirely for single-page sessions with suppression enabled.
    async fn react(&self, context: &PaginationContext) -> PaginationResult<()> {
        let Some(sent) = self.base.sent_pagination() else {
            return Err(PaginationError::NotSent);
        };

        if self.base.page_count() <= 1 && self.base.single_page_no_controllers {
            return Ok(());
        }

        for controller in &self.reactions {
            context
                .http
                .create_reaction(sent.channel_id, sent.message_id, &controller.emoji.request())
                .await?;
        }

        Ok(())
    }
}

impl Default for ReactionPagination {
    fn default() -> Self {
        Self::new()
    }
}

/// Running reaction pagination session.
///
/// Dropping the handle does not end the session; use [`Self::stop`] or let
/// the configured end conditions fire.
#[derive(Debug)]
pub struct ReactionPaginationSession {
    inner: Arc<tokio::sync::Mutex<BasePagination>>,
    events: broadcast::Sender<PaginationEvent>,
    stop: mpsc::Sender<EndReason>,
    task: JoinHandle<()>,
}

impl ReactionPaginationSession {
    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<PaginationEvent> {
        self.events.subscribe()
    }

    pub async fn current_page_index(&self) -> usize {
        self.inner.lock().await.current_page_index()
    }

    /// Reference to the live message.
    pub async fn sent_pagination(&self) -> Option<SentPagination> {
        self.inner.lock().await.sent_pagination()
    }

    /// Resolve and assemble the page at `index`.
    pub async fn get_page(&self, index: usize) -> PaginationResult<Option<PageData>> {
        self.inner.lock().await.get_page(index).await
    }

    /// Move the cursor and edit the live message.
    pub async fn set_current_page_index(
        &self,
        index: Option<usize>,
        components_only: bool,
    ) -> PaginationResult<PageData> {
        self.inner
            .lock()
            .await
            .set_current_page_index(index, components_only)
            .await
    }

    /// End the session, applying the configured end policy.
    pub async fn stop(&self) {
        let _ = self.stop.send(EndReason::Stopped).await;
    }

    /// Wait for the collector task to finish.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Build and send a reaction pagination in one call.
pub async fn send_reaction_pagination(
    context: PaginationContext,
    options: ReactionPaginationOptions,
    send: SendOptions,
) -> PaginationResult<ReactionPaginationSession> {
    ReactionPagination::from_options(options).send(context, send).await
}

struct ReactionCollectorConfig {
    context: PaginationContext,
    events: broadcast::Sender<PaginationEvent>,
    reactions: Vec<ReactionController>,
    on_end: ReactionOnEnd,
    remove_reaction_on_react: bool,
    author_dependent: bool,
    author_id: Option<Id<UserMarker>>,
    end_timer: Option<Duration>,
    max_events: Option<usize>,
    message: SentPagination,
}

fn match_controller<'a>(
    reactions: &'a [ReactionController],
    reaction: &GatewayReaction,
) -> Option<&'a ReactionController> {
    reactions
        .iter()
        .find(|controller| controller.emoji.matches(&reaction.emoji))
}

async fn run_collector(
    inner: Arc<tokio::sync::Mutex<BasePagination>>,
    config: ReactionCollectorConfig,
    mut additions: WaitForReactionStream,
    mut removals: WaitForEventStream,
    mut stop_rx: mpsc::Receiver<EndReason>,
) {
    let message_id = config.message.message_id;
    let idle_limit = config.end_timer;
    let idle = sleep(idle_limit.unwrap_or(Duration::from_secs(0)));
    tokio::pin!(idle);

    let mut collected = 0_usize;
    // A dropped session handle closes the stop channel, and a dropped
    // standby ends the removal stream; neither must end the collector or
    // spin the loop.
    let mut stop_open = true;
    let mut removals_open = true;

    let reason = loop {
        tokio::select! {
            () = idle.as_mut(), if idle_limit.is_some() => break EndReason::Idle,
            stop = stop_rx.recv(), if stop_open => match stop {
                Some(reason) => break reason,
                None => stop_open = false,
            },
            removal = removals.next(), if removals_open => match removal {
                Some(Event::ReactionRemove(removal)) => {
                    if let Some(controller) = match_controller(&config.reactions, &removal.0) {
                        let _ = config.events.send(PaginationEvent::ControllerReactionRemove {
                            reaction: Box::new(removal.0.clone()),
                            controller: controller.clone(),
                        });
                    }
                }
                Some(_) => {}
                None => removals_open = false,
            },
            item = additions.next() => {
                let Some(reaction) = item else {
                    break EndReason::StreamEnded;
                };

                let _ = config
                    .events
                    .send(PaginationEvent::Collect(CollectedEvent::Reaction(Box::new(
                        reaction.0.clone(),
                    ))));

                if !passes_author_filter(
                    config.author_dependent,
                    config.author_id,
                    Some(reaction.user_id),
                ) {
                    continue;
                }

                let Some(controller) = match_controller(&config.reactions, &reaction) else {
                    continue;
                };
                let controller = controller.clone();

                let mut stopped = false;
                match controller.action {
                    ControllerAction::Stop => stopped = true,
                    action => {
                        let mut base = inner.lock().await;
                        let target = action
                            .target_index(base.current_page_index(), base.page_count());

                        if let Some(target) = target
                            && let Err(err) = base.set_current_page_index(Some(target), false).await
                        {
                            let _ = config.events.send(PaginationEvent::Error(Arc::new(err)));
                        }
                    }
                }

                let _ = config.events.send(PaginationEvent::ControllerReactionAdd {
                    reaction: Box::new(reaction.0.clone()),
                    controller: controller.clone(),
                });

                if let Some(limit) = idle_limit {
                    idle.as_mut().reset(Instant::now() + limit);
                }

                if config.remove_reaction_on_react
                    && let Err(err) = config
                        .context
                        .http
                        .delete_reaction(
                            config.message.channel_id,
                            message_id,
                            &controller.emoji.request(),
                            reaction.user_id,
                        )
                        .await
                {
                    let _ = config
                        .events
                        .send(PaginationEvent::Error(Arc::new(err.into())));
                }

                if stopped {
                    break EndReason::Stopped;
                }

                collected += 1;
                if let Some(max) = config.max_events
                    && collected >= max
                {
                    break EndReason::EventLimit;
                }
            }
        }
    };

    debug!(reason = %reason, "reaction pagination collector ended");
    let _ = config.events.send(PaginationEvent::End(reason));

    run_end_policy(&config).await;
}

async fn run_end_policy(config: &ReactionCollectorConfig) {
    let http = &config.context.http;
    let message = config.message;

    match config.on_end {
        ReactionOnEnd::Ignore => {}
        ReactionOnEnd::ClearAllReactions => {
            if let Err(err) = http
                .delete_all_reactions(message.channel_id, message.message_id)
                .await
            {
                warn!(?err, "clearing reactions failed");
                let _ = config
                    .events
                    .send(PaginationEvent::Error(Arc::new(err.into())));
            }
        }
        ReactionOnEnd::ClearPaginationReactions => {
            // Each removal is best-effort; one failure never blocks the rest.
            for controller in &config.reactions {
                if let Err(err) = http
                    .delete_all_reaction(
                        message.channel_id,
                        message.message_id,
                        &controller.emoji.request(),
                    )
                    .await
                {
                    warn!(?err, emoji = %controller.emoji, "clearing controller reaction failed");
                    let _ = config
                        .events
                        .send(PaginationEvent::Error(Arc::new(err.into())));
                }
            }
        }
        ReactionOnEnd::DeletePagination => {
            if let Err(err) = http
                .delete_message(message.channel_id, message.message_id)
                .await
            {
                warn!(?err, "deleting pagination message failed");
                let _ = config
                    .events
                    .send(PaginationEvent::Error(Arc::new(err.into())));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use twilight_http::Client;
    use twilight_model::channel::message::EmojiReactionType;
    use twilight_standby::Standby;

    use super::*;
    use crate::send::{InteractionTrigger, SendAs};

    fn offline_context() -> PaginationContext {
        PaginationContext::new(
            Arc::new(Client::new("token".to_owned())),
            Arc::new(Standby::new()),
        )
    }

    fn interaction_trigger() -> PaginationTrigger {
        PaginationTrigger::Interaction(InteractionTrigger {
            id: Id::new(1),
            application_id: Id::new(2),
            token: "interaction-token".to_owned(),
            channel_id: Some(Id::new(3)),
            user_id: Some(Id::new(4)),
            acknowledged: false,
        })
    }

    fn nav_controllers() -> Vec<ReactionController> {
        vec![
            ReactionController {
                emoji: ReactionEmoji::unicode("⬅️"),
                action: ControllerAction::PreviousPage,
            },
            ReactionController {
                emoji: ReactionEmoji::unicode("➡️"),
                action: ControllerAction::NextPage,
            },
        ]
    }

    #[tokio::test]
    async fn ephemeral_page_without_follow_up_is_rejected_before_sending() {
        let builder = ReactionPagination::new()
            .add_page(PageData {
                content: Some("secret".to_owned()),
                ephemeral: true,
                ..PageData::default()
            })
            .reactions(nav_controllers());

        let err = builder
            .send(
                offline_context(),
                SendOptions::new(interaction_trigger(), SendAs::ReplyMessage),
            )
            .await
            .expect_err("ephemeral rejection");

        assert!(matches!(err, PaginationError::EphemeralReactions));
    }

    #[tokio::test]
    async fn sending_without_pages_is_rejected() {
        let err = ReactionPagination::new()
            .reactions(nav_controllers())
            .send(
                offline_context(),
                SendOptions::new(interaction_trigger(), SendAs::ReplyMessage),
            )
            .await
            .expect_err("no pages");

        assert!(matches!(err, PaginationError::NoPages));
    }

    #[test]
    fn controllers_match_by_emoji_identity() {
        let reactions = nav_controllers();
        let next = GatewayReaction {
            burst: false,
            burst_colors: Vec::new(),
            channel_id: Id::new(1),
            emoji: EmojiReactionType::Unicode {
                name: "➡️".to_owned(),
            },
            guild_id: None,
            member: None,
            message_author_id: None,
            message_id: Id::new(2),
            user_id: Id::new(3),
        };

        let controller = match_controller(&reactions, &next).expect("match");
        assert_eq!(controller.action, ControllerAction::NextPage);

        let unknown = GatewayReaction {
            emoji: EmojiReactionType::Unicode {
                name: "🎲".to_owned(),
            },
            ..next
        };
        assert!(match_controller(&reactions, &unknown).is_none());
    }

    #[test]
    fn default_components_order_has_no_controllers_row() {
        let options = ReactionPagination::new().to_options();

        assert_eq!(
            options.base.components_order,
            vec![ActionRowGroup::Page, ActionRowGroup::Additional]
        );
        assert!(options.remove_reaction_on_react);
        assert_eq!(options.on_end, ReactionOnEnd::Ignore);
    }

    #[test]
    fn round_trip_preserves_reaction_configuration() {
        let exported = ReactionPagination::new()
            .pages(["one".into(), "two".into()])
            .reactions(nav_controllers())
            .on_end(ReactionOnEnd::ClearPaginationReactions)
            .remove_reaction_on_react(false)
            .to_options();

        let re_exported = ReactionPagination::from_options(exported.clone()).to_options();

        assert_eq!(re_exported.base.pages.len(), 2);
        assert_eq!(re_exported.reactions, exported.reactions);
        assert_eq!(re_exported.on_end, ReactionOnEnd::ClearPaginationReactions);
        assert!(!re_exported.remove_reaction_on_react);
    }

    #[test]
    fn on_end_parses_from_config_names() {
        assert_eq!(
            "clear-all-reactions".parse::<ReactionOnEnd>().unwrap(),
            ReactionOnEnd::ClearAllReactions
        );
        assert!("evaporate".parse::<ReactionOnEnd>().is_err());
    }
}
