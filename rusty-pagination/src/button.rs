//! Button-driven pagination sessions.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::Component;
use twilight_model::channel::message::component::{ActionRow, Button, ComponentType};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::{Id, marker::UserMarker};
use twilight_standby::future::WaitForComponentStream;

use crate::base::{BasePagination, BasePaginationOptions, ComponentsVisibility};
use crate::context::PaginationContext;
use crate::controller::{
    ActionRowGroup, ButtonController, CollectorOptions, ControllerAction, passes_author_filter,
};
use crate::error::{PaginationError, PaginationResult};
use crate::events::{CollectedEvent, EndReason, PaginationEvent};
use crate::page::{PageData, PageResolvable};
use crate::send::{SendOptions, SentPagination};

/// What happens to the live message when a button session ends.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ButtonOnEnd {
    /// Leave the message as-is.
    Ignore,
    /// Strip every component row from the message.
    RemoveComponents,
    /// Keep the rows but disable every control.
    #[default]
    DisableComponents,
    /// Delete the live message.
    DeletePagination,
}

impl FromStr for ButtonOnEnd {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "remove-components" => Ok(Self::RemoveComponents),
            "disable-components" => Ok(Self::DisableComponents),
            "delete-pagination" => Ok(Self::DeletePagination),
            _ => Err(PaginationError::InvalidConfigValue(s.to_owned())),
        }
    }
}

/// Full configuration of a button pagination, exportable for recreation.
#[derive(Clone, Debug)]
pub struct ButtonPaginationOptions {
    pub base: BasePaginationOptions,
    pub buttons: Vec<ButtonController>,
    pub on_end: ButtonOnEnd,
    pub ephemeral: bool,
    pub defer_update_controller_interaction: bool,
}

impl Default for ButtonPaginationOptions {
    fn default() -> Self {
        Self {
            base: BasePaginationOptions::default(),
            buttons: Vec::new(),
            on_end: ButtonOnEnd::default(),
            ephemeral: false,
            defer_update_controller_interaction: true,
        }
    }
}

/// Unsent button pagination builder.
pub struct ButtonPagination {
    base: BasePagination,
    buttons: Vec<ButtonController>,
    on_end: ButtonOnEnd,
    defer_update_controller_interaction: bool,
}

impl ButtonPagination {
    pub fn new() -> Self {
        Self::from_options(ButtonPaginationOptions::default())
    }

    /// Recreate a builder from exported options.
    pub fn from_options(options: ButtonPaginationOptions) -> Self {
        let mut base = BasePagination::new(options.base);
        base.ephemeral = options.ephemeral;

        Self {
            base,
            buttons: options.buttons,
            on_end: options.on_end,
            defer_update_controller_interaction: options.defer_update_controller_interaction,
        }
    }

    /// Export the full configuration as a plain options value.
    pub fn to_options(&self) -> ButtonPaginationOptions {
        ButtonPaginationOptions {
            base: self.base.to_options(),
            buttons: self.buttons.clone(),
            on_end: self.on_end,
            ephemeral: self.base.ephemeral,
            defer_update_controller_interaction: self.defer_update_controller_interaction,
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

    /// Bind a button to a navigation action.
    pub fn add_button(mut self, button: Button, action: ControllerAction) -> Self {
        self.buttons.push(ButtonController { button, action });
        self
    }

    /// Replace the configured button controllers.
    pub fn buttons(mut self, buttons: Vec<ButtonController>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn on_end(mut self, on_end: ButtonOnEnd) -> Self {
        self.on_end = on_end;
        self
    }

    /// Deliver every page as an ephemeral interaction response.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.base.ephemeral = ephemeral;
        self
    }

    /// Acknowledge controller clicks with a deferred update after dispatch.
    pub fn defer_update_controller_interaction(mut self, defer: bool) -> Self {
        self.defer_update_controller_interaction = defer;
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

    /// Transmit the initial page, attach the click collector, and hand the
    /// running session back.
    ///
    /// Fails when the pagination has no pages or was already sent.
    pub async fn send(
        mut self,
        context: PaginationContext,
        options: SendOptions,
    ) -> PaginationResult<ButtonPaginationSession> {
        self.base.ensure_sendable()?;

        self.base.context = Some(context.clone());
        self.base.command = Some(options.command);
        self.base.controller_action_row = controllers_row(&self.buttons);

        let index = self.base.current_page_index();
        let page = self
            .base
            .get_page(index)
            .await?
            .ok_or(PaginationError::PageOutOfRange(index))?;
        self.base
            .send_initial_page(&page, options.send_as, options.follow_up)
            .await?;

        let message = self
            .base
            .sent_pagination()
            .ok_or(PaginationError::NotSent)?;
        let stream = context
            .standby
            .wait_for_component_stream(message.message_id, |_: &Interaction| true);

        self.base.emit(PaginationEvent::Ready);

        let events = self.base.events.clone();
        let config = ButtonCollectorConfig {
            context,
            events: events.clone(),
            buttons: self.buttons,
            on_end: self.on_end,
            defer_update: self.defer_update_controller_interaction,
            author_dependent: self.base.author_dependent,
            author_id: self.base.author_id(),
            end_timer: self.base.end_timer,
            max_events: self.base.collector_options.max_events,
            message,
        };

        let inner = Arc::new(tokio::sync::Mutex::new(self.base));
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_collector(Arc::clone(&inner), config, stream, stop_rx));

        Ok(ButtonPaginationSession {
            inner,
            events,
            stop: stop_tx,
            task,
        })
    }
}

impl Default for ButtonPagination {
    fn default() -> Self {
        Self::new()
    }
}

/// Running button pagination session.
///
/// Dropping the handle does not end the session; use [`Self::stop`] or let
/// the configured end conditions fire.
#[derive(Debug)]
pub struct ButtonPaginationSession {
    inner: Arc<tokio::sync::Mutex<BasePagination>>,
    events: broadcast::Sender<PaginationEvent>,
    stop: mpsc::Sender<EndReason>,
    task: JoinHandle<()>,
}

impl ButtonPaginationSession {
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

/// Build and send a button pagination in one call.
pub async fn send_button_pagination(
    context: PaginationContext,
    options: ButtonPaginationOptions,
    send: SendOptions,
) -> PaginationResult<ButtonPaginationSession> {
    ButtonPagination::from_options(options).send(context, send).await
}

fn controllers_row(buttons: &[ButtonController]) -> Option<Component> {
    if buttons.is_empty() {
        return None;
    }

    Some(Component::ActionRow(ActionRow {
        id: None,
        components: buttons
            .iter()
            .map(|controller| Component::Button(controller.button.clone()))
            .collect(),
    }))
}

struct ButtonCollectorConfig {
    context: PaginationContext,
    events: broadcast::Sender<PaginationEvent>,
    buttons: Vec<ButtonController>,
    on_end: ButtonOnEnd,
    defer_update: bool,
    author_dependent: bool,
    author_id: Option<Id<UserMarker>>,
    end_timer: Option<Duration>,
    max_events: Option<usize>,
    message: SentPagination,
}

fn match_controller<'a>(
    buttons: &'a [ButtonController],
    interaction: &Interaction,
) -> Option<&'a ButtonController> {
    let Some(InteractionData::MessageComponent(data)) = &interaction.data else {
        return None;
    };

    if data.component_type != ComponentType::Button {
        return None;
    }

    buttons
        .iter()
        .find(|controller| controller.button.custom_id.as_deref() == Some(data.custom_id.as_str()))
}

async fn defer_update(
    context: &PaginationContext,
    interaction: &Interaction,
) -> PaginationResult<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::DeferredUpdateMessage,
        data: None,
    };

    context
        .http
        .interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

async fn run_collector(
    inner: Arc<tokio::sync::Mutex<BasePagination>>,
    config: ButtonCollectorConfig,
    mut stream: WaitForComponentStream,
    mut stop_rx: mpsc::Receiver<EndReason>,
) {
    let idle_limit = config.end_timer;
    let idle = sleep(idle_limit.unwrap_or(Duration::from_secs(0)));
    tokio::pin!(idle);

    let mut collected = 0_usize;
    // A dropped session handle closes the stop channel; that must not end
    // the collector.
    let mut stop_open = true;

    let reason = loop {
        tokio::select! {
            () = idle.as_mut(), if idle_limit.is_some() => break EndReason::Idle,
            stop = stop_rx.recv(), if stop_open => match stop {
                Some(reason) => break reason,
                None => stop_open = false,
            },
            item = stream.next() => {
                let Some(interaction) = item else {
                    break EndReason::StreamEnded;
                };

                let _ = config
                    .events
                    .send(PaginationEvent::Collect(CollectedEvent::Component(Box::new(
                        interaction.clone(),
                    ))));

                if !passes_author_filter(
                    config.author_dependent,
                    config.author_id,
                    interaction.author_id(),
                ) {
                    continue;
                }

                let Some(controller) = match_controller(&config.buttons, &interaction) else {
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

                let _ = config.events.send(PaginationEvent::ControllerInteraction {
                    interaction: Box::new(interaction.clone()),
                    controller,
                });

                if let Some(limit) = idle_limit {
                    idle.as_mut().reset(Instant::now() + limit);
                }

                if config.defer_update
                    && let Err(err) = defer_update(&config.context, &interaction).await
                {
                    let _ = config.events.send(PaginationEvent::Error(Arc::new(err)));
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

    debug!(reason = %reason, "button pagination collector ended");
    let _ = config.events.send(PaginationEvent::End(reason));

    let cleanup = match config.on_end {
        ButtonOnEnd::Ignore => Ok(()),
        ButtonOnEnd::RemoveComponents => {
            let mut base = inner.lock().await;
            base.visibility = ComponentsVisibility::RemoveAll;
            base.set_current_page_index(None, true).await.map(|_| ())
        }
        ButtonOnEnd::DisableComponents => {
            let mut base = inner.lock().await;
            base.visibility = ComponentsVisibility::DisableAll;
            base.set_current_page_index(None, true).await.map(|_| ())
        }
        ButtonOnEnd::DeletePagination => config
            .context
            .http
            .delete_message(config.message.channel_id, config.message.message_id)
            .await
            .map(|_| ())
            .map_err(PaginationError::from),
    };

    if let Err(err) = cleanup {
        warn!(?err, "button pagination end cleanup failed");
        let _ = config.events.send(PaginationEvent::Error(Arc::new(err)));
    }
}
