//! State and send/update primitives shared by both session variants.

use std::time::Duration;

use tokio::sync::broadcast;
use twilight_model::channel::message::{Component, MessageFlags};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::{Id, marker::UserMarker};
use twilight_util::builder::InteractionResponseDataBuilder;

use crate::context::PaginationContext;
use crate::controller::{ActionRowGroup, CollectorOptions, disable_components};
use crate::error::{PaginationError, PaginationResult};
use crate::events::PaginationEvent;
use crate::page::{Page, PageData, PageResolvable, resolve_page, resolve_static_pages};
use crate::send::{FollowUp, PaginationTrigger, SendAs, SentPagination};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Visibility applied to assembled component rows.
///
/// Once an end policy moves this away from [`Self::Normal`] it is never
/// reverted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ComponentsVisibility {
    Normal,
    DisableAll,
    RemoveAll,
    RemoveControllers,
}

/// Configuration shared by both pagination variants.
#[derive(Clone, Debug)]
pub struct BasePaginationOptions {
    pub pages: Vec<PageResolvable>,
    /// Restrict controls to this user. When unset, the trigger's author is
    /// used once the pagination is sent.
    pub author_id: Option<Id<UserMarker>>,
    pub author_dependent: bool,
    /// Inactivity timeout; `None` keeps the session open until stopped.
    pub end_timer: Option<Duration>,
    pub single_page_no_controllers: bool,
    pub additional_action_rows: Vec<Component>,
    pub components_order: Vec<ActionRowGroup>,
    pub collector_options: CollectorOptions,
}

impl Default for BasePaginationOptions {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            author_id: None,
            author_dependent: true,
            end_timer: None,
            single_page_no_controllers: true,
            additional_action_rows: Vec::new(),
            components_order: ActionRowGroup::button_order(),
            collector_options: CollectorOptions::default(),
        }
    }
}

/// Page list, cursor, and send/update primitives shared by both variants.
#[derive(Debug)]
pub struct BasePagination {
    pub(crate) pages: Vec<Page>,
    pub(crate) author_id: Option<Id<UserMarker>>,
    pub(crate) author_dependent: bool,
    pub(crate) end_timer: Option<Duration>,
    pub(crate) single_page_no_controllers: bool,
    pub(crate) additional_action_rows: Vec<Component>,
    pub(crate) components_order: Vec<ActionRowGroup>,
    pub(crate) collector_options: CollectorOptions,
    /// Marks every produced page as ephemeral (button variant only).
    pub(crate) ephemeral: bool,
    pub(crate) controller_action_row: Option<Component>,
    pub(crate) current_page_index: usize,
    pub(crate) command: Option<PaginationTrigger>,
    pub(crate) pagination: Option<SentPagination>,
    pub(crate) visibility: ComponentsVisibility,
    pub(crate) context: Option<PaginationContext>,
    pub(crate) events: broadcast::Sender<PaginationEvent>,
}

impl BasePagination {
    pub(crate) fn new(options: BasePaginationOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            pages: resolve_static_pages(options.pages),
            author_id: options.author_id,
            author_dependent: options.author_dependent,
            end_timer: options.end_timer,
            single_page_no_controllers: options.single_page_no_controllers,
            additional_action_rows: options.additional_action_rows,
            components_order: options.components_order,
            collector_options: options.collector_options,
            ephemeral: false,
            controller_action_row: None,
            current_page_index: 0,
            command: None,
            pagination: None,
            visibility: ComponentsVisibility::Normal,
            context: None,
            events,
        }
    }

    pub(crate) fn to_options(&self) -> BasePaginationOptions {
        BasePaginationOptions {
            pages: self.pages.iter().map(PageResolvable::from).collect(),
            author_id: self.author_id,
            author_dependent: self.author_dependent,
            end_timer: self.end_timer,
            single_page_no_controllers: self.single_page_no_controllers,
            additional_action_rows: self.additional_action_rows.clone(),
            components_order: self.components_order.clone(),
            collector_options: self.collector_options,
        }
    }

    /// Subscribe to the session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PaginationEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: PaginationEvent) {
        let _ = self.events.send(event);
    }

    /// Number of configured pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Current cursor position.
    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    /// Wrapping previous-page index.
    pub fn previous_page_index(&self) -> usize {
        crate::controller::previous_index(self.current_page_index, self.pages.len())
    }

    /// Wrapping next-page index.
    pub fn next_page_index(&self) -> usize {
        crate::controller::next_index(self.current_page_index, self.pages.len())
    }

    /// The user allowed to operate the controls: the configured author id,
    /// falling back to the trigger's author once sent.
    pub fn author_id(&self) -> Option<Id<UserMarker>> {
        self.author_id
            .or_else(|| self.command.as_ref().and_then(PaginationTrigger::user_id))
    }

    /// Whether the initial page has been transmitted.
    pub fn is_sent(&self) -> bool {
        self.command.is_some() && self.pagination.is_some()
    }

    /// Reference to the live message, once sent.
    pub fn sent_pagination(&self) -> Option<SentPagination> {
        self.pagination
    }

    pub(crate) fn ensure_sendable(&self) -> PaginationResult<()> {
        if self.is_sent() {
            return Err(PaginationError::AlreadySent);
        }

        if self.pages.is_empty() {
            return Err(PaginationError::NoPages);
        }

        Ok(())
    }

    /// Resolve the page at `index` and assemble its visible component rows.
    ///
    /// Returns `Ok(None)` when the index is out of range. Row assembly walks
    /// the configured order: the controllers row is skipped for single-page
    /// sessions with suppression enabled and under the remove-controllers
    /// visibility; remove-all strips every row; disable-all keeps rows but
    /// marks each control non-interactive.
    pub async fn get_page(&self, index: usize) -> PaginationResult<Option<PageData>> {
        let Some(page) = self.pages.get(index) else {
            return Ok(None);
        };

        let mut data = resolve_page(page).await?;
        let page_rows = std::mem::take(&mut data.components);
        let mut components = Vec::new();

        if self.visibility != ComponentsVisibility::RemoveAll {
            for group in &self.components_order {
                match group {
                    ActionRowGroup::Controllers => {
                        if (self.pages.len() < 2 && self.single_page_no_controllers)
                            || self.visibility == ComponentsVisibility::RemoveControllers
                        {
                            continue;
                        }

                        if let Some(row) = &self.controller_action_row {
                            components.push(row.clone());
                        }
                    }
                    ActionRowGroup::Page => components.extend(page_rows.iter().cloned()),
                    ActionRowGroup::Additional => {
                        components.extend(self.additional_action_rows.iter().cloned());
                    }
                }
            }
        }

        if self.visibility == ComponentsVisibility::DisableAll {
            disable_components(&mut components);
        }

        data.components = components;
        data.ephemeral = data.ephemeral || self.ephemeral;

        Ok(Some(data))
    }

    /// Move the cursor and, once sent, edit the live message in place.
    ///
    /// `index: None` re-applies the current page. With `components_only` only
    /// the assembled component rows are written, leaving content and embeds
    /// untouched. Emits [`PaginationEvent::PageChange`] after a successful
    /// live edit. This is the only mutation path for the live message after
    /// the initial send.
    pub async fn set_current_page_index(
        &mut self,
        index: Option<usize>,
        components_only: bool,
    ) -> PaginationResult<PageData> {
        let target = index.unwrap_or(self.current_page_index);
        let Some(page) = self.get_page(target).await? else {
            return Err(PaginationError::PageOutOfRange(target));
        };

        self.current_page_index = target;

        if self.is_sent() {
            self.edit_live_message(&page, components_only).await?;

            let current = self
                .get_page(self.current_page_index)
                .await?
                .ok_or(PaginationError::PageOutOfRange(self.current_page_index))?;
            self.emit(PaginationEvent::PageChange {
                page: Box::new(current),
                index: self.current_page_index,
            });
        }

        Ok(page)
    }

    async fn edit_live_message(
        &self,
        page: &PageData,
        components_only: bool,
    ) -> PaginationResult<()> {
        let (Some(context), Some(command), Some(sent)) =
            (&self.context, &self.command, &self.pagination)
        else {
            return Err(PaginationError::NotSent);
        };

        match command {
            PaginationTrigger::Message(_) => {
                let mut request = context
                    .http
                    .update_message(sent.channel_id, sent.message_id)
                    .components(Some(&page.components));

                if !components_only {
                    request = request
                        .content(page.content.as_deref())
                        .embeds(Some(&page.embeds));
                }

                request.await?;
            }
            PaginationTrigger::Interaction(trigger) => {
                let client = context.http.interaction(trigger.application_id);
                let mut request = client
                    .update_followup(&trigger.token, sent.message_id)
                    .components(Some(&page.components));

                if !components_only {
                    request = request
                        .content(page.content.as_deref())
                        .embeds(Some(&page.embeds));
                }

                request.await?;
            }
        }

        Ok(())
    }

    /// Transmit the initial page through the selected send strategy.
    ///
    /// The resulting message becomes the session's live message; exactly one
    /// strategy runs per send.
    pub(crate) async fn send_initial_page(
        &mut self,
        page: &PageData,
        send_as: SendAs,
        follow_up: Option<FollowUp>,
    ) -> PaginationResult<()> {
        let Some(context) = self.context.clone() else {
            return Err(PaginationError::NotSent);
        };
        let Some(command) = self.command.clone() else {
            return Err(PaginationError::NotSent);
        };

        let message = match send_as {
            SendAs::NewMessage => {
                let channel_id = command
                    .channel_id()
                    .ok_or(PaginationError::MissingChannel)?;
                let mut request = context
                    .http
                    .create_message(channel_id)
                    .embeds(&page.embeds)
                    .components(&page.components);

                if let Some(content) = page.content.as_deref() {
                    request = request.content(content);
                }

                request.await?.model().await?
            }
            SendAs::EditMessage => match &command {
                PaginationTrigger::Message(trigger) => {
                    if context.current_user_id != Some(trigger.author_id) {
                        return Err(PaginationError::MessageNotEditable);
                    }

                    context
                        .http
                        .update_message(trigger.channel_id, trigger.id)
                        .content(page.content.as_deref())
                        .embeds(Some(&page.embeds))
                        .components(Some(&page.components))
                        .await?
                        .model()
                        .await?
                }
                PaginationTrigger::Interaction(trigger) => {
                    if !trigger.acknowledged {
                        return Err(PaginationError::InteractionNotAcknowledged);
                    }

                    let client = context.http.interaction(trigger.application_id);

                    match follow_up {
                        Some(FollowUp::Existing(message_id)) => {
                            client
                                .update_followup(&trigger.token, message_id)
                                .content(page.content.as_deref())
                                .embeds(Some(&page.embeds))
                                .components(Some(&page.components))
                                .await?
                                .model()
                                .await?
                        }
                        _ => {
                            client
                                .update_response(&trigger.token)
                                .content(page.content.as_deref())
                                .embeds(Some(&page.embeds))
                                .components(Some(&page.components))
                                .await?
                                .model()
                                .await?
                        }
                    }
                }
            },
            SendAs::ReplyMessage => match &command {
                PaginationTrigger::Message(trigger) => {
                    let mut request = context
                        .http
                        .create_message(trigger.channel_id)
                        .reply(trigger.id)
                        .embeds(&page.embeds)
                        .components(&page.components);

                    if let Some(content) = page.content.as_deref() {
                        request = request.content(content);
                    }

                    request.await?.model().await?
                }
                PaginationTrigger::Interaction(trigger) => {
                    let as_follow_up = matches!(follow_up, Some(FollowUp::Create));

                    if !as_follow_up && trigger.acknowledged {
                        return Err(PaginationError::InteractionAlreadyAcknowledged);
                    }

                    let client = context.http.interaction(trigger.application_id);

                    if as_follow_up {
                        let mut request = client
                            .create_followup(&trigger.token)
                            .embeds(&page.embeds)
                            .components(&page.components);

                        if let Some(content) = page.content.as_deref() {
                            request = request.content(content);
                        }
                        if page.ephemeral {
                            request = request.flags(MessageFlags::EPHEMERAL);
                        }

                        request.await?.model().await?
                    } else {
                        let mut data = InteractionResponseDataBuilder::new()
                            .embeds(page.embeds.iter().cloned())
                            .components(page.components.iter().cloned());

                        if let Some(content) = &page.content {
                            data = data.content(content.clone());
                        }
                        if page.ephemeral {
                            data = data.flags(MessageFlags::EPHEMERAL);
                        }

                        let response = InteractionResponse {
                            kind: InteractionResponseType::ChannelMessageWithSource,
                            data: Some(data.build()),
                        };
                        client
                            .create_response(trigger.id, &trigger.token, &response)
                            .await?;

                        if let Some(PaginationTrigger::Interaction(stored)) = &mut self.command {
                            stored.acknowledged = true;
                        }

                        client.response(&trigger.token).await?.model().await?
                    }
                }
            },
        };

        self.pagination = Some(SentPagination::from(&message));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use twilight_model::channel::message::component::{
        ActionRow, Button, ButtonStyle, Component,
    };

    use super::*;
    use crate::send::MessageTrigger;

    fn nav_button(custom_id: &str) -> Button {
        Button {
            id: None,
            custom_id: Some(custom_id.to_owned()),
            disabled: false,
            emoji: None,
            label: Some(custom_id.to_owned()),
            style: ButtonStyle::Secondary,
            url: None,
            sku_id: None,
        }
    }

    fn controllers_row() -> Component {
        Component::ActionRow(ActionRow {
            id: None,
            components: vec![
                Component::Button(nav_button("previous")),
                Component::Button(nav_button("next")),
            ],
        })
    }

    fn base_with_pages(count: usize) -> BasePagination {
        let options = BasePaginationOptions {
            pages: (0..count)
                .map(|index| PageResolvable::from(format!("page {index}")))
                .collect(),
            ..BasePaginationOptions::default()
        };

        BasePagination::new(options)
    }

    fn assembled_buttons(page: &PageData) -> Vec<&Button> {
        page.components
            .iter()
            .filter_map(|component| match component {
                Component::ActionRow(row) => Some(&row.components),
                _ => None,
            })
            .flatten()
            .filter_map(|component| match component {
                Component::Button(button) => Some(button),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn cursor_wraps_circularly_in_both_directions() {
        let mut base = base_with_pages(3);

        assert_eq!(base.previous_page_index(), 2);
        assert_eq!(base.next_page_index(), 1);

        base.current_page_index = 2;
        assert_eq!(base.previous_page_index(), 1);
        assert_eq!(base.next_page_index(), 0);
    }

    #[tokio::test]
    async fn get_page_out_of_range_is_none_not_an_error() {
        let base = base_with_pages(2);

        assert!(base.get_page(2).await.expect("resolution").is_none());
    }

    #[tokio::test]
    async fn set_current_page_index_out_of_range_is_a_range_error() {
        let mut base = base_with_pages(2);

        let err = base
            .set_current_page_index(Some(5), false)
            .await
            .expect_err("range error");
        assert!(matches!(err, PaginationError::PageOutOfRange(5)));
        assert_eq!(base.current_page_index(), 0);
    }

    #[test]
    fn sending_without_pages_is_rejected() {
        let base = base_with_pages(0);

        assert!(matches!(
            base.ensure_sendable(),
            Err(PaginationError::NoPages)
        ));
    }

    #[test]
    fn sending_twice_is_rejected() {
        let mut base = base_with_pages(2);
        base.command = Some(PaginationTrigger::Message(MessageTrigger {
            id: Id::new(1),
            channel_id: Id::new(2),
            author_id: Id::new(3),
        }));
        base.pagination = Some(SentPagination {
            channel_id: Id::new(2),
            message_id: Id::new(4),
        });

        assert!(matches!(
            base.ensure_sendable(),
            Err(PaginationError::AlreadySent)
        ));
    }

    #[tokio::test]
    async fn controllers_row_is_assembled_before_page_rows() {
        let mut base = base_with_pages(3);
        base.controller_action_row = Some(controllers_row());

        let page = base.get_page(0).await.expect("resolution").expect("page");

        assert_eq!(page.components.len(), 1);
        assert_eq!(assembled_buttons(&page).len(), 2);
    }

    #[tokio::test]
    async fn single_page_suppression_drops_the_controllers_row() {
        let mut base = base_with_pages(1);
        base.controller_action_row = Some(controllers_row());

        let page = base.get_page(0).await.expect("resolution").expect("page");
        assert!(page.components.is_empty());

        base.single_page_no_controllers = false;
        let page = base.get_page(0).await.expect("resolution").expect("page");
        assert_eq!(page.components.len(), 1);
    }

    #[tokio::test]
    async fn disable_all_keeps_rows_but_disables_every_control() {
        let mut base = base_with_pages(3);
        base.controller_action_row = Some(controllers_row());
        base.visibility = ComponentsVisibility::DisableAll;

        let page = base.get_page(0).await.expect("resolution").expect("page");

        let buttons = assembled_buttons(&page);
        assert_eq!(buttons.len(), 2);
        assert!(buttons.iter().all(|button| button.disabled));
    }

    #[tokio::test]
    async fn remove_all_strips_every_row() {
        let mut base = base_with_pages(3);
        base.controller_action_row = Some(controllers_row());
        base.additional_action_rows = vec![controllers_row()];
        base.visibility = ComponentsVisibility::RemoveAll;

        let page = base.get_page(0).await.expect("resolution").expect("page");

        assert!(page.components.is_empty());
    }

    #[tokio::test]
    async fn remove_controllers_keeps_additional_rows() {
        let mut base = base_with_pages(3);
        base.controller_action_row = Some(controllers_row());
        base.additional_action_rows = vec![controllers_row()];
        base.visibility = ComponentsVisibility::RemoveControllers;

        let page = base.get_page(0).await.expect("resolution").expect("page");

        assert_eq!(page.components.len(), 1);
    }

    #[tokio::test]
    async fn unsent_cursor_move_emits_no_page_change() {
        let mut base = base_with_pages(3);
        let mut events = base.subscribe();

        base.set_current_page_index(Some(1), false)
            .await
            .expect("cursor move");

        assert_eq!(base.current_page_index(), 1);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
