//! Paginated button and reaction message sessions for twilight bots.
//!
//! A pagination is configured as a builder, sent through one of three send
//! strategies, and then driven by a collector task fed from a shared
//! [`twilight_standby::Standby`]. The embedding application must forward
//! gateway events to [`twilight_standby::Standby::process`], otherwise the
//! controls never react.

use std::time::Duration;

/// Default inactivity timeout for pagination sessions.
pub const DEFAULT_END_TIMER: Duration = Duration::from_secs(120);

mod base;
mod button;
mod context;
mod controller;
mod emoji;
mod error;
mod events;
mod page;
mod reaction;
mod send;

pub use base::{BasePagination, BasePaginationOptions};
pub use button::{
    ButtonOnEnd, ButtonPagination, ButtonPaginationOptions, ButtonPaginationSession,
    send_button_pagination,
};
pub use context::PaginationContext;
pub use controller::{
    ActionRowGroup, ButtonController, CollectorOptions, ControllerAction, ReactionController,
    disable_components, next_index, passes_author_filter, previous_index,
};
pub use emoji::{ReactionEmoji, parse_emoji};
pub use error::{PaginationError, PaginationResult};
pub use events::{CollectedEvent, EndReason, PaginationEvent};
pub use page::{
    DynamicPageFn, Page, PageData, PageResolvable, resolve_page, resolve_pages,
    resolve_static_pages,
};
pub use reaction::{
    ReactionOnEnd, ReactionPagination, ReactionPaginationOptions, ReactionPaginationSession,
    send_reaction_pagination,
};
pub use send::{
    FollowUp, InteractionTrigger, MessageTrigger, PaginationTrigger, SendAs, SendOptions,
    SentPagination,
};
