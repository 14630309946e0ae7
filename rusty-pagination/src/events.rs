//! Events emitted by running pagination sessions.

use std::fmt;
use std::sync::Arc;

use twilight_model::application::interaction::Interaction;
use twilight_model::gateway::GatewayReaction;

use crate::controller::{ButtonController, ReactionController};
use crate::error::PaginationError;
use crate::page::PageData;

/// Why a pagination session ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndReason {
    /// The inactivity timer elapsed.
    Idle,
    /// A stop controller was activated or the session was stopped by hand.
    Stopped,
    /// The configured event limit was reached.
    EventLimit,
    /// The collector's event stream closed.
    StreamEnded,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Stopped => "stopped",
            Self::EventLimit => "event-limit",
            Self::StreamEnded => "stream-ended",
        })
    }
}

/// A raw collector event, before controller matching.
#[derive(Clone, Debug)]
pub enum CollectedEvent {
    Component(Box<Interaction>),
    Reaction(Box<GatewayReaction>),
}

/// Notifications emitted over a session's broadcast channel.
#[derive(Clone, Debug)]
pub enum PaginationEvent {
    /// The initial page was transmitted and the collector is attached.
    Ready,
    /// The live message was edited to a new page.
    PageChange { page: Box<PageData>, index: usize },
    /// A raw event reached the collector, before any filtering.
    Collect(CollectedEvent),
    /// A configured button controller was activated.
    ControllerInteraction {
        interaction: Box<Interaction>,
        controller: ButtonController,
    },
    /// A configured reaction controller was activated.
    ControllerReactionAdd {
        reaction: Box<GatewayReaction>,
        controller: ReactionController,
    },
    /// A configured controller reaction was removed from the live message.
    ControllerReactionRemove {
        reaction: Box<GatewayReaction>,
        controller: ReactionController,
    },
    /// The collector ended.
    End(EndReason),
    /// A best-effort operation failed inside the collector task.
    Error(Arc<PaginationError>),
}
