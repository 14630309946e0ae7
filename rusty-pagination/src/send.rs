//! Send strategies and command triggers.

use std::str::FromStr;

use twilight_model::application::interaction::Interaction;
use twilight_model::channel::Message;
use twilight_model::id::{
    Id,
    marker::{
        ApplicationMarker, ChannelMarker, InteractionMarker, MessageMarker, UserMarker,
    },
};

use crate::error::PaginationError;

/// How the initial pagination message is transmitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendAs {
    /// Post a fresh message to the trigger's channel.
    NewMessage,
    /// Edit the trigger message or interaction response in place.
    EditMessage,
    /// Reply to the trigger message, or respond to the interaction.
    ReplyMessage,
}

impl FromStr for SendAs {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" | "new-message" => Ok(Self::NewMessage),
            "edit" | "edit-message" => Ok(Self::EditMessage),
            "reply" | "reply-message" => Ok(Self::ReplyMessage),
            _ => Err(PaginationError::InvalidConfigValue(s.to_owned())),
        }
    }
}

/// Follow-up routing for interaction triggers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FollowUp {
    /// Deliver the pagination as a new follow-up message.
    Create,
    /// Edit the named follow-up message.
    Existing(Id<MessageMarker>),
}

/// Options for the send operation.
#[derive(Clone, Debug)]
pub struct SendOptions {
    pub command: PaginationTrigger,
    pub send_as: SendAs,
    /// Interaction triggers only; ignored for message triggers.
    pub follow_up: Option<FollowUp>,
}

impl SendOptions {
    /// Send options without follow-up routing.
    pub fn new(command: PaginationTrigger, send_as: SendAs) -> Self {
        Self {
            command,
            send_as,
            follow_up: None,
        }
    }

    /// Attach follow-up routing.
    pub fn follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

/// A previously received message that triggered the pagination.
#[derive(Clone, Debug)]
pub struct MessageTrigger {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub author_id: Id<UserMarker>,
}

/// A repliable interaction that triggered the pagination.
#[derive(Clone, Debug)]
pub struct InteractionTrigger {
    pub id: Id<InteractionMarker>,
    pub application_id: Id<ApplicationMarker>,
    pub token: String,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub user_id: Option<Id<UserMarker>>,
    /// Whether the interaction has already been responded to or deferred.
    pub acknowledged: bool,
}

/// The command input a pagination session was started from.
///
/// Only the identity and routing fields the session actually reads are
/// carried; the full platform objects stay with the caller.
#[derive(Clone, Debug)]
pub enum PaginationTrigger {
    Message(MessageTrigger),
    Interaction(InteractionTrigger),
}

impl PaginationTrigger {
    /// Build a trigger from a received message.
    pub fn message(message: &Message) -> Self {
        Self::Message(MessageTrigger {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author.id,
        })
    }

    /// Build a trigger from a repliable interaction.
    ///
    /// `acknowledged` must reflect whether the caller already responded to or
    /// deferred the interaction; the edit and reply send strategies depend on
    /// it.
    pub fn interaction(interaction: &Interaction, acknowledged: bool) -> Self {
        Self::Interaction(InteractionTrigger {
            id: interaction.id,
            application_id: interaction.application_id,
            token: interaction.token.clone(),
            channel_id: interaction.channel.as_ref().map(|channel| channel.id),
            user_id: interaction.author_id(),
            acknowledged,
        })
    }

    /// The channel the pagination would be created in, when resolvable.
    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        match self {
            Self::Message(trigger) => Some(trigger.channel_id),
            Self::Interaction(trigger) => trigger.channel_id,
        }
    }

    /// The user who operated the trigger, when known.
    pub fn user_id(&self) -> Option<Id<UserMarker>> {
        match self {
            Self::Message(trigger) => Some(trigger.author_id),
            Self::Interaction(trigger) => trigger.user_id,
        }
    }
}

impl From<&Message> for PaginationTrigger {
    fn from(message: &Message) -> Self {
        Self::message(message)
    }
}

/// Reference to the transmitted pagination message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SentPagination {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
}

impl From<&Message> for SentPagination {
    fn from(message: &Message) -> Self {
        Self {
            channel_id: message.channel_id,
            message_id: message.id,
        }
    }
}
