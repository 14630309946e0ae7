//! Shared client context handed to pagination sessions.

use std::sync::Arc;

use twilight_http::Client;
use twilight_model::id::{Id, marker::UserMarker};
use twilight_standby::Standby;

/// Shared client state a pagination session operates with.
///
/// Cheap to clone because it only stores reference-counted shared state.
/// The [`Standby`] instance must be fed gateway events through
/// [`Standby::process`] by the embedding application, otherwise collectors
/// never observe any activity.
#[derive(Clone, Debug)]
pub struct PaginationContext {
    pub http: Arc<Client>,
    pub standby: Arc<Standby>,
    /// Id of the bot user, when known. Required for the edit-message send
    /// strategy on message triggers.
    pub current_user_id: Option<Id<UserMarker>>,
}

impl PaginationContext {
    /// Create a new pagination context.
    pub fn new(http: Arc<Client>, standby: Arc<Standby>) -> Self {
        Self {
            http,
            standby,
            current_user_id: None,
        }
    }

    /// Attach the current bot user id.
    pub fn with_current_user_id(mut self, current_user_id: Id<UserMarker>) -> Self {
        self.current_user_id = Some(current_user_id);
        self
    }
}
