//! Navigation controllers and component row assembly policy.

use std::str::FromStr;

use twilight_model::channel::message::Component;
use twilight_model::channel::message::component::Button;
use twilight_model::id::{Id, marker::UserMarker};

use crate::emoji::ReactionEmoji;
use crate::error::PaginationError;

/// Navigation action bound to a control surface element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControllerAction {
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    /// Ends the collector instead of moving the cursor.
    Stop,
}

impl ControllerAction {
    /// Target page index for this action given the current cursor.
    ///
    /// Returns `None` for [`Self::Stop`], which terminates the session
    /// without a cursor move.
    pub fn target_index(self, current: usize, page_count: usize) -> Option<usize> {
        match self {
            Self::FirstPage => Some(0),
            Self::PreviousPage => Some(previous_index(current, page_count)),
            Self::NextPage => Some(next_index(current, page_count)),
            Self::LastPage => Some(page_count.saturating_sub(1)),
            Self::Stop => None,
        }
    }
}

impl FromStr for ControllerAction {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first-page" => Ok(Self::FirstPage),
            "previous" | "previous-page" => Ok(Self::PreviousPage),
            "next" | "next-page" => Ok(Self::NextPage),
            "last" | "last-page" => Ok(Self::LastPage),
            "stop" => Ok(Self::Stop),
            _ => Err(PaginationError::InvalidControllerAction(s.to_owned())),
        }
    }
}

/// Wrapping previous-page index.
pub fn previous_index(current: usize, page_count: usize) -> usize {
    if current == 0 {
        page_count.saturating_sub(1)
    } else {
        current - 1
    }
}

/// Wrapping next-page index.
pub fn next_index(current: usize, page_count: usize) -> usize {
    if current + 1 >= page_count { 0 } else { current + 1 }
}

/// A button bound to a navigation action.
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonController {
    pub button: Button,
    pub action: ControllerAction,
}

/// An emoji reaction bound to a navigation action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReactionController {
    pub emoji: ReactionEmoji,
    pub action: ControllerAction,
}

/// Component row groups, iterated in the configured order when a page's
/// visible rows are assembled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionRowGroup {
    /// The fixed controllers row built from the configured buttons.
    Controllers,
    /// Rows carried by the resolved page itself.
    Page,
    /// Extra rows configured on the session.
    Additional,
}

impl ActionRowGroup {
    /// Default order for button sessions.
    pub fn button_order() -> Vec<Self> {
        vec![Self::Controllers, Self::Page, Self::Additional]
    }

    /// Default order for reaction sessions, which have no controllers row.
    pub fn reaction_order() -> Vec<Self> {
        vec![Self::Page, Self::Additional]
    }
}

/// Options forwarded to the event collector.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollectorOptions {
    /// End the session after this many qualifying control events.
    pub max_events: Option<usize>,
}

/// Whether a control activation from `user` may drive the session.
///
/// Restriction only applies when it is enabled and an owner is known;
/// non-matching users are ignored silently, without an error or cursor move.
pub fn passes_author_filter(
    author_dependent: bool,
    author_id: Option<Id<UserMarker>>,
    user_id: Option<Id<UserMarker>>,
) -> bool {
    !(author_dependent && author_id.is_some() && author_id != user_id)
}

/// Mark every control element in the given rows as non-interactive.
pub fn disable_components(components: &mut [Component]) {
    for component in components {
        match component {
            Component::ActionRow(row) => {
                for inner in &mut row.components {
                    disable_component(inner);
                }
            }
            other => disable_component(other),
        }
    }
}

fn disable_component(component: &mut Component) {
    match component {
        Component::Button(button) => button.disabled = true,
        Component::SelectMenu(menu) => menu.disabled = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_index_wraps_to_last_page() {
        assert_eq!(previous_index(0, 3), 2);
        assert_eq!(previous_index(2, 3), 1);
    }

    #[test]
    fn next_index_wraps_to_first_page() {
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(next_index(0, 3), 1);
    }

    #[test]
    fn single_page_navigation_stays_in_place() {
        assert_eq!(previous_index(0, 1), 0);
        assert_eq!(next_index(0, 1), 0);
    }

    #[test]
    fn stop_action_has_no_target_index() {
        assert_eq!(ControllerAction::Stop.target_index(1, 3), None);
        assert_eq!(ControllerAction::FirstPage.target_index(1, 3), Some(0));
        assert_eq!(ControllerAction::LastPage.target_index(1, 3), Some(2));
    }

    #[test]
    fn author_filter_ignores_non_matching_users_only() {
        let owner = Some(Id::new(1));
        let other = Some(Id::new(2));

        assert!(passes_author_filter(true, owner, owner));
        assert!(!passes_author_filter(true, owner, other));
        assert!(!passes_author_filter(true, owner, None));
        // Restriction disabled, or no known owner: everyone qualifies.
        assert!(passes_author_filter(false, owner, other));
        assert!(passes_author_filter(true, None, other));
    }

    #[test]
    fn controller_actions_parse_from_config_names() {
        assert_eq!(
            "previous".parse::<ControllerAction>().unwrap(),
            ControllerAction::PreviousPage
        );
        assert_eq!(
            "last-page".parse::<ControllerAction>().unwrap(),
            ControllerAction::LastPage
        );
        assert!("sideways".parse::<ControllerAction>().is_err());
    }
}
