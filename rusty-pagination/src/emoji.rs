//! Emoji identity parsing for reaction controllers.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use twilight_http::request::channel::reaction::RequestReactionType;
use twilight_model::channel::message::EmojiReactionType;
use twilight_model::id::{Id, marker::EmojiMarker};

use crate::error::{PaginationError, PaginationResult};

/// Structured identity of a controller emoji.
///
/// Unicode emojis carry only a name; custom emojis also carry an id and an
/// animation flag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReactionEmoji {
    pub name: String,
    pub id: Option<Id<EmojiMarker>>,
    pub animated: bool,
}

impl ReactionEmoji {
    /// Create a unicode emoji identity.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            animated: false,
        }
    }

    /// Create a custom emoji identity.
    pub fn custom(name: impl Into<String>, id: Id<EmojiMarker>, animated: bool) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
            animated,
        }
    }

    /// The reaction-request form used by the HTTP API.
    pub fn request(&self) -> RequestReactionType<'_> {
        match self.id {
            Some(id) => RequestReactionType::Custom {
                id,
                name: Some(&self.name),
            },
            None => RequestReactionType::Unicode { name: &self.name },
        }
    }

    /// Whether a gateway reaction payload carries this emoji.
    pub fn matches(&self, emoji: &EmojiReactionType) -> bool {
        match emoji {
            EmojiReactionType::Custom { id, name, .. } => {
                self.id == Some(*id) && name.as_deref() == Some(self.name.as_str())
            }
            EmojiReactionType::Unicode { name } => self.id.is_none() && *name == self.name,
        }
    }
}

impl fmt::Display for ReactionEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}:{}", self.name, id),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for ReactionEmoji {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_emoji(s)
    }
}

/// Parse a textual emoji reference into a [`ReactionEmoji`].
///
/// Accepts `<a:name:id>` (animated custom), `<:name:id>` (custom), bare
/// `name:id`, and raw unicode. Percent-escaped input is URL-decoded first.
/// An animated custom emoji without an id and an emoji without a name are
/// both rejected.
pub fn parse_emoji(text: &str) -> PaginationResult<ReactionEmoji> {
    let invalid = || PaginationError::InvalidEmoji(text.to_owned());

    let decoded = if text.contains('%') {
        percent_decode_str(text)
            .decode_utf8()
            .map_err(|_| invalid())?
            .into_owned()
    } else {
        text.to_owned()
    };

    if !decoded.contains(':') {
        if decoded.is_empty() {
            return Err(invalid());
        }

        return Ok(ReactionEmoji::unicode(decoded));
    }

    let mut inner = decoded.as_str();
    inner = inner.strip_prefix('<').unwrap_or(inner);
    inner = inner.strip_suffix('>').unwrap_or(inner);

    let mut parts = inner.split(':');

    let first = parts.next().ok_or_else(invalid)?;
    let (animated, name) = if first == "a" {
        (true, parts.next().ok_or_else(invalid)?)
    } else {
        (false, first)
    };

    if name.is_empty()
        || name.len() < 2
        || name.len() > 32
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid());
    }

    let id = match parts.next() {
        None | Some("") => None,
        Some(raw) => {
            if !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }

            let value = raw.parse::<u64>().map_err(|_| invalid())?;
            Some(Id::new_checked(value).ok_or_else(invalid)?)
        }
    };

    if parts.next().is_some() {
        return Err(invalid());
    }

    if animated && id.is_none() {
        return Err(invalid());
    }

    Ok(ReactionEmoji { name: name.to_owned(), id, animated })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_emoji_parses_to_bare_name() {
        let emoji = parse_emoji("😀").expect("parse");

        assert_eq!(emoji, ReactionEmoji::unicode("😀"));
    }

    #[test]
    fn custom_emoji_parses_name_and_id() {
        let emoji = parse_emoji("<:foo:123>").expect("parse");

        assert_eq!(emoji.name, "foo");
        assert_eq!(emoji.id, Some(Id::new(123)));
        assert!(!emoji.animated);
    }

    #[test]
    fn bare_custom_emoji_reference_parses_without_wrappers() {
        let emoji = parse_emoji("foo:123").expect("parse");

        assert_eq!(emoji.name, "foo");
        assert_eq!(emoji.id, Some(Id::new(123)));
    }

    #[test]
    fn animated_custom_emoji_sets_flag() {
        let emoji = parse_emoji("<a:foo:123>").expect("parse");

        assert!(emoji.animated);
    }

    #[test]
    fn animated_emoji_without_id_is_rejected() {
        assert!(matches!(
            parse_emoji("<a:foo:>"),
            Err(PaginationError::InvalidEmoji(_))
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(parse_emoji("").is_err());
    }

    #[test]
    fn percent_escaped_input_is_decoded_first() {
        let emoji = parse_emoji("%F0%9F%98%80").expect("parse");

        assert_eq!(emoji.name, "😀");
    }

    #[test]
    fn stringify_uses_reaction_request_form() {
        let unicode = ReactionEmoji::unicode("😀");
        let custom = ReactionEmoji::custom("foo", Id::new(123), false);

        assert_eq!(unicode.to_string(), "😀");
        assert_eq!(custom.to_string(), "foo:123");
    }

    #[test]
    fn gateway_emoji_matching_compares_identity() {
        let custom = ReactionEmoji::custom("foo", Id::new(123), false);
        let unicode = ReactionEmoji::unicode("😀");

        assert!(custom.matches(&EmojiReactionType::Custom {
            animated: false,
            id: Id::new(123),
            name: Some("foo".to_owned()),
        }));
        assert!(!custom.matches(&EmojiReactionType::Unicode {
            name: "foo".to_owned(),
        }));
        assert!(unicode.matches(&EmojiReactionType::Unicode {
            name: "😀".to_owned(),
        }));
    }
}
