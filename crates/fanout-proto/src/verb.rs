//! The closed set of request verbs.
//!
//! The wire carries verbs as ASCII strings (see [`crate::codec`]), but every
//! handler and dispatch site in this codebase works with the typed [`Verb`]
//! enum instead of comparing raw strings.

use crate::error::ProtocolError;

/// A request verb, decoded from its ASCII wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `who_am_i`: caller asks for its own id.
    WhoAmI,
    /// `who_is_here`: caller asks for every other registered id.
    WhoIsHere,
    /// `relay`: caller asks the hub to fan a body out to a receiver list.
    Relay,
}

impl Verb {
    /// The ASCII string this verb is spelled as on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WhoAmI => "who_am_i",
            Self::WhoIsHere => "who_is_here",
            Self::Relay => "relay",
        }
    }

    /// Parse a verb from its wire string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownVerb`] if `s` is not one of the
    /// recognized verbs.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "who_am_i" => Ok(Self::WhoAmI),
            "who_is_here" => Ok(Self::WhoIsHere),
            "relay" => Ok(Self::Relay),
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_string() {
        for verb in [Verb::WhoAmI, Verb::WhoIsHere, Verb::Relay] {
            assert_eq!(Verb::parse(verb.as_str()).unwrap(), verb);
        }
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(matches!(Verb::parse("delete_everything"), Err(ProtocolError::UnknownVerb(_))));
    }
}
