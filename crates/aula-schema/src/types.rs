//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings for backward compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Account identifier of a requester or approver. The first character
    /// encodes the role (`P`/`A` are staff) in the historical id scheme.
    UserId
);

string_newtype!(
    /// Room name as stored in the catalog, e.g. `908`.
    RoomName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display_and_as_ref() {
        let id = UserId::new("S20231234");
        assert_eq!(id.to_string(), "S20231234");
        assert_eq!(id.as_str(), "S20231234");
        assert_eq!(AsRef::<str>::as_ref(&id), "S20231234");
    }

    #[test]
    fn user_id_serde_roundtrip() {
        let id = UserId::new("A001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"A001\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn room_name_from_str() {
        let room = RoomName::from("912");
        assert_eq!(room.as_str(), "912");
    }

    #[test]
    fn room_name_equality() {
        let a = RoomName::new("908");
        let b = RoomName::new("908");
        let c = RoomName::new("911");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn user_id_into_inner() {
        let id = UserId::new("P42".to_owned());
        assert_eq!(id.into_inner(), "P42");
    }
}
