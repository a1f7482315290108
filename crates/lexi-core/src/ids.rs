//! Branded ID newtypes for type safety.
//!
//! Every entity in the Course → Book → Unit hierarchy has a distinct ID
//! type implemented as a newtype wrapper around `String`. This prevents
//! accidentally passing a book ID where a unit ID is expected.
//!
//! All IDs are UUID v7 (time-ordered) generated via [`uuid::Uuid::now_v7`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a course.
    CourseId
}

branded_id! {
    /// Unique identifier for a book within a course.
    BookId
}

branded_id! {
    /// Unique identifier for a unit within a book.
    UnitId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_and_time_ordered() {
        let a = UnitId::new();
        let b = UnitId::new();
        assert_ne!(a, b);
        // UUID v7 sorts by creation time.
        assert!(a.as_str() <= b.as_str());
    }

    #[test]
    fn serde_is_transparent() {
        let id = CourseId::from("course-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"course-1\"");
        let back: CourseId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
