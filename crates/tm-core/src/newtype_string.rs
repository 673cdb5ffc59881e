//! Macro for defining strongly-typed identifier newtypes.
//!
//! Table, field and index names all share one invariant (non-empty) and the
//! same trait surface, so they are generated from a single macro.

/// Define a strongly-typed, non-empty identifier newtype.
///
/// Generates the struct plus `new()` (panics on empty), `try_new()`,
/// `as_str()`, `into_inner()`, `Display`, `AsRef<str>`, `Deref<Target=str>`,
/// `Borrow<str>` (so maps keyed by the newtype can be queried with `&str`),
/// `TryFrom<&str>`, `PartialEq<str>`/`PartialEq<&str>` and a `Deserialize`
/// impl that rejects empty strings.
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " must not be empty"))
                })
            }
        }

        impl $Name {
            /// Create a new identifier, panicking if it is empty.
            ///
            /// Prefer [`try_new`](Self::try_new) for names read from files.
            pub fn new(name: impl Into<String>) -> Self {
                let s = name.into();
                assert!(!s.is_empty(), concat!(stringify!($Name), " must not be empty"));
                Self(s)
            }

            /// Create a new identifier, returning `None` if it is empty.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let s = name.into();
                if s.is_empty() { None } else { Some(Self(s)) }
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl TryFrom<&str> for $Name {
            type Error = &'static str;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                $Name::try_new(s).ok_or(concat!(stringify!($Name), " must not be empty"))
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool { self.0 == other }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }
    };
}

pub(crate) use define_identifier;
