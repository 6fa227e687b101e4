//! Expand/flatten helpers shared by every resource
//!
//! Models hold plain values where the zero value means "not set". Remote properties hold
//! `Option`s where `None` means "leave it to the server". These helpers convert between
//! the two so that the conversion is identical in every resource:
//!
//! - zero scalars, empty lists and empty maps expand to `None`;
//! - singleton blocks are lists of at most one element, `[]` ⇔ `None`;
//! - absent remote maps flatten to an empty map;
//! - enums flatten to their string form, `None` to `""`.

use std::collections::HashMap;

/// Values that have a "not set" zero value.
pub trait ZeroValue {
    fn is_zero_value(&self) -> bool;
}

impl ZeroValue for String {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl ZeroValue for bool {
    fn is_zero_value(&self) -> bool {
        !*self
    }
}

impl ZeroValue for i64 {
    fn is_zero_value(&self) -> bool {
        *self == 0
    }
}

impl ZeroValue for f64 {
    fn is_zero_value(&self) -> bool {
        *self == 0.0
    }
}

impl<T> ZeroValue for Vec<T> {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> ZeroValue for HashMap<K, V> {
    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }
}

/// `None` for the zero value, a copy otherwise.
pub fn optional<T: ZeroValue + Clone>(value: &T) -> Option<T> {
    if value.is_zero_value() {
        None
    } else {
        Some(value.clone())
    }
}

/// The value, or its zero value when unset.
pub fn from_optional<T: Default>(value: Option<T>) -> T {
    value.unwrap_or_default()
}

/// Expands a singleton block. An empty list yields `None`, never an empty object.
pub fn expand_singleton<T, U>(input: &[T], expand: impl FnOnce(&T) -> U) -> Option<U> {
    input.first().map(expand)
}

pub fn try_expand_singleton<T, U, E>(
    input: &[T],
    expand: impl FnOnce(&T) -> Result<U, E>,
) -> Result<Option<U>, E> {
    input.first().map(expand).transpose()
}

/// Flattens an optional remote object into a singleton block.
pub fn flatten_singleton<T, U>(input: Option<T>, flatten: impl FnOnce(T) -> U) -> Vec<U> {
    input.map(flatten).into_iter().collect()
}

/// Flattens an optional remote map. Absent maps become empty maps.
pub fn flatten_map<V>(input: Option<HashMap<String, V>>) -> HashMap<String, V> {
    input.unwrap_or_default()
}

/// Expands a string into a remote enum. An empty string is "not set".
pub fn expand_enum<E: From<String>>(value: &str) -> Option<E> {
    if value.is_empty() {
        None
    } else {
        Some(E::from(value.to_string()))
    }
}

/// Flattens an optional remote enum to its string form, `""` when absent.
pub fn flatten_enum<E: AsRef<str>>(value: Option<&E>) -> String {
    value.map(|v| v.as_ref().to_string()).unwrap_or_default()
}

/// Declares a string enum of a remote API.
///
/// Known values parse case-insensitively to their variant; anything else is kept
/// verbatim in `Other` so values newer than this crate survive a read unchanged.
/// Serialises as the canonical string.
///
/// ```ignore
/// string_enum! {
///     pub enum ClientType {
///         Dotnet => "dotnet",
///         Java => "java",
///     }
/// }
/// ```
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $value,)+
                    $name::Other(value) => value.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $(
                    if value.eq_ignore_ascii_case($value) {
                        return $name::$variant;
                    }
                )+
                $name::Other(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S: $crate::__serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D: $crate::__serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = <String as $crate::__serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from(value))
            }
        }
    };
}
