//! Result carrier of the safe API surface.

use std::fmt;

use crate::void::Void;

/// Either a value or the [`Void`] sentinel.
///
/// Safe operations return this instead of an error. Void is falsy: see
/// [`OrVoid::is_truthy`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrVoid<T> {
    Value(T),
    Void(&'static Void),
}

impl<T> OrVoid<T> {
    /// The sentinel arm.
    #[must_use]
    pub fn void() -> Self {
        Self::Void(Void::instance())
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void(_))
    }

    /// Boolean reading of the result: Void is false, any value is true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !self.is_void()
    }

    /// Converts into an `Option`, dropping the sentinel.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Void(_) => None,
        }
    }

    pub fn as_ref(&self) -> OrVoid<&T> {
        match self {
            Self::Value(v) => OrVoid::Value(v),
            Self::Void(void) => OrVoid::Void(void),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OrVoid<U> {
        match self {
            Self::Value(v) => OrVoid::Value(f(v)),
            Self::Void(void) => OrVoid::Void(void),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.value().unwrap_or(default)
    }

    /// The sentinel reference, if this is the Void arm.
    #[must_use]
    pub fn as_void(&self) -> Option<&'static Void> {
        match self {
            Self::Value(_) => None,
            Self::Void(void) => Some(void),
        }
    }
}

impl<T> From<OrVoid<T>> for Option<T> {
    fn from(result: OrVoid<T>) -> Self {
        result.value()
    }
}

impl<T> From<Option<T>> for OrVoid<T> {
    fn from(option: Option<T>) -> Self {
        option.map_or_else(Self::void, Self::Value)
    }
}

impl<T: fmt::Display> fmt::Display for OrVoid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => fmt::Display::fmt(v, f),
            Self::Void(void) => fmt::Display::fmt(void, f),
        }
    }
}
