use derive_more::Display;
use thiserror::Error;

/// A store key.
///
/// A sequence of `/`-separated non-empty components. Keys do not start or end with `/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StoreKey(String);

/// A list of [`StoreKey`].
pub type StoreKeys = Vec<StoreKey>;

impl StoreKey {
    /// Create a new store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid.
    pub fn new(key: &str) -> Result<Self, StoreKeyError> {
        if validate_key(key) {
            Ok(Self(key.to_string()))
        } else {
            Err(StoreKeyError(key.to_string()))
        }
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

fn validate_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.ends_with('/')
        && !key.split('/').any(str::is_empty)
}

/// An invalid store key error.
#[derive(Clone, Debug, Error)]
#[error("invalid store key {_0}")]
pub struct StoreKeyError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key_valid() {
        assert!(StoreKey::new("a").is_ok());
        assert!(StoreKey::new("a/b/c.0.0").is_ok());
    }

    #[test]
    fn store_key_invalid() {
        assert!(StoreKey::new("").is_err());
        assert!(StoreKey::new("/a").is_err());
        assert!(StoreKey::new("a/").is_err());
        assert!(StoreKey::new("a//b").is_err());
    }
}
