//! Identity types for todo-sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix that marks a device-local id.
pub const LOCAL_ID_PREFIX: &str = "local:";

/// Length of the random suffix in a local id.
const LOCAL_ID_RANDOM_LEN: usize = 6;

/// Identifier of a todo item.
///
/// Either a server id (opaque, assigned by the remote store) or a local id
/// generated on this device while the item has not reached the remote yet.
/// Local ids look like `local:<unix-millis>:<random>`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wrap an id handed out by the remote store.
    pub fn server(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh local id.
    ///
    /// The timestamp plus a random UUID fragment keeps ids unique per device.
    pub fn new_local() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}:{}",
            LOCAL_ID_PREFIX,
            now_millis(),
            &random[..LOCAL_ID_RANDOM_LEN]
        ))
    }

    /// True when this id was generated locally and has no server counterpart yet.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TodoId({})", self.0)
    }
}

/// Current wall-clock time in unix milliseconds.
///
/// Returns 0 if the system clock is before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
