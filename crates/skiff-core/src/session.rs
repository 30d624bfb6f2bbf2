//! Session and target domain types.
//!
//! A session is one logical terminal tab bound to a target (a local shell or
//! a remote host). Session metadata is immutable after creation; the live
//! connection status is owned by the connection state machine in
//! `skiff-application` and has exactly one writer per session.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Unique identifier for a session. Generated at creation, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An opaque secret value (password or key passphrase).
///
/// Renders as `***` in `Debug` and `Display` so it can never leak through
/// logging. The raw value is only reachable via [`Secret::expose`], which the
/// connection state machine uses to forward it to the transport collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret. Callers must not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Secrets cross the host-runtime command boundary as plain strings; the
// redaction above only applies to formatting, not to the wire.
impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

/// Which kind of secret a stored credential holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoredAuthKind {
    #[default]
    Password,
    Key,
}

/// Authentication for a remote target.
///
/// Either an inline secret or a reference to a credential held by the vault
/// collaborator. Secrets are forwarded opaquely to the transport and never
/// inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum AuthMethod {
    Password {
        secret: Secret,
    },
    Key {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        passphrase: Option<Secret>,
    },
    /// Reference to a credential stored behind the vault boundary.
    #[serde(rename_all = "camelCase")]
    Stored {
        credential_id: String,
        kind: StoredAuthKind,
    },
}

/// A remote connection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,
}

/// A connection endpoint: the local shell, or a remote host tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Target {
    Local,
    Remote(RemoteTarget),
}

impl Target {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Short human-readable description, safe to log.
    pub fn describe(&self) -> String {
        match self {
            Self::Local => "local shell".to_string(),
            Self::Remote(remote) => {
                format!("{}@{}:{}", remote.username, remote.host, remote.port)
            }
        }
    }
}

/// Accent color for a tab. Plain data; rendering is the host runtime's job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorTag {
    #[default]
    Slate,
    Ocean,
    Moss,
    Amber,
    Rose,
    Violet,
}

/// Connection lifecycle status of a session.
///
/// `Disconnected` is initial. `Error` is terminal: there is no automatic
/// transition out of it, recovery means opening a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Immutable metadata for one terminal tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub target: Target,
    pub label: String,
    pub color: ColorTag,
    pub created_at: String,
}

impl Session {
    /// Creates session metadata with a fresh id and creation timestamp.
    pub fn new(target: Target, label: impl Into<String>, color: ColorTag) -> Self {
        Self {
            id: SessionId::generate(),
            target,
            label: label.into(),
            color,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
