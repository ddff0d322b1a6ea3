//! Domain types for the provisioner.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for local paths.
//! Remote paths are plain strings since they are only ever spliced into
//! shell text.

use std::fmt;
use std::path::PathBuf;

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of one provisioner instance. Every derived resource name
/// (playbook file, init/run steps, role copies) is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvisionId(pub String);

impl ProvisionId {
    /// `<id>.yml`: playbook file name under the remote path.
    pub fn playbook_file(&self) -> String {
        format!("{}.yml", self.0)
    }

    /// `<id>-init`
    pub fn init_step(&self) -> String {
        format!("{}-init", self.0)
    }

    /// `<id>-run`
    pub fn run_step(&self) -> String {
        format!("{}-run", self.0)
    }

    /// `<id>-roles-copy-<index>`, index being the position in the role path list.
    pub fn role_copy(&self, index: usize) -> String {
        format!("{}-roles-copy-{index}", self.0)
    }
}

impl fmt::Display for ProvisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProvisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProvisionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Secrecy
// ---------------------------------------------------------------------------

/// Whether a value may appear in plain form in non-secret state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Secrecy {
    #[default]
    Public,
    Secret,
    /// Secrecy could not be determined. Treated exactly like `Secret`.
    Unknown,
}

impl Secrecy {
    /// Only a value positively known to be public may be surfaced raw.
    pub fn is_public(self) -> bool {
        matches!(self, Secrecy::Public)
    }

    /// Secrecy of a value derived from two inputs.
    pub fn join(self, other: Secrecy) -> Secrecy {
        match (self, other) {
            (Secrecy::Secret, _) | (_, Secrecy::Secret) => Secrecy::Secret,
            (Secrecy::Unknown, _) | (_, Secrecy::Unknown) => Secrecy::Unknown,
            _ => Secrecy::Public,
        }
    }
}

/// A value paired with its secrecy.
///
/// Has no `Serialize` impl, and `Debug` never prints a non-public value.
/// Callers go through [`Sensitive::expose`] or [`Sensitive::public_value`].
#[derive(Clone, PartialEq)]
pub struct Sensitive<T> {
    value: T,
    secrecy: Secrecy,
}

impl<T> Sensitive<T> {
    pub fn new(value: T, secrecy: Secrecy) -> Self {
        Self { value, secrecy }
    }

    pub fn public(value: T) -> Self {
        Self::new(value, Secrecy::Public)
    }

    pub fn secret(value: T) -> Self {
        Self::new(value, Secrecy::Secret)
    }

    pub fn secrecy(&self) -> Secrecy {
        self.secrecy
    }

    /// `true` unless the value is known to be public.
    pub fn is_redacted(&self) -> bool {
        !self.secrecy.is_public()
    }

    /// The raw value, regardless of secrecy.
    pub fn expose(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    /// The raw value only when it is known to be public.
    pub fn public_value(&self) -> Option<&T> {
        if self.secrecy.is_public() {
            Some(&self.value)
        } else {
            None
        }
    }

    /// Transform the value; secrecy carries over.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sensitive<U> {
        Sensitive::new(f(self.value), self.secrecy)
    }

    pub fn as_ref(&self) -> Sensitive<&T> {
        Sensitive::new(&self.value, self.secrecy)
    }
}

impl<T: fmt::Debug> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.public_value() {
            Some(value) => f.debug_tuple("Sensitive").field(value).finish(),
            None => f.write_str("Sensitive(<redacted>)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// One opaque token of a trigger fingerprint.
///
/// String-valued documents always collapse into [`Trigger::Token`] (see
/// [`Trigger::from_value`]) so that a sequence reloaded from disk compares
/// equal to a freshly composed one.
///
/// Tokens serialize as plain strings. Documents serialize as
/// `{"yaml": "<text>"}` so tags (`!vault`) and non-string mapping keys
/// survive a trip through JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Token(String),
    Value(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TriggerRepr {
    Token(String),
    Document { yaml: String },
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Trigger::Token(token) => serializer.serialize_str(token),
            Trigger::Value(value) => {
                let yaml = serde_yaml::to_string(value).map_err(ser::Error::custom)?;
                TriggerRepr::Document { yaml }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TriggerRepr::deserialize(deserializer)? {
            TriggerRepr::Token(token) => Ok(Trigger::Token(token)),
            TriggerRepr::Document { yaml } => serde_yaml::from_str(&yaml)
                .map(Trigger::from_value)
                .map_err(de::Error::custom),
        }
    }
}

impl Trigger {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Trigger::Token(s),
            other => Trigger::Value(other),
        }
    }
}

impl From<String> for Trigger {
    fn from(s: String) -> Self {
        Trigger::Token(s)
    }
}

impl From<&str> for Trigger {
    fn from(s: &str) -> Self {
        Trigger::Token(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Playbook document
// ---------------------------------------------------------------------------

/// A role entry of a play: `role` plus any per-role keys (`vars`, `tags`,
/// `when`, ...). Kept as an ordered mapping since the tool accepts
/// open-ended keys here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub Mapping);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        let mut map = Mapping::new();
        map.insert(Value::from("role"), Value::from(name.into()));
        Self(map)
    }

    pub fn with_vars(self, vars: Mapping) -> Self {
        self.with("vars", Value::Mapping(vars))
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.0.insert(Value::from(key), value);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }
}

/// The single play of a provisioner playbook.
///
/// Field order is the serialized order. Optional sections are omitted, not
/// emitted as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub hosts: String,
    pub connection: String,
    #[serde(rename = "become")]
    pub r#become: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Mapping>,
}

/// Top-level document: always a list holding exactly one [`Play`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playbook(pub Vec<Play>);

// ---------------------------------------------------------------------------
// Role files and copies
// ---------------------------------------------------------------------------

/// Kind of a collected role entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFileKind {
    File,
    Symlink,
}

/// One file found under a role directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleFile {
    /// Path relative to the parent of the role root, `/`-separated.
    pub key: String,
    /// Absolute location on the local machine.
    pub source: PathBuf,
    pub kind: RoleFileKind,
}

/// A role directory to be pushed to the remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCopy {
    /// `<id>-roles-copy-<index>`
    pub resource_id: String,
    pub role_path: PathBuf,
    /// Directory hash of the whole role subtree.
    pub hash: String,
}

impl RoleCopy {
    /// Trigger sequence declared on the copy itself; re-sync on hash change.
    pub fn triggers(&self) -> Vec<Trigger> {
        vec![Trigger::Token(self.hash.clone())]
    }

    /// `<resource_id>:<hash>` as contributed to the run step fingerprint.
    pub fn token(&self) -> String {
        format!("{}:{}", self.resource_id, self.hash)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
