//! Merged profile properties.
//!
//! A [`PropertyBag`] holds exactly the properties some layer defines. Absent
//! keys are unknown; nothing is defaulted or null-filled. Well-known keys have
//! typed accessors, extension keys go through [`PropertyBag::get`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Properties with a fixed meaning across profile types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileProperty {
    /// Host name of the service
    Host,
    /// TCP port
    Port,
    /// User name
    User,
    /// Password
    Password,
    /// Authentication token type
    TokenType,
    /// Authentication token value
    TokenValue,
    /// Whether to reject untrusted TLS certificates
    RejectUnauthorized,
    /// Base path prefixed to API requests
    BasePath,
    /// `http` or `https`
    Protocol,
}

impl ProfileProperty {
    /// Every well-known property
    pub const ALL: [ProfileProperty; 9] = [
        ProfileProperty::Host,
        ProfileProperty::Port,
        ProfileProperty::User,
        ProfileProperty::Password,
        ProfileProperty::TokenType,
        ProfileProperty::TokenValue,
        ProfileProperty::RejectUnauthorized,
        ProfileProperty::BasePath,
        ProfileProperty::Protocol,
    ];

    /// The well-known property stored under `key`
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Key used in the configuration files
    pub fn key(self) -> &'static str {
        match self {
            ProfileProperty::Host => "host",
            ProfileProperty::Port => "port",
            ProfileProperty::User => "user",
            ProfileProperty::Password => "password",
            ProfileProperty::TokenType => "tokenType",
            ProfileProperty::TokenValue => "tokenValue",
            ProfileProperty::RejectUnauthorized => "rejectUnauthorized",
            ProfileProperty::BasePath => "basePath",
            ProfileProperty::Protocol => "protocol",
        }
    }

    /// Whether the property holds a secret
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            ProfileProperty::User | ProfileProperty::Password | ProfileProperty::TokenValue
        )
    }
}

impl AsRef<str> for ProfileProperty {
    fn as_ref(&self) -> &str {
        self.key()
    }
}

impl fmt::Display for ProfileProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Key → value map of merged profile properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(BTreeMap<String, Value>);

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some layer defines the property
    pub fn is_known(&self, key: impl AsRef<str>) -> bool {
        self.0.contains_key(key.as_ref())
    }

    /// Raw value of a property
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.0.get(key.as_ref())
    }

    /// Set a property. `Null` values are not stored.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if value.is_null() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.0.remove(key.as_ref())
    }

    /// Number of known properties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no property is known
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over known properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of the known properties
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// String value of a property
    pub fn get_str(&self, key: impl AsRef<str>) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Boolean value of a property
    pub fn get_bool(&self, key: impl AsRef<str>) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Host name
    pub fn host(&self) -> Option<&str> {
        self.get_str(ProfileProperty::Host)
    }

    /// Port; numeric strings such as `"443"` are accepted
    pub fn port(&self) -> Option<u16> {
        match self.get(ProfileProperty::Port)? {
            Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// User name
    pub fn user(&self) -> Option<&str> {
        self.get_str(ProfileProperty::User)
    }

    /// Password
    pub fn password(&self) -> Option<&str> {
        self.get_str(ProfileProperty::Password)
    }

    /// Token type
    pub fn token_type(&self) -> Option<&str> {
        self.get_str(ProfileProperty::TokenType)
    }

    /// Token value
    pub fn token_value(&self) -> Option<&str> {
        self.get_str(ProfileProperty::TokenValue)
    }

    /// Whether untrusted certificates are rejected
    pub fn reject_unauthorized(&self) -> Option<bool> {
        self.get_bool(ProfileProperty::RejectUnauthorized)
    }

    /// Base path
    pub fn base_path(&self) -> Option<&str> {
        self.get_str(ProfileProperty::BasePath)
    }

    /// Protocol
    pub fn protocol(&self) -> Option<&str> {
        self.get_str(ProfileProperty::Protocol)
    }
}

impl FromIterator<(String, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

impl From<serde_json::Map<String, Value>> for PropertyBag {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}
