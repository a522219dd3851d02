//! Property schemas for profile types.
//!
//! A schema names the properties a profile type understands. Profiles may
//! still carry keys outside their schema (extensions add their own); the
//! schema only tells consumers which keys are well known.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON type of a schema property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// JSON string
    String,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
}

impl PropertyKind {
    /// Whether a JSON value has this kind
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Number => value.is_number(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Array => value.is_array(),
        }
    }
}

/// Description of a single property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Value type
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    /// Whether the value belongs in secure storage
    #[serde(default)]
    pub secure: bool,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl PropertySchema {
    /// A plaintext property
    pub fn new(kind: PropertyKind, description: &str) -> Self {
        Self {
            kind,
            secure: false,
            description: description.to_string(),
        }
    }

    /// A property kept in secure storage
    pub fn secure(kind: PropertyKind, description: &str) -> Self {
        Self {
            kind,
            secure: true,
            description: description.to_string(),
        }
    }
}

/// Property schema of one profile type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSchema {
    /// Profile type tag
    #[serde(rename = "type")]
    pub profile_type: String,
    /// Properties keyed by name
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ProfileSchema {
    /// Built-in schema for the profile types shipped with the explorer.
    pub fn builtin(profile_type: &str) -> Option<Self> {
        use PropertyKind::*;

        let mut props = BTreeMap::new();
        let mut add = |name: &str, schema: PropertySchema| {
            props.insert(name.to_string(), schema);
        };

        match profile_type {
            "zosmf" => {
                add("host", PropertySchema::new(String, "Host name of the z/OSMF server"));
                add("port", PropertySchema::new(Number, "Port of the z/OSMF server"));
                add("user", PropertySchema::secure(String, "Mainframe user name"));
                add("password", PropertySchema::secure(String, "Mainframe password"));
                add("rejectUnauthorized", PropertySchema::new(Boolean, "Reject self-signed certificates"));
                add("basePath", PropertySchema::new(String, "Base path prefixed to every request"));
                add("protocol", PropertySchema::new(String, "http or https"));
                add("encoding", PropertySchema::new(String, "Default data set encoding"));
                add("responseTimeout", PropertySchema::new(Number, "Seconds to wait for a response"));
                add("tokenType", PropertySchema::new(String, "Type of the authentication token"));
                add("tokenValue", PropertySchema::secure(String, "Authentication token"));
                add("certFile", PropertySchema::new(String, "Client certificate file"));
                add("certKeyFile", PropertySchema::new(String, "Client certificate key file"));
            }
            "zftp" => {
                add("host", PropertySchema::new(String, "Host name of the FTP server"));
                add("port", PropertySchema::new(Number, "Port of the FTP server"));
                add("user", PropertySchema::secure(String, "Mainframe user name"));
                add("password", PropertySchema::secure(String, "Mainframe password"));
                add("secureFtp", PropertySchema::new(Boolean, "Use FTPS"));
                add("rejectUnauthorized", PropertySchema::new(Boolean, "Reject self-signed certificates"));
                add("connectionTimeout", PropertySchema::new(Number, "Milliseconds to wait for a connection"));
                add("tokenType", PropertySchema::new(String, "Type of the authentication token"));
                add("tokenValue", PropertySchema::secure(String, "Authentication token"));
            }
            "ssh" => {
                add("host", PropertySchema::new(String, "Host name of the SSH server"));
                add("port", PropertySchema::new(Number, "Port of the SSH server"));
                add("user", PropertySchema::secure(String, "Mainframe user name"));
                add("password", PropertySchema::secure(String, "Mainframe password"));
                add("privateKey", PropertySchema::new(String, "Path to a private key"));
                add("keyPassphrase", PropertySchema::secure(String, "Passphrase of the private key"));
                add("handshakeTimeout", PropertySchema::new(Number, "Milliseconds to wait for the handshake"));
            }
            "tso" => {
                add("account", PropertySchema::new(String, "TSO account number"));
                add("characterSet", PropertySchema::new(String, "TSO character set"));
                add("codePage", PropertySchema::new(String, "TSO code page"));
                add("columns", PropertySchema::new(Number, "Terminal columns"));
                add("rows", PropertySchema::new(Number, "Terminal rows"));
                add("logonProcedure", PropertySchema::new(String, "Logon procedure"));
                add("regionSize", PropertySchema::new(Number, "Region size"));
            }
            "base" => {
                add("host", PropertySchema::new(String, "Host name shared by service profiles"));
                add("port", PropertySchema::new(Number, "Port shared by service profiles"));
                add("user", PropertySchema::secure(String, "Mainframe user name"));
                add("password", PropertySchema::secure(String, "Mainframe password"));
                add("rejectUnauthorized", PropertySchema::new(Boolean, "Reject self-signed certificates"));
                add("tokenType", PropertySchema::new(String, "Type of the authentication token"));
                add("tokenValue", PropertySchema::secure(String, "Authentication token"));
                add("certFile", PropertySchema::new(String, "Client certificate file"));
                add("certKeyFile", PropertySchema::new(String, "Client certificate key file"));
            }
            _ => return None,
        }

        Some(Self {
            profile_type: profile_type.to_string(),
            properties: props,
        })
    }

    /// Names of all properties in the schema
    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Whether the schema defines the property
    pub fn knows(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}
