//! Base-profile token inheritance.
//!
//! A service profile that shares a `base` profile inherits its token. The
//! token is only valid for the endpoint it was minted for, so a service
//! pointing elsewhere loses it.

use tracing::debug;

use crate::profile::MergedProfile;
use crate::property::{ProfileProperty, PropertyBag};

/// Token type issued by the API mediation layer gateway
pub const TOKEN_TYPE_APIML: &str = "apimlAuthenticationToken";

/// Decides whether a service profile keeps the token it shares with the
/// base profile.
#[derive(Debug, Clone)]
pub struct TokenInheritancePolicy {
    gateway_token_type: String,
}

impl Default for TokenInheritancePolicy {
    fn default() -> Self {
        Self::new(TOKEN_TYPE_APIML)
    }
}

impl TokenInheritancePolicy {
    /// Policy stripping tokens of `gateway_token_type`
    pub fn new(gateway_token_type: impl Into<String>) -> Self {
        Self {
            gateway_token_type: gateway_token_type.into(),
        }
    }

    /// Token type this policy applies to
    pub fn gateway_token_type(&self) -> &str {
        &self.gateway_token_type
    }

    /// Whether `service` must drop its token given `base`.
    ///
    /// True only when both profiles have a host and a port, the addresses
    /// differ, and the service token is a gateway token.
    pub fn should_strip(&self, service: &PropertyBag, base: &PropertyBag) -> bool {
        let (Some(service_host), Some(service_port)) = (service.host(), service.port()) else {
            return false;
        };
        let (Some(base_host), Some(base_port)) = (base.host(), base.port()) else {
            return false;
        };

        let diverges = service_host != base_host || service_port != base_port;
        diverges && service.token_type() == Some(self.gateway_token_type.as_str())
    }

    /// Return the adjusted copy of `service`, or `None` if it keeps its token.
    ///
    /// Base profiles and profiles without a base are never adjusted.
    pub fn apply(&self, service: &MergedProfile, base: Option<&MergedProfile>) -> Option<MergedProfile> {
        let base = base?;
        if service.is_base() || !self.should_strip(&service.properties, &base.properties) {
            return None;
        }

        debug!(
            "Clearing inherited token of {} profile {}: endpoint differs from base profile {}",
            service.profile_type, service.name, base.name
        );
        let mut adjusted = service.clone();
        adjusted.properties.remove(ProfileProperty::TokenType);
        adjusted.properties.remove(ProfileProperty::TokenValue);
        Some(adjusted)
    }

    /// Apply the policy in place; returns whether the profile changed.
    pub fn enforce(&self, service: &mut MergedProfile, base: Option<&MergedProfile>) -> bool {
        match self.apply(service, base) {
            Some(adjusted) => {
                *service = adjusted;
                true
            }
            None => false,
        }
    }
}
