use serde::Serialize;
use url::Url;

/// HTTPS port recognized literally in the input
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Parts of a validated service URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlValidation {
    /// Whether the input parsed
    pub valid: bool,
    /// Scheme, without the trailing `:`
    pub protocol: Option<String>,
    /// Host name
    pub host: Option<String>,
    /// Explicit port
    pub port: Option<u16>,
}

impl UrlValidation {
    fn invalid() -> Self {
        Self::default()
    }
}

/// Parse `input` as an absolute URL.
///
/// Never fails: malformed input yields a result with `valid == false` and
/// every part `None`. The default HTTPS port is dropped by URL
/// normalization, so an input that spells out `:443` reports it explicitly.
pub fn validate_and_parse_url(input: &str) -> UrlValidation {
    let Ok(url) = Url::parse(input) else {
        return UrlValidation::invalid();
    };

    let port = if input.contains(":443") {
        Some(DEFAULT_HTTPS_PORT)
    } else {
        url.port()
    };

    UrlValidation {
        valid: true,
        protocol: Some(url.scheme().to_string()),
        host: url.host_str().map(str::to_string),
        port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parsed(protocol: &str, host: &str, port: Option<u16>) -> UrlValidation {
        UrlValidation {
            valid: true,
            protocol: Some(protocol.into()),
            host: Some(host.into()),
            port,
        }
    }

    #[test_case("https://example.com:443" => parsed("https", "example.com", Some(443)); "explicit https port")]
    #[test_case("https://example.com:7554/api" => parsed("https", "example.com", Some(7554)); "gateway port")]
    #[test_case("http://lpar1.example.com:8080" => parsed("http", "lpar1.example.com", Some(8080)); "plain http")]
    #[test_case("https://example.com" => parsed("https", "example.com", None); "no port")]
    #[test_case("HTTPS://Example.COM:1443" => parsed("https", "example.com", Some(1443)); "normalized case")]
    fn valid_urls(input: &str) -> UrlValidation {
        validate_and_parse_url(input)
    }

    #[test_case("not a url"; "words")]
    #[test_case("lpar1/zosmf"; "relative path")]
    #[test_case(""; "empty")]
    #[test_case("https://exa mple.com"; "space in host")]
    #[test_case("https://example.com:99999"; "port out of range")]
    fn invalid_urls(input: &str) {
        let result = validate_and_parse_url(input);
        assert_eq!(
            result,
            UrlValidation {
                valid: false,
                protocol: None,
                host: None,
                port: None
            }
        );
    }
}
