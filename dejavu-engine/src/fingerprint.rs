//! Canonical comparison keys for intercepted requests.
//!
//! A fingerprint has three space-separated parts:
//!
//! ```text
//! <METHOD> <scheme>://<host>:<port><path> <token>&<token>&...
//! ```
//!
//! Tokens are `<facet>:<name>` or `<facet>:<name>=<value>` and are sorted
//! ordinally before joining, so parameter order never matters. The token
//! part may be empty.

use crate::config::ComparisonConfig;
use crate::request::{InspectedRequest, ParameterType};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Quoted string preceded by `{` or `,` and followed by `:`.
///
/// A textual scan, not a parse: it tolerates malformed JSON and picks up keys
/// wherever that shape appears in the body. Whitespace is ASCII only, and an
/// escape never swallows a line terminator (`\r`, `\n`, NEL, LS, PS).
static JSON_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[{,](?-u:\s)*"((?:[^"\\]|\\[^\n\r\x{85}\x{2028}\x{2029}])*)"(?-u:\s)*:"#)
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token prefixes, one per comparison dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facet {
    QueryName,
    QueryValue,
    BodyName,
    BodyValue,
    CookieName,
    CookieValue,
    JsonKey,
    HeaderName,
    HeaderValue,
}

impl Facet {
    fn prefix(&self) -> &'static str {
        match self {
            Facet::QueryName => "GN",
            Facet::QueryValue => "GV",
            Facet::BodyName => "PN",
            Facet::BodyValue => "PV",
            Facet::CookieName => "CN",
            Facet::CookieValue => "CV",
            Facet::JsonKey => "J",
            Facet::HeaderName => "HN",
            Facet::HeaderValue => "HV",
        }
    }

    fn name_token(&self, name: &str) -> String {
        format!("{}:{}", self.prefix(), name)
    }

    fn value_token(&self, name: &str, value: &str) -> String {
        format!("{}:{}={}", self.prefix(), name, value)
    }

    /// Name/value facets and their enabling flags for a parameter type.
    fn for_parameter(kind: ParameterType, config: &ComparisonConfig) -> [(Facet, bool); 2] {
        match kind {
            ParameterType::Url => [
                (Facet::QueryName, config.use_query_param_names),
                (Facet::QueryValue, config.use_query_param_values),
            ],
            ParameterType::Body => [
                (Facet::BodyName, config.use_body_param_names),
                (Facet::BodyValue, config.use_body_param_values),
            ],
            ParameterType::Cookie => [
                (Facet::CookieName, config.use_cookie_names),
                (Facet::CookieValue, config.use_cookie_values),
            ],
        }
    }
}

/// `scheme://host:port` followed by the path, query removed.
pub fn origin_and_path<R: InspectedRequest + ?Sized>(request: &R) -> String {
    let scheme = if request.is_secure() { "https" } else { "http" };
    format!(
        "{}://{}:{}{}",
        scheme,
        request.host().to_lowercase(),
        request.port(),
        request.path_without_query()
    )
}

/// Quoted object keys in `body`, nested ones included, in order of appearance.
/// Duplicates are kept.
pub fn scrape_json_keys(body: &str) -> Vec<String> {
    JSON_KEY_PATTERN
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Build the comparison key for `request` under `config`.
///
/// Pure and infallible: missing headers, empty parameter lists and bodies
/// that are not UTF-8 simply contribute fewer tokens.
pub fn build_key<R: InspectedRequest + ?Sized>(request: &R, config: &ComparisonConfig) -> Fingerprint {
    let mut tokens: Vec<String> = Vec::new();

    for kind in [ParameterType::Url, ParameterType::Body, ParameterType::Cookie] {
        let [(name_facet, use_names), (value_facet, use_values)] = Facet::for_parameter(kind, config);
        for param in request.parameters().iter().filter(|p| p.kind == kind) {
            if use_names {
                tokens.push(name_facet.name_token(&param.name));
            }
            if use_values {
                tokens.push(value_facet.value_token(&param.name, &param.value));
            }
        }
    }

    if config.use_json_keys
        && let Some(content_type) = request.header_value("Content-Type")
        && content_type.contains("application/json")
    {
        let body = String::from_utf8_lossy(request.body());
        tokens.extend(
            scrape_json_keys(&body)
                .iter()
                .map(|key| Facet::JsonKey.name_token(key)),
        );
    }

    if config.use_header_names || config.use_header_values {
        for header in request.headers() {
            let name = header.name.to_lowercase();
            // cookies already went through the parameter path
            if name == "cookie" {
                continue;
            }
            if config.use_header_names {
                tokens.push(Facet::HeaderName.name_token(&name));
            }
            if config.use_header_values {
                tokens.push(Facet::HeaderValue.value_token(&name, &header.value));
            }
        }
    }

    tokens.sort_unstable();

    Fingerprint(format!(
        "{} {} {}",
        request.method(),
        origin_and_path(request),
        tokens.join("&")
    ))
}
