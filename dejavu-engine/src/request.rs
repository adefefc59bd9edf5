use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Url,
    Body,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpParameter {
    pub kind: ParameterType,
    pub name: String,
    pub value: String,
}

impl HttpParameter {
    pub fn new(kind: ParameterType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The view of an intercepted request that fingerprinting needs.
///
/// Hosts implement this over whatever they store; [`CapturedRequest`] is the
/// owned implementation used by the history sources.
pub trait InspectedRequest {
    fn method(&self) -> &str;
    fn is_secure(&self) -> bool;
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn path_without_query(&self) -> &str;
    fn parameters(&self) -> &[HttpParameter];
    fn body(&self) -> &[u8];
    fn headers(&self) -> &[HttpHeader];

    /// First header whose name matches case-insensitively.
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub id: u64,
    pub method: String,
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub parameters: Vec<HttpParameter>,
    pub headers: Vec<HttpHeader>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// Build a request from a method and an absolute URL.
    ///
    /// Query pairs become [`ParameterType::Url`] parameters. The method and
    /// the path keep the exact text of the input; only scheme, host and port
    /// come from the parsed URL.
    pub fn from_url(method: &str, url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_string();
        let secure = matches!(parsed.scheme(), "https" | "wss");
        let port = parsed
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });

        let parameters = parsed
            .query_pairs()
            .map(|(name, value)| HttpParameter::new(ParameterType::Url, name, value))
            .collect();

        Ok(Self {
            id: 0,
            method: method.to_string(),
            secure,
            host,
            port,
            path: raw_path(url).to_string(),
            parameters,
            headers: Vec::new(),
            body: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Append a header. A `Cookie` header also yields cookie parameters and a
    /// `Content-Type` change re-derives body parameters.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let header = HttpHeader::new(name, value);
        if header.name.eq_ignore_ascii_case("cookie") {
            self.parameters.extend(parse_cookie_header(&header.value));
        }
        let is_content_type = header.name.eq_ignore_ascii_case("content-type");
        self.headers.push(header);
        if is_content_type {
            self.derive_body_params();
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.derive_body_params();
        self
    }

    pub fn with_parameter(mut self, parameter: HttpParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }

    fn derive_body_params(&mut self) {
        self.parameters.retain(|p| p.kind != ParameterType::Body);

        let form_encoded = self
            .header_value("Content-Type")
            .map(|ct| ct.contains("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if !form_encoded {
            return;
        }

        let params: Vec<HttpParameter> = form_urlencoded::parse(&self.body)
            .map(|(name, value)| HttpParameter::new(ParameterType::Body, name, value))
            .collect();
        self.parameters.extend(params);
    }
}

/// Path of an absolute URL as written, without query or fragment.
fn raw_path(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority_end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let rest = &after_scheme[authority_end..];
    let path = &rest[..rest.find(['?', '#']).unwrap_or(rest.len())];
    if path.is_empty() { "/" } else { path }
}

fn parse_cookie_header(value: &str) -> Vec<HttpParameter> {
    value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => HttpParameter::new(ParameterType::Cookie, name.trim(), value.trim()),
            None => HttpParameter::new(ParameterType::Cookie, pair, ""),
        })
        .collect()
}

impl InspectedRequest for CapturedRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn path_without_query(&self) -> &str {
        &self.path
    }

    fn parameters(&self) -> &[HttpParameter] {
        &self.parameters
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn headers(&self) -> &[HttpHeader] {
        &self.headers
    }
}
