//! Stream trigger
//!
//! Turns a `{method, path, params | body}` intent into exactly one request and
//! hands back the transport's response untouched. GET intents carry their
//! params as a query string, POST intents carry their body verbatim.
//! Reading the (streamed) body is the caller's business.

mod http;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use http::{byte_stream, HttpTransport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown method: {0} (expected GET or POST)")]
pub struct ParseMethodError(String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// Scalar query parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            ParamValue::Float(x) => write_js_number(f, *x),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Number formatting as JavaScript's `String(n)` does it: plain decimals for
/// magnitudes in `[1e-6, 1e21)`, exponent form with an explicit sign outside
fn write_js_number(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x == 0.0 {
        // Covers -0 as well
        return f.write_str("0");
    }
    let magnitude = x.abs();
    if x.is_nan() || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{x}");
    }
    let exp = format!("{x:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{mantissa}e+{power}"),
        _ => f.write_str(&exp),
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// Ordered query parameters; `None` values are dropped on serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, Option<ParamValue>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing an existing key in place
    pub fn set(&mut self, key: impl Into<String>, value: Option<ParamValue>) -> &mut Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, Some(value.into()));
        self
    }

    pub fn with_opt<V: Into<ParamValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.set(key, value.map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `application/x-www-form-urlencoded` string without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            if let Some(value) = value {
                serializer.append_pair(key, &value.to_string());
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<ParamValue>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<ParamValue>)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// `path` plus `?query` when any parameter survives filtering
pub fn build_url(path: &str, params: Option<&QueryParams>) -> String {
    let query = params.map(QueryParams::to_query_string).unwrap_or_default();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// What to request. Only `params` matters for GET and only `body` for POST.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerIntent<B = serde_json::Value> {
    pub method: Method,
    pub path: String,
    pub params: Option<QueryParams>,
    pub body: Option<B>,
}

impl<B> TriggerIntent<B> {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: None,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: B) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            params: None,
            body: Some(body),
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// The URL actually requested
    pub fn url(&self) -> String {
        match self.method {
            Method::Get => build_url(&self.path, self.params.as_ref()),
            Method::Post => self.path.clone(),
        }
    }
}

/// Request transport (`get` / `post`) returning a readable response
#[async_trait]
pub trait Transport: Send + Sync {
    type Response: Send;
    type Error: Send;

    async fn get(&self, url: &str) -> Result<Self::Response, Self::Error>;

    async fn post<B>(&self, url: &str, body: Option<&B>) -> Result<Self::Response, Self::Error>
    where
        B: Serialize + Send + Sync;
}

/// Issues one request per call; no retries, errors pass through unchanged
#[derive(Debug, Clone)]
pub struct StreamTrigger<T> {
    transport: T,
}

impl<T: Transport> StreamTrigger<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn trigger<B>(&self, intent: &TriggerIntent<B>) -> Result<T::Response, T::Error>
    where
        B: Serialize + Send + Sync,
    {
        let url = intent.url();
        debug!(method = %intent.method, url = %url, "Triggering stream");
        match intent.method {
            Method::Get => self.transport.get(&url).await,
            Method::Post => self.transport.post(&url, intent.body.as_ref()).await,
        }
    }
}
