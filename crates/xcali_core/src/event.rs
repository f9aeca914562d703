use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::cookie::COOKIE_HEADER;

/// Header map exactly as delivered by the platform; keys are case-sensitive.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event must be a JSON object")]
    NotAnObject,

    #[error("event property '{0}' is missing")]
    MissingField(&'static str),

    #[error("event property '{field}' must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("cookie '{0}' has no value")]
    MalformedCookie(String),
}

impl EventError {
    fn invalid(field: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub path: String,
    pub http_method: String,
    pub headers: Headers,
    query_parameters: Value,
    path_parameters: Value,
    body: Value,
}

impl InboundEvent {
    pub fn from_value(event: Value) -> Result<Self, EventError> {
        let Value::Object(mut object) = event else {
            return Err(EventError::NotAnObject);
        };

        let path = required_string(&object, "path")?;
        let http_method = required_string(&object, "httpMethod")?;

        let headers = match object.remove("headers") {
            Some(Value::Object(entries)) => string_headers(entries)?,
            Some(Value::Null) | None => return Err(EventError::MissingField("headers")),
            Some(_) => return Err(EventError::invalid("headers", "an object")),
        };

        let query_parameters = object
            .remove("queryStringParameters")
            .unwrap_or(Value::Null);
        let path_parameters = object.remove("pathParameters").unwrap_or(Value::Null);
        let body = object.remove("body").unwrap_or(Value::Null);

        Ok(Self {
            path,
            http_method,
            headers,
            query_parameters,
            path_parameters,
            body,
        })
    }

    /// Looks up a query-string parameter; a present but non-string value is an error.
    pub fn query_param(&self, name: &str) -> Result<Option<&str>, EventError> {
        string_param(&self.query_parameters, "queryStringParameters", name)
    }

    pub fn path_param(&self, name: &str) -> Result<Option<&str>, EventError> {
        string_param(&self.path_parameters, "pathParameters", name)
    }

    /// The raw body, when it was delivered as a string.
    pub fn body_text(&self) -> Result<Option<&str>, EventError> {
        match &self.body {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            _ => Err(EventError::invalid("body", "a string")),
        }
    }
}

fn required_string(object: &Map<String, Value>, field: &'static str) -> Result<String, EventError> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(EventError::MissingField(field)),
        Some(_) => Err(EventError::invalid(field, "a string")),
    }
}

/// Keeps string-valued headers. Only `Cookie` must be a string when present;
/// other non-string values are dropped.
fn string_headers(entries: Map<String, Value>) -> Result<Headers, EventError> {
    let mut headers = Headers::new();
    for (name, value) in entries {
        match value {
            Value::String(text) => {
                headers.insert(name, text);
            }
            Value::Null => {}
            _ if name == COOKIE_HEADER => {
                return Err(EventError::invalid(format!("headers.{name}"), "a string"));
            }
            _ => {}
        }
    }
    Ok(headers)
}

fn string_param<'a>(
    parameters: &'a Value,
    group: &'static str,
    name: &str,
) -> Result<Option<&'a str>, EventError> {
    let parameters = match parameters {
        Value::Object(entries) => entries,
        Value::Null => return Ok(None),
        _ => return Err(EventError::invalid(group, "an object")),
    };
    match parameters.get(name) {
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(EventError::invalid(format!("{group}.{name}"), "a string")),
    }
}
