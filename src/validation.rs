//! Turns raw request bodies into typed, partially populated field sets.
//!
//! A schema is a plain struct whose fields are all `Option`s, so a missing key
//! deserializes to `None` instead of failing. Type conformance is left to
//! serde, presence and length to `validator`. Fields are checked one at a
//! time in the order the schema declares and only the first failure is
//! reported.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// First failure found while validating a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[error("{msg} ({})", .loc.join("."))]
pub struct ValidationError {
    /// Path of the offending field, e.g. `["title"]`.
    pub loc: Vec<String>,
    /// Human readable description.
    pub msg: String,
    /// Machine readable category, e.g. `value_error.missing`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationError {
    pub fn new(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: vec![field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ "loc": self.loc, "msg": self.msg, "type": self.kind })
    }
}

/// A creation payload that can be validated.
pub trait Schema: DeserializeOwned + Validate {
    /// Declared field names, in the order they are checked.
    const FIELDS: &'static [&'static str];
}

/// Validates a decoded JSON payload against `S`.
///
/// Unknown keys are ignored. Optional keys that are absent stay `None`.
pub fn validate<S: Schema>(raw: Value) -> Result<S, ValidationError> {
    let Some(fields) = raw.as_object() else {
        return Err(ValidationError::new(
            "body",
            "value is not a valid dict",
            "type_error.dict",
        ));
    };

    // Mistyped values are set aside so the rest can still be checked for
    // presence and length.
    let mut conforming = fields.clone();
    let mut type_errors = HashMap::new();
    for name in S::FIELDS {
        let Some(value) = fields.get(*name) else {
            continue;
        };
        let single: Map<String, Value> = [(name.to_string(), value.clone())].into_iter().collect();
        if let Err(err) = S::deserialize(Value::Object(single)) {
            conforming.remove(*name);
            type_errors.insert(*name, err.to_string());
        }
    }

    let schema = S::deserialize(Value::Object(conforming))
        .map_err(|err| ValidationError::new("body", err.to_string(), "type_error"))?;
    let checks = schema.validate().err();

    for name in S::FIELDS {
        if let Some(msg) = type_errors.get(name) {
            return Err(ValidationError::new(name, msg.clone(), "type_error"));
        }
        if let Some(failure) = checks.as_ref().and_then(|errors| field_failure(errors, name)) {
            return Err(describe_failure(name, failure));
        }
    }

    Ok(schema)
}

fn field_failure<'a>(errors: &'a ValidationErrors, name: &str) -> Option<&'a validator::ValidationError> {
    errors
        .field_errors()
        .into_iter()
        .find(|(field, _)| AsRef::<str>::as_ref(field) == name)
        .and_then(|(_, failures)| failures.first())
}

fn describe_failure(name: &str, failure: &validator::ValidationError) -> ValidationError {
    match failure.code.as_ref() {
        "required" => ValidationError::new(name, "field required", "value_error.missing"),
        "length" => {
            let max = failure
                .params
                .get("max")
                .map(ToString::to_string)
                .unwrap_or_default();
            ValidationError::new(
                name,
                format!("ensure this value has at most {} characters", max),
                "value_error.any_str.max_length",
            )
        }
        code => ValidationError::new(
            name,
            failure
                .message
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| code.to_string()),
            "value_error",
        ),
    }
}

/// Extractor that decodes the body as JSON and validates it against `T`.
///
/// An unreadable body keeps the status of its rejection, malformed JSON is a
/// `BadRequest` and a schema failure is a `Validation` error.
#[derive(Debug)]
pub struct Validated<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Schema + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await?;

        let raw: Value = serde_json::from_slice(&body).map_err(|err| {
            debug!("Rejecting malformed JSON body: {}", err);
            AppError::BadRequest("invalid JSON body".to_string())
        })?;

        Ok(Self(validate::<T>(raw)?))
    }
}
