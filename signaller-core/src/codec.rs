//! JSON envelope codec.
//!
//! Every frame is a JSON object with exactly two string fields. Their key names come
//! from deployment configuration ([`EnvelopeKeys`]); peers and relay must agree on them.

use crate::model::{Envelope, MessageType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame is not a JSON object: {0}")]
    Malformed(String),

    #[error("envelope field `{0}` is missing")]
    MissingField(String),

    #[error("envelope field `{0}` is not a string")]
    InvalidField(String),

    #[error("unknown message type {0:?}")]
    UnknownType(String),
}

/// Rejected [`EnvelopeKeys`] configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeysError {
    #[error("envelope key names must not be empty")]
    EmptyKey,

    #[error("envelope key names must differ, both are {0:?}")]
    DuplicateKey(String),
}

/// Key names of the two envelope fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeKeys {
    pub type_key: String,
    pub contents_key: String,
}

impl Default for EnvelopeKeys {
    fn default() -> Self {
        Self {
            type_key: "type".to_owned(),
            contents_key: "contents".to_owned(),
        }
    }
}

impl EnvelopeKeys {
    pub fn validate(&self) -> Result<(), KeysError> {
        if self.type_key.is_empty() || self.contents_key.is_empty() {
            return Err(KeysError::EmptyKey);
        }
        if self.type_key == self.contents_key {
            return Err(KeysError::DuplicateKey(self.type_key.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvelopeCodec {
    keys: EnvelopeKeys,
}

impl EnvelopeCodec {
    pub fn new(keys: EnvelopeKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &EnvelopeKeys {
        &self.keys
    }

    pub fn encode(&self, kind: MessageType, contents: &str) -> String {
        let mut object = Map::with_capacity(2);
        object.insert(
            self.keys.type_key.clone(),
            Value::String(kind.as_str().to_owned()),
        );
        object.insert(
            self.keys.contents_key.clone(),
            Value::String(contents.to_owned()),
        );
        Value::Object(object).to_string()
    }

    pub fn decode(&self, text: &str) -> Result<Envelope, CodecError> {
        let (kind, contents) = self.decode_fields(text)?;
        Ok(Envelope {
            kind: kind.parse()?,
            contents,
        })
    }

    /// Structural decode only; the type string is not checked against the vocabulary.
    pub fn decode_fields(&self, text: &str) -> Result<(String, String), CodecError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CodecError::Malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(CodecError::Malformed("expected an object".to_owned()));
        };

        let kind = take_string(&mut object, &self.keys.type_key)?;
        let contents = take_string(&mut object, &self.keys.contents_key)?;
        Ok((kind, contents))
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Result<String, CodecError> {
    match object.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(CodecError::InvalidField(key.to_owned())),
        None => Err(CodecError::MissingField(key.to_owned())),
    }
}
