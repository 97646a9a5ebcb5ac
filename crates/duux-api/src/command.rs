// Command fields and wire encodings
//
// The vendor moved from a numeric JSON command body to a free-text
// `tune set {field} {value}` grammar. Both are modelled as strategies
// behind `CommandEncoding`; which one a client speaks is fixed by
// `Protocol` at construction. Field tokens and value domains live in
// `Field::spec` and nowhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::Error;

/// Prefix of every text-grammar instruction.
const TEXT_VERB: &str = "tune set";

// ── Fields ──────────────────────────────────────────────────────────

/// A settable fan attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Field {
    Power,
    Speed,
    HorizontalOscillation,
    VerticalOscillation,
    Mode,
    NightMode,
    Lock,
}

/// Wire token and inclusive value domain of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub token: &'static str,
    pub min: u8,
    pub max: u8,
}

impl FieldSpec {
    const fn new(token: &'static str, min: u8, max: u8) -> Self {
        Self { token, min, max }
    }

    pub fn accepts(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Field {
    /// The single lookup table for wire tokens and domains. Status parsing
    /// and both command encodings read from here.
    pub const fn spec(self) -> FieldSpec {
        match self {
            Self::Power => FieldSpec::new("power", 0, 1),
            Self::Speed => FieldSpec::new("speed", 1, 30),
            Self::HorizontalOscillation => FieldSpec::new("horosc", 0, 3),
            Self::VerticalOscillation => FieldSpec::new("verosc", 0, 2),
            Self::Mode => FieldSpec::new("mode", 0, 3),
            Self::NightMode => FieldSpec::new("night", 0, 1),
            Self::Lock => FieldSpec::new("lock", 0, 1),
        }
    }

    /// Vendor wire token (`horosc`, `night`, ...).
    pub const fn token(self) -> &'static str {
        self.spec().token
    }

    /// Human-readable name (`horizontal-oscillation`, `night-mode`, ...).
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Look a field up by its wire token. Exact match only.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::iter().find(|f| f.token() == token)
    }

    /// Check `value` against this field's domain.
    pub fn validate(self, value: i64) -> Result<u8, Error> {
        let spec = self.spec();
        u8::try_from(value)
            .ok()
            .filter(|v| spec.accepts(*v))
            .ok_or(Error::Validation {
                field: spec.token,
                value,
                min: spec.min,
                max: spec.max,
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Field {
    type Err = Error;

    /// Accepts the wire token or the kebab-case name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::iter()
            .find(|f| f.token() == needle || f.name() == needle)
            .ok_or_else(|| Error::UnknownField(s.to_owned()))
    }
}

// ── Commands ────────────────────────────────────────────────────────

/// A validated single-field write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    field: Field,
    value: u8,
}

impl Command {
    /// Build a command, rejecting values outside the field's domain.
    pub fn new(field: Field, value: i64) -> Result<Self, Error> {
        let value = field.validate(value)?;
        Ok(Self { field, value })
    }

    /// Boolean fields encode as 0/1.
    pub fn toggle(field: Field, on: bool) -> Result<Self, Error> {
        Self::new(field, i64::from(on))
    }

    pub fn power(on: bool) -> Self {
        Self {
            field: Field::Power,
            value: u8::from(on),
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn value(&self) -> u8 {
        self.value
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

// ── Protocol selection ──────────────────────────────────────────────

/// Which command body format the vendor endpoint expects.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    /// `{"command": "tune set speed 15"}`
    #[default]
    Text,
    /// `{"command": {"speed": 15}}` (legacy)
    Numeric,
}

impl Protocol {
    pub fn encoding(self) -> &'static dyn CommandEncoding {
        match self {
            Self::Text => &TextEncoding,
            Self::Numeric => &NumericEncoding,
        }
    }
}

// ── Encodings ───────────────────────────────────────────────────────

/// Turns validated commands into request bodies and back.
pub trait CommandEncoding: fmt::Debug + Send + Sync {
    /// One request body per element of the returned vector.
    fn encode(&self, commands: &[Command]) -> Vec<Value>;

    /// Parse a request body produced by [`encode`](Self::encode).
    fn decode(&self, body: &Value) -> Result<Vec<Command>, Error>;
}

/// Legacy structured body. Several fields share one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEncoding;

impl CommandEncoding for NumericEncoding {
    fn encode(&self, commands: &[Command]) -> Vec<Value> {
        if commands.is_empty() {
            return Vec::new();
        }
        let fields: Map<String, Value> = commands
            .iter()
            .map(|c| (c.field.token().to_owned(), Value::from(c.value)))
            .collect();
        vec![json!({ "command": fields })]
    }

    fn decode(&self, body: &Value) -> Result<Vec<Command>, Error> {
        let fields = body
            .get("command")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("expected a `command` object", body))?;

        fields
            .iter()
            .map(|(token, value)| {
                let field = Field::from_token(token)
                    .ok_or_else(|| Error::UnknownField(token.clone()))?;
                let raw = value
                    .as_i64()
                    .ok_or_else(|| malformed(&format!("`{token}` is not an integer"), body))?;
                Command::new(field, raw)
            })
            .collect()
    }
}

/// Current free-text grammar: `tune set {token} {value}`, one per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoding;

impl TextEncoding {
    pub fn instruction(command: &Command) -> String {
        format!("{TEXT_VERB} {} {}", command.field.token(), command.value)
    }

    pub fn parse_instruction(text: &str) -> Result<Command, Error> {
        let rest = text.strip_prefix(TEXT_VERB).ok_or_else(|| Error::Deserialization {
            message: format!("instruction does not start with `{TEXT_VERB}`"),
            body: text.to_owned(),
        })?;

        let mut parts = rest.split_whitespace();
        let (Some(token), Some(raw), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::Deserialization {
                message: "expected `tune set {field} {value}`".into(),
                body: text.to_owned(),
            });
        };

        let field = Field::from_token(token).ok_or_else(|| Error::UnknownField(token.into()))?;
        let value = raw.parse::<i64>().map_err(|e| Error::Deserialization {
            message: format!("bad value `{raw}`: {e}"),
            body: text.to_owned(),
        })?;
        Command::new(field, value)
    }
}

impl CommandEncoding for TextEncoding {
    fn encode(&self, commands: &[Command]) -> Vec<Value> {
        commands
            .iter()
            .map(|c| json!({ "command": Self::instruction(c) }))
            .collect()
    }

    fn decode(&self, body: &Value) -> Result<Vec<Command>, Error> {
        let text = body
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("expected a `command` string", body))?;
        Ok(vec![Self::parse_instruction(text)?])
    }
}

fn malformed(message: &str, body: &Value) -> Error {
    Error::Deserialization {
        message: message.to_owned(),
        body: body.to_string(),
    }
}
