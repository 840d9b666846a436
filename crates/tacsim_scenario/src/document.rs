//! YAML to JSON document mapping
//!
//! Scenario documents are schema-less. The YAML event stream is folded straight into a
//! [`serde_json::Value`] tree, so that anything valid in YAML is echoed through, as long as JSON
//! has a way of spelling it.
//!
//! Plain scalars are resolved with the YAML 1.1 rules the scenarios were written against: `yes`,
//! `on` and `off` are booleans, `0755` is an octal integer and `1e3` (no decimal point) is a
//! string. Quoted scalars are always strings.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use thiserror::Error;
use yaml_rust2::{
    parser::{Event, EventReceiver, Parser},
    scanner::{ScanError, TScalarStyle},
};

/// Tag prefix of the YAML type repository, which `!!` expands to.
const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Yaml(#[from] ScanError),
    #[error("expected a single document, found more")]
    MultipleDocuments,
    #[error("{0} has no JSON representation")]
    NonFiniteNumber(f64),
    #[error("integer {0} doesn't fit into 64 bits")]
    IntegerOutOfRange(String),
    #[error("a mapping key must be a scalar, found {0}")]
    UnsupportedKey(&'static str),
    #[error("tagged value `{0}` isn't supported")]
    Tagged(String),
    #[error("`{value}` isn't a valid !!{tag}")]
    InvalidTagged { tag: &'static str, value: String },
    #[error("a `<<` merge key takes a mapping or a list of mappings")]
    InvalidMerge,
    #[error("alias refers to a node that isn't complete yet")]
    UnresolvedAlias,
    #[error("unexpected end of the YAML event stream")]
    Truncated,
    #[error("couldn't serialize the document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a YAML stream into a document tree.
///
/// An empty stream is a `null` document, streams with more than one document are rejected.
pub fn parse_yaml(text: &str) -> Result<Value, DocumentError> {
    let mut log = EventLog::default();
    Parser::new(text.chars()).load(&mut log, true)?;

    let mut builder = TreeBuilder {
        events: log.0.into_iter(),
        anchors: HashMap::new(),
    };

    let mut document = None;
    while let Some(event) = builder.events.next() {
        if let Event::DocumentStart { .. } = event {
            if document.is_some() {
                return Err(DocumentError::MultipleDocuments);
            }
            document = Some(builder.node()?);
        }
    }

    Ok(document.unwrap_or(Value::Null))
}

/// Serializes a document with 2-space indentation and no trailing newline.
pub fn to_json_string(document: &Value) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parses a YAML stream and serializes it straight back out as JSON.
pub fn convert_str(yaml: &str) -> Result<String, DocumentError> {
    to_json_string(&parse_yaml(yaml)?)
}

/// The parser reports events through a callback that can't fail, so they're buffered first.
#[derive(Default)]
struct EventLog(Vec<Event>);

impl EventReceiver for EventLog {
    fn on_event(&mut self, event: Event) {
        self.0.push(event);
    }
}

struct TreeBuilder {
    events: std::vec::IntoIter<Event>,
    /// Finished anchored nodes, by the parser's anchor id
    anchors: HashMap<usize, Value>,
}

impl TreeBuilder {
    fn node(&mut self) -> Result<Value, DocumentError> {
        let event = self.events.next().ok_or(DocumentError::Truncated)?;
        self.node_from(event)
    }

    fn node_from(&mut self, event: Event) -> Result<Value, DocumentError> {
        let (anchor, value) = match event {
            Event::Scalar(text, style, anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|tag| core_tag(&tag.handle, &tag.suffix))
                    .transpose()?;
                (anchor, resolve_scalar(text, style, tag)?)
            }
            Event::SequenceStart(anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|tag| core_tag(&tag.handle, &tag.suffix))
                    .transpose()?;
                if let Some(tag) = tag.filter(|&tag| tag != "seq") {
                    return Err(DocumentError::Tagged(format!("!!{tag}")));
                }
                (anchor, self.sequence()?)
            }
            Event::MappingStart(anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|tag| core_tag(&tag.handle, &tag.suffix))
                    .transpose()?;
                if let Some(tag) = tag.filter(|&tag| tag != "map") {
                    return Err(DocumentError::Tagged(format!("!!{tag}")));
                }
                (anchor, self.mapping()?)
            }
            Event::Alias(id) => {
                return self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or(DocumentError::UnresolvedAlias)
            }
            _ => return Err(DocumentError::Truncated),
        };

        // 0 is "no anchor"
        if anchor != 0 {
            self.anchors.insert(anchor, value.clone());
        }
        Ok(value)
    }

    fn sequence(&mut self) -> Result<Value, DocumentError> {
        let mut items = vec![];
        loop {
            match self.events.next() {
                Some(Event::SequenceEnd) => return Ok(Value::Array(items)),
                Some(event) => items.push(self.node_from(event)?),
                None => return Err(DocumentError::Truncated),
            }
        }
    }

    /// Merged entries go first and explicit entries override them, which keeps merged keys in
    /// front like YAML 1.1 loaders do.
    fn mapping(&mut self) -> Result<Value, DocumentError> {
        let mut merged = vec![];
        let mut entries = vec![];

        loop {
            let key = match self.events.next() {
                Some(Event::MappingEnd) => break,
                Some(event) => event,
                None => return Err(DocumentError::Truncated),
            };
            let is_merge = matches!(
                &key,
                Event::Scalar(text, TScalarStyle::Plain, _, None) if text == "<<"
            );

            let key = self.node_from(key)?;
            let value = self.node()?;
            if is_merge {
                merge_entries(value, &mut merged)?;
            } else {
                entries.push((json_key(key)?, value));
            }
        }

        let mut object = Map::with_capacity(merged.len() + entries.len());
        for (key, value) in merged.into_iter().chain(entries) {
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

/// Collects what a `<<` key pulls in. Later entries win, so a list of mappings is added back to
/// front and the first mapping listed takes priority.
fn merge_entries(value: Value, merged: &mut Vec<(String, Value)>) -> Result<(), DocumentError> {
    match value {
        Value::Object(object) => merged.extend(object),
        Value::Array(items) => {
            for item in items.into_iter().rev() {
                let Value::Object(object) = item else {
                    return Err(DocumentError::InvalidMerge);
                };
                merged.extend(object);
            }
        }
        _ => return Err(DocumentError::InvalidMerge),
    }
    Ok(())
}

/// Only the standard `!!` types are understood. Returns the type name, e.g. `int`.
fn core_tag<'a>(handle: &str, suffix: &'a str) -> Result<&'a str, DocumentError> {
    match handle {
        "!!" | CORE_TAG_PREFIX => Ok(suffix),
        // Verbatim `!<tag:yaml.org,2002:str>`
        "" if suffix.starts_with(CORE_TAG_PREFIX) => Ok(&suffix[CORE_TAG_PREFIX.len()..]),
        _ => Err(DocumentError::Tagged(format!("{handle}{suffix}"))),
    }
}

fn resolve_scalar(
    text: String,
    style: TScalarStyle,
    tag: Option<&str>,
) -> Result<Value, DocumentError> {
    let invalid = |tag, value: &str| DocumentError::InvalidTagged {
        tag,
        value: value.to_owned(),
    };

    match tag {
        Some("str") => return Ok(Value::String(text)),
        Some("null") => return Ok(Value::Null),
        Some("bool") => {
            return resolve_bool(&text)
                .map(Value::Bool)
                .ok_or_else(|| invalid("bool", &text))
        }
        Some("int") => {
            return resolve_int(&text)
                .ok_or_else(|| invalid("int", &text))?
                .map(Value::Number)
        }
        Some("float") => {
            let float = match resolve_float(&text) {
                Some(float) => float,
                None => resolve_int(&text)
                    .ok_or_else(|| invalid("float", &text))??
                    .as_f64()
                    .ok_or_else(|| invalid("float", &text))?,
            };
            return float_value(float);
        }
        Some(other) => return Err(DocumentError::Tagged(format!("!!{other}"))),
        None => {}
    }

    if style != TScalarStyle::Plain {
        return Ok(Value::String(text));
    }

    if is_null(&text) {
        Ok(Value::Null)
    } else if let Some(b) = resolve_bool(&text) {
        Ok(Value::Bool(b))
    } else if let Some(int) = resolve_int(&text) {
        int.map(Value::Number)
    } else if let Some(float) = resolve_float(&text) {
        float_value(float)
    } else {
        Ok(Value::String(text))
    }
}

fn float_value(float: f64) -> Result<Value, DocumentError> {
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or(DocumentError::NonFiniteNumber(float))
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn resolve_bool(text: &str) -> Option<bool> {
    match text {
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

/// Binary (`0b`), octal (leading `0`), decimal, hexadecimal (`0x`) and base 60 (`1:30`)
/// integers, with optional `_` separators.
///
/// `None` if `text` isn't spelled like an integer at all, an error if it is but doesn't fit.
fn resolve_int(text: &str) -> Option<Result<Number, DocumentError>> {
    let (negative, body) = split_sign(text);

    let magnitude = if let Some(binary) = body.strip_prefix("0b") {
        digits_value(binary, 2)
    } else if let Some(hex) = body.strip_prefix("0x") {
        digits_value(hex, 16)
    } else if body.contains(':') {
        base60_value(body)
    } else if let Some(octal) = body.strip_prefix('0').filter(|rest| !rest.is_empty()) {
        digits_value(octal, 8)
    } else if body.starts_with(|c: char| c.is_ascii_digit()) {
        digits_value(body, 10)
    } else {
        None
    }?;

    let number = i128::try_from(magnitude)
        .ok()
        .map(|value| if negative { -value } else { value })
        .and_then(|value| {
            i64::try_from(value)
                .map(Number::from)
                .or_else(|_| u64::try_from(value).map(Number::from))
                .ok()
        });
    Some(number.ok_or_else(|| DocumentError::IntegerOutOfRange(text.to_owned())))
}

/// Requires a decimal point, unlike YAML 1.2. The exponent, if any, needs an explicit sign.
fn resolve_float(text: &str) -> Option<f64> {
    let (negative, body) = split_sign(text);
    let sign = if negative { -1.0 } else { 1.0 };

    match body {
        ".inf" | ".Inf" | ".INF" => return Some(sign * f64::INFINITY),
        ".nan" | ".NaN" | ".NAN" if body.len() == text.len() => return Some(f64::NAN),
        _ => {}
    }

    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (body, None),
    };
    let (whole, fraction) = mantissa.split_once('.')?;

    let whole_ok = if whole.is_empty() {
        // `.5` is only a float without a sign
        body.len() == text.len() && fraction.starts_with(|c: char| c.is_ascii_digit())
    } else {
        whole.starts_with(|c: char| c.is_ascii_digit()) && is_digits(whole)
    };
    let exponent_ok = exponent.map_or(true, |exponent| {
        exponent
            .strip_prefix(['+', '-'])
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    });
    if !whole_ok || !is_digits(fraction) || !exponent_ok {
        return None;
    }

    // Padded with zeroes, so that `1.` and `.5` are spelled the way `f64::from_str` wants them
    let mut literal = format!("0{whole}.{fraction}0").replace('_', "");
    if let Some(exponent) = exponent {
        literal.push('e');
        literal.push_str(exponent);
    }
    literal.parse::<f64>().ok().map(|float| sign * float)
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn is_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit() || b == b'_')
}

/// Digits with `_` separators. Values too large for `u128` saturate, they're out of range anyway.
fn digits_value(digits: &str, radix: u32) -> Option<u128> {
    let mut value: u128 = 0;
    let mut any_digits = false;
    for c in digits.chars() {
        if c == '_' {
            continue;
        }
        let digit = c.to_digit(radix)?;
        value = value
            .saturating_mul(u128::from(radix))
            .saturating_add(u128::from(digit));
        any_digits = true;
    }
    any_digits.then_some(value)
}

/// `190:20:30` is 190 * 3600 + 20 * 60 + 30.
fn base60_value(body: &str) -> Option<u128> {
    let mut parts = body.split(':');
    let first = parts.next()?;
    if !first.starts_with(|c: char| matches!(c, '1'..='9')) {
        return None;
    }

    let mut value = digits_value(first, 10)?;
    for part in parts {
        if !(1..=2).contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let sixtieths = part.parse::<u8>().ok().filter(|&v| v < 60)?;
        value = value.saturating_mul(60).saturating_add(u128::from(sixtieths));
    }
    Some(value)
}

/// JSON only has string keys. Scalar keys are spelled the way they'd be spelled as JSON values.
fn json_key(key: Value) -> Result<String, DocumentError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Array(_) => Err(DocumentError::UnsupportedKey("a sequence")),
        Value::Object(_) => Err(DocumentError::UnsupportedKey("a mapping")),
        scalar => Ok(scalar.to_string()),
    }
}
