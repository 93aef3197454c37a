//! Canonical request keys.
//!
//! A key names the *shape* of a request (verb, first path segment and the
//! query-shaping options) so a pre-issued token can be looked up for it.
//! The key is also sent as the `key` header when no token exists yet, which
//! lets the backend correlate the shape and issue one.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::errors::NetError;
use crate::types::{ApiMethod, RequestOptions};

const SHORT_HASH_LEN: usize = 8;
const WIDE_MASK: u64 = (1 << 48) - 1;

/// How the token source is reduced to the 8-character short hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// 64-bit rolling hash, low 48 bits encoded as base64.
    /// Any single-character change in the token source changes the key.
    #[default]
    Wide,
    /// 32-bit rolling hash; base64 of its decimal string, first 8 chars.
    /// Reproduces keys issued by the legacy web client: structured options
    /// render as string concatenation would (`[object Object]`, `a,b`) and
    /// SQL calls are keyed as plain `post` without a statement fingerprint.
    /// Only the leading decimal digits survive the truncation, so
    /// near-identical shapes often collide.
    Legacy,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(pub String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn canonical_key(
    scheme: KeyScheme,
    method: ApiMethod,
    local_base: &Url,
    endpoint: &str,
    options: &RequestOptions,
) -> Result<CanonicalKey, NetError> {
    let method = match (scheme, method) {
        (KeyScheme::Legacy, ApiMethod::Sql) => ApiMethod::Post,
        (_, method) => method,
    };
    let scope = path_scope(local_base, endpoint)?;
    let source = token_source(&scope, scheme, method, options);
    let short = short_hash(scheme, &source);
    Ok(CanonicalKey(format!("{}:{}>{}", method.as_str(), scope, short)))
}

/// `/courses/123?x=1` scopes to `/courses`.
pub fn path_scope(local_base: &Url, endpoint: &str) -> Result<String, NetError> {
    let base = local_base.as_str().trim_end_matches('/');
    let raw = if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    };
    let url = Url::parse(&raw)
        .map_err(|err| NetError::config(&format!("invalid endpoint '{endpoint}': {err}")))?;

    let first = url
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()))
        .unwrap_or_default();
    Ok(format!("/{first}"))
}

fn token_source(
    scope: &str,
    scheme: KeyScheme,
    method: ApiMethod,
    options: &RequestOptions,
) -> String {
    let sql = sql_fingerprint(method, options.body.as_ref());
    let body_is_array = match (&sql, options.body.as_ref()) {
        (None, Some(Value::Array(_))) => Some(Value::Bool(true)),
        _ => None,
    };

    let record: [(&str, Option<Value>); 9] = [
        ("fields", options.fields.clone()),
        ("hidden", options.hidden.clone()),
        ("filter", options.filter.clone()),
        ("nearby", options.nearby.clone()),
        ("collections", options.joins.clone()),
        ("permission", options.permission.clone()),
        ("validation", options.validation.clone()),
        ("body_is_array", body_is_array),
        ("sql_query", sql.map(Value::String)),
    ];

    let mut source = scope.to_string();
    for (name, value) in record.iter() {
        let Some(value) = value.as_ref().filter(|v| is_truthy(v)) else {
            continue;
        };
        source.push_str(name);
        source.push(':');
        match scheme {
            KeyScheme::Wide => source.push_str(&stringify(value)),
            KeyScheme::Legacy => source.push_str(&legacy_stringify(value)),
        }
    }
    source
}

/// Statement text of an SQL-shaped body, JSON encoded.
///
/// Only bodies sent through the SQL entry point are considered. A single
/// statement (bare or in a one-element array) fingerprints as its text; a
/// batch fingerprints as the ordered list of texts.
pub fn sql_fingerprint(method: ApiMethod, body: Option<&Value>) -> Option<String> {
    if method != ApiMethod::Sql {
        return None;
    }
    let statement = |value: &Value| value.get("sql").and_then(Value::as_str).map(str::to_owned);

    match body? {
        Value::Array(items) if !items.is_empty() => {
            let texts: Option<Vec<String>> = items.iter().map(statement).collect();
            let texts = texts?;
            if texts.len() == 1 {
                Some(Value::String(texts[0].clone()).to_string())
            } else {
                Some(Value::from(texts).to_string())
            }
        }
        Value::Array(_) => None,
        other => statement(other).map(|sql| Value::String(sql).to_string()),
    }
}

/// Null, false, 0 and "" are falsy; containers never are.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings render raw; everything else as compact JSON with sorted object keys.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => sorted(other).to_string(),
    }
}

/// Rendering of the legacy web client, which concatenated option values
/// into the token source as plain strings.
pub fn legacy_stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => legacy_stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

pub fn short_hash(scheme: KeyScheme, source: &str) -> String {
    match scheme {
        KeyScheme::Wide => {
            let hash = rolling_hash_64(source) & WIDE_MASK;
            STANDARD.encode(&hash.to_be_bytes()[2..])
        }
        KeyScheme::Legacy => {
            let hash = rolling_hash_32(source);
            let mut encoded = STANDARD.encode(hash.to_string());
            encoded.truncate(SHORT_HASH_LEN);
            encoded
        }
    }
}

/// `h = h * 31 + c` over UTF-16 code units, seeded with the first unit,
/// wrapping at 32 bits.
pub fn rolling_hash_32(input: &str) -> i32 {
    let mut units = input.encode_utf16().peekable();
    let mut hash = units.peek().map(|u| *u as i32).unwrap_or(0);
    for unit in units {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash
}

pub fn rolling_hash_64(input: &str) -> u64 {
    let mut units = input.encode_utf16().peekable();
    let mut hash = units.peek().map(|u| *u as u64).unwrap_or(0);
    for unit in units {
        hash = hash.wrapping_mul(31).wrapping_add(unit as u64);
    }
    hash
}
