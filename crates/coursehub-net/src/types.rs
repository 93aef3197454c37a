use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMethod {
    Get,
    Put,
    Post,
    Delete,
    /// Fingerprinted by statement text; sent as POST.
    Sql,
}

impl ApiMethod {
    /// Label used as the canonical key prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiMethod::Get => "get",
            ApiMethod::Put => "put",
            ApiMethod::Post => "post",
            ApiMethod::Delete => "delete",
            ApiMethod::Sql => "sql",
        }
    }

    pub fn http_method(self) -> Method {
        match self {
            ApiMethod::Get => Method::GET,
            ApiMethod::Put => Method::PUT,
            ApiMethod::Post | ApiMethod::Sql => Method::POST,
            ApiMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(ApiMethod::Get),
            "put" => Ok(ApiMethod::Put),
            "post" => Ok(ApiMethod::Post),
            "delete" => Ok(ApiMethod::Delete),
            "sql" => Ok(ApiMethod::Sql),
            other => Err(format!("unknown method '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "sql": self.sql, "params": self.params })
    }
}

/// Query-shaping options for a single call.
///
/// Structured bags are kept as raw JSON because the backend interprets them;
/// the client only fingerprints and forwards them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub loading: Option<bool>,
    pub body: Option<Value>,
    pub page: Option<Value>,
    pub sort: Option<Value>,
    pub search: Option<Value>,
    pub joins: Option<Value>,
    pub filter: Option<Value>,
    pub hidden: Option<Value>,
    pub fields: Option<Value>,
    pub session: Option<Value>,
    pub validation: Option<Value>,
    pub permission: Option<Value>,
    pub nearby: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(&self) -> bool {
        self.loading.unwrap_or(true)
    }

    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_sql(self, statement: SqlStatement) -> Self {
        self.with_body(statement.to_value())
    }

    pub fn with_sql_batch(self, statements: &[SqlStatement]) -> Self {
        self.with_body(Value::Array(
            statements.iter().map(SqlStatement::to_value).collect(),
        ))
    }

    pub fn with_page(mut self, page: Value) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_search(mut self, search: Value) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_joins(mut self, joins: Value) -> Self {
        self.joins = Some(joins);
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_hidden(mut self, hidden: Value) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_session(mut self, session: Value) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_validation(mut self, validation: Value) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_permission(mut self, permission: Value) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn with_nearby(mut self, nearby: Value) -> Self {
        self.nearby = Some(nearby);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct TimeoutCfg {
    pub overall: Option<Duration>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
}

#[derive(Clone, Debug)]
pub struct NetRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
    pub timeout: TimeoutCfg,
}

#[derive(Clone, Debug)]
pub struct NetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub elapsed: Duration,
}

impl NetResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, elapsed: Duration) -> Self {
        Self {
            status,
            headers,
            body,
            elapsed,
        }
    }

    /// Payload as the backend sent it: JSON when it parses, raw text otherwise.
    pub fn payload(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }
}
