use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::ApiConfig;
use crate::errors::NetError;
use crate::key::{self, is_truthy, stringify, CanonicalKey, KeyScheme};
use crate::observe::{ObserverObject, Outcome, ProgressObserver, RequestInfo, TracingObserver};
use crate::tokens::TokenTable;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{ApiMethod, Body, NetRequest, RequestOptions, TimeoutCfg};

const HEADER_APP: HeaderName = HeaderName::from_static("app");
const HEADER_TOKEN: HeaderName = HeaderName::from_static("token");
const HEADER_KEY: HeaderName = HeaderName::from_static("key");

/// Where a call goes, decided by token presence for its canonical key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Remote base URL, authenticated with the `token` header.
    Trusted { token: String },
    /// Local base URL, identified by the `key` header.
    Local { key: CanonicalKey },
}

impl Route {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Route::Trusted { .. })
    }
}

/// `/reports` and `reports` both become `/sql-reports`.
pub fn sql_endpoint(name: &str) -> String {
    format!("/sql-{}", name.replacen('/', "", 1))
}

#[derive(Clone)]
pub struct Api {
    database: HeaderValue,
    local_base: Url,
    remote_base: Url,
    scheme: KeyScheme,
    timeout: TimeoutCfg,
    tokens: Arc<TokenTable>,
    transport: Arc<dyn Transport>,
    observers: Vec<ObserverObject>,
}

impl Api {
    pub fn builder(config: ApiConfig) -> ApiBuilder {
        ApiBuilder::new(config)
    }

    pub fn from_config(config: ApiConfig) -> Result<Self, NetError> {
        ApiBuilder::new(config).build()
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetError> {
        self.dispatch(ApiMethod::Get, endpoint, options).await
    }

    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetError> {
        self.dispatch(ApiMethod::Put, endpoint, options).await
    }

    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetError> {
        self.dispatch(ApiMethod::Post, endpoint, options).await
    }

    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetError> {
        self.dispatch(ApiMethod::Delete, endpoint, options).await
    }

    /// POSTs an SQL-shaped body to `/sql-<name>`.
    pub async fn sql(&self, name: &str, options: RequestOptions) -> Result<Value, NetError> {
        self.dispatch(ApiMethod::Sql, &sql_endpoint(name), options).await
    }

    pub fn canonical_key(
        &self,
        method: ApiMethod,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<CanonicalKey, NetError> {
        key::canonical_key(self.scheme, method, &self.local_base, endpoint, options)
    }

    pub fn route(
        &self,
        method: ApiMethod,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Route, NetError> {
        let key = self.canonical_key(method, endpoint, options)?;
        Ok(self.route_for(key))
    }

    fn route_for(&self, key: CanonicalKey) -> Route {
        match self.tokens.get(&key) {
            Some(token) => Route::Trusted {
                token: token.to_string(),
            },
            None => Route::Local { key },
        }
    }

    pub async fn dispatch(
        &self,
        method: ApiMethod,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Value, NetError> {
        let key = self.canonical_key(method, endpoint, &options)?;
        let route = self.route_for(key.clone());
        let request = self.build_request(method, endpoint, &options, &route)?;

        let info = RequestInfo {
            method,
            endpoint: endpoint.to_string(),
            key,
            trusted: route.is_trusted(),
        };
        let loading = options.loading();
        if loading {
            self.notify_start(&info);
        }

        let result = self.transport.send(request).await;

        let result = match result {
            Ok(response) => Ok(response.payload()),
            Err(err) => {
                tracing::error!(
                    target: "coursehub::net",
                    key = %info.key,
                    "{} Error: {}",
                    method.http_method(),
                    err.message()
                );
                Err(err)
            }
        };

        if loading {
            let outcome = match &result {
                Ok(_) => Outcome::Success,
                Err(err) => Outcome::Failure(err),
            };
            self.notify_end(&info, outcome);
        }
        result
    }

    fn build_request(
        &self,
        method: ApiMethod,
        endpoint: &str,
        options: &RequestOptions,
        route: &Route,
    ) -> Result<NetRequest, NetError> {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_APP, self.database.clone());

        let option_headers = [
            ("hidden", &options.hidden),
            ("filter", &options.filter),
            ("fields", &options.fields),
            ("session", &options.session),
            ("collections", &options.joins),
            ("validation", &options.validation),
            ("permission", &options.permission),
            ("nearby", &options.nearby),
        ];
        for (name, value) in option_headers {
            if let Some(value) = value.as_ref().filter(|v| is_truthy(v)) {
                headers.insert(HeaderName::from_static(name), header_value(name, value)?);
            }
        }

        let base = match route {
            Route::Trusted { token } => {
                headers.insert(HEADER_TOKEN, header_value("token", &Value::from(token.as_str()))?);
                &self.remote_base
            }
            Route::Local { key } => {
                headers.insert(HEADER_KEY, header_value("key", &Value::from(key.as_str()))?);
                &self.local_base
            }
        };

        let mut url = join_url(base, endpoint)?;
        let params = [
            ("page", &options.page),
            ("sort", &options.sort),
            ("search", &options.search),
        ];
        for (name, value) in params {
            if let Some(value) = value.as_ref().filter(|v| !v.is_null()) {
                url.query_pairs_mut().append_pair(name, &stringify(value));
            }
        }

        let body = match &options.body {
            Some(value) => Body::Json(value.clone()),
            None => Body::Empty,
        };

        Ok(NetRequest {
            method: method.http_method(),
            url,
            headers,
            body,
            timeout: self.timeout.clone(),
        })
    }

    fn notify_start(&self, info: &RequestInfo) {
        for observer in &self.observers {
            observer.on_start(info);
        }
    }

    fn notify_end(&self, info: &RequestInfo, outcome: Outcome<'_>) {
        for observer in &self.observers {
            observer.on_end(info, outcome);
        }
    }
}

fn header_value(name: &str, value: &Value) -> Result<HeaderValue, NetError> {
    HeaderValue::from_str(&stringify(value))
        .map_err(|err| NetError::config(&format!("invalid {name} header: {err}")))
}

/// Base path is kept: `https://host/v1` + `/courses` is `https://host/v1/courses`.
fn join_url(base: &Url, endpoint: &str) -> Result<Url, NetError> {
    let raw = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    Url::parse(&raw)
        .map_err(|err| NetError::config(&format!("invalid endpoint '{endpoint}': {err}")))
}

pub struct ApiBuilder {
    config: ApiConfig,
    tokens: Option<Arc<TokenTable>>,
    transport: Option<Arc<dyn Transport>>,
    observers: Vec<ObserverObject>,
}

impl ApiBuilder {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            tokens: None,
            transport: None,
            observers: vec![Arc::new(TracingObserver)],
        }
    }

    pub fn with_tokens(self, tokens: TokenTable) -> Self {
        self.with_shared_tokens(Arc::new(tokens))
    }

    pub fn with_shared_tokens(mut self, tokens: Arc<TokenTable>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: ProgressObserver + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn build(self) -> Result<Api, NetError> {
        self.config.validate()?;

        let tokens = match (self.tokens, self.config.tokens_path.as_ref()) {
            (Some(tokens), _) => tokens,
            (None, Some(path)) => Arc::new(TokenTable::from_path(path)?),
            (None, None) => Arc::new(TokenTable::empty()),
        };
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&self.config)?),
        };
        let database = HeaderValue::from_str(&self.config.database)
            .map_err(|err| NetError::config(&format!("invalid app header: {err}")))?;

        Ok(Api {
            database,
            local_base: self.config.local_base()?,
            remote_base: self.config.remote_base()?,
            scheme: self.config.key_scheme,
            timeout: TimeoutCfg {
                overall: Some(self.config.timeout()),
            },
            tokens,
            transport,
            observers: self.observers,
        })
    }
}
