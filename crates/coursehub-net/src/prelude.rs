pub use crate::api::{sql_endpoint, Api, ApiBuilder, Route};
pub use crate::config::ApiConfig;
pub use crate::errors::{ErrorCode, ErrorObj, NetError};
pub use crate::key::{CanonicalKey, KeyScheme};
pub use crate::observe::{
    Outcome, ProgressEvent, ProgressObserver, RecordingObserver, RequestInfo, TracingObserver,
};
pub use crate::tokens::TokenTable;
pub use crate::transport::{ReqwestTransport, Transport};
pub use crate::types::{
    ApiMethod, Body, NetRequest, NetResponse, RequestOptions, SqlStatement, TimeoutCfg,
};
