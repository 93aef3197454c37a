pub mod api;
pub mod config;
pub mod errors;
pub mod key;
pub mod observe;
pub mod prelude;
pub mod tokens;
pub mod transport;
pub mod types;

pub use api::{Api, ApiBuilder, Route};
pub use errors::NetError;
