pub mod apps;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod models;
pub mod passport;
pub mod server;
pub mod store;
pub mod webhook;

pub use error::{Error, Result};
pub use models::*;

/// Default base URL for the Aitu Passport identity API
pub const DEFAULT_PASSPORT_BASE_URL: &str = "https://passport.aitu.io";

/// Default base URL for the Aitu Apps push API
pub const DEFAULT_APPS_BASE_URL: &str = "https://api.miniapps.aitu.io";

/// Header inbound webhooks carry their signature in
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Aitu-Signature";

/// User agent sent on every outbound request
pub const USER_AGENT: &str = concat!("aitu-messenger/", env!("CARGO_PKG_VERSION"));
