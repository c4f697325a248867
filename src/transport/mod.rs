pub mod envelope;
pub mod http_server;
pub mod params;

pub use envelope::{ApiError, PluginRequest, PluginResponse, ResponseCode};
pub use http_server::{AppState, HttpServerApp, router};
