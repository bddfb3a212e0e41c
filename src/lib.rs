pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod render;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod static_files;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::ProtocolError;
pub use http::{CookieOptions, FormField, Request, Response, SameSite};
pub use middleware::{from_fn, Handler, Next};
pub use render::{RenderEngine, RenderError};
pub use router::Router;
pub use server::Server;
pub use static_files::StaticFiles;
