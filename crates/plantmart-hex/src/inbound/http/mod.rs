mod auth;
mod cart;
mod orders;
mod server;

pub use auth::UserId;
pub use server::{AppState, HttpServer, HttpServerConfig};
