//! # HTTP 服务层

pub mod handlers;
pub mod response;
pub mod routes;
#[allow(clippy::module_inception)]
pub mod server;

pub use server::{build_state, run, AppState};
