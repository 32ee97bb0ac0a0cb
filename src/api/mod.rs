pub mod handlers;
pub mod routes;

pub use routes::{pages, routes};
