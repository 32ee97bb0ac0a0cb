pub mod http;
pub mod verifier;

pub use http::HttpSessionVerifier;
pub use verifier::{SessionVerifier, VerifyError};
