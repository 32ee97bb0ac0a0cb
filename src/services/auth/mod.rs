pub mod credential;
pub mod factory;
pub mod gateway;
pub mod path_policy;
pub mod return_to;
pub mod session;

pub use factory::build_gateway;
pub use gateway::{Decision, Gateway, GatewayPolicy, RequestContext};
pub use path_policy::{PathClass, PathPolicy};
