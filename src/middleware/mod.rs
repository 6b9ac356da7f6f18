pub mod authorize;
pub mod principal;
pub mod response;

pub use authorize::authorize_middleware;
pub use principal::{principal_middleware, Principal};
pub use response::{ApiResponse, ApiResult};
