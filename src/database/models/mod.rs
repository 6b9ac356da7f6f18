pub mod authority;
pub mod role;
pub mod token;

pub use authority::{Authority, AuthorityMethod, AuthorityRow, RoleAuthorityBinding};
pub use role::{Audit, Role, UserRoleBinding};
pub use token::{DelegationToken, TokenState};
