pub mod authorizer;
pub mod error;
pub mod helper;
pub mod permissions;

pub use authorizer::{Account, AccountKind, Authorizer};
pub use error::AuthError;
pub use permissions::{Permission, Permissions};
