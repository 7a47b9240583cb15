//! Identity and access: password hashing, access tokens, and the
//! [`CurrentUser`] extractor every protected handler goes through.

pub mod identity;
pub mod password;
pub mod token;

pub use identity::CurrentUser;
pub use token::{Claims, TokenService};
