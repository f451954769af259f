mod token;

pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
