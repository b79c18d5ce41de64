mod account_service_impl;
mod auth_service_impl;
mod jwt_codec;
mod password_hasher;

pub use account_service_impl::*;
pub use auth_service_impl::*;
pub use jwt_codec::*;
pub use password_hasher::*;
