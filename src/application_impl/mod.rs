mod password_hasher;
mod session_cache;
mod session_service_fake;
mod session_service_impl;
mod token_codec;

pub use password_hasher::*;
pub use session_cache::*;
pub use session_service_fake::*;
pub use session_service_impl::*;
pub use token_codec::*;
