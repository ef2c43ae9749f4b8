mod account;
mod session;

pub use account::*;
pub use session::*;
