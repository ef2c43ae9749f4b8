mod account_store_mysql;
mod refresh_ledger_mysql;
mod util;

pub use account_store_mysql::*;
pub use refresh_ledger_mysql::*;
pub use util::*;
