// store

mod kv_store;

pub use kv_store::*;

// repo

mod account_store;
mod refresh_ledger;

pub use account_store::*;
pub use refresh_ledger::*;
