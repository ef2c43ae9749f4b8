mod account_store_memory;
mod kv_store_memory;
mod refresh_ledger_memory;

pub use account_store_memory::*;
pub use kv_store_memory::*;
pub use refresh_ledger_memory::*;
