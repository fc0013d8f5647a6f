pub mod aggregation;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod model;
pub mod query;
pub mod router;
pub mod store;
pub mod transform;

pub use error::{LedgerError, Result};
pub use store::LedgerStore;
