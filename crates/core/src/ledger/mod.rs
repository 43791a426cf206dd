//! Ledger records, field mapping between naming conventions, and user scoping.

mod mapper;
mod model;
mod scoping;
mod store;

pub use mapper::*;
pub use model::*;
pub use scoping::*;
pub use store::*;
