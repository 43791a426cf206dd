//! Data fetching, cache and periodic sync scheduling.

mod cache;
mod cycle;
mod fetcher;
mod scheduler;

pub use cache::*;
pub use cycle::*;
pub use fetcher::*;
pub use scheduler::*;
