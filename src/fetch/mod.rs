//! Single-Flight Fetch Module
//!
//! Get-or-fetch composition of the TTL cache with request deduplication:
//! concurrent identical requests collapse into one remote call.

mod coordinator;

pub use coordinator::FetchCoordinator;
