/// Domain models
///
/// - `user`: registered accounts
/// - `session`: login sessions and the token handed to the caller
/// - `task`: tasks, status/priority enums, filters and orderings
/// - `report`: report windows, trend buckets and summary values

pub mod report;
pub mod session;
pub mod task;
pub mod user;
