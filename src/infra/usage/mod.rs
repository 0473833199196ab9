// Usage infrastructure - user and query log storage.

#[cfg(test)]
mod in_memory;
mod sqlite_store;

#[cfg(test)]
pub use in_memory::InMemoryUsageStore;
pub use sqlite_store::SqliteUsageStore;
