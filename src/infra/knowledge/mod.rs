// Knowledge infrastructure - corpus stores and the CSV feed.

mod csv_source;
#[cfg(test)]
mod in_memory;
mod sqlite_store;

pub use csv_source::HttpCsvSource;
#[cfg(test)]
pub use in_memory::InMemoryKnowledgeStore;
pub use sqlite_store::SqliteKnowledgeStore;
