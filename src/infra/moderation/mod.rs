// Moderation infrastructure - flood-guard state.

mod in_memory;

pub use in_memory::InMemorySpamStore;
