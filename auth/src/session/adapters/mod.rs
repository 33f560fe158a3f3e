mod file;
mod in_memory;

pub use file::FileSessionPersistence;
pub use in_memory::InMemorySessionPersistence;
