//! Repository implementations.

pub mod inmemory;

pub use inmemory::queue::InMemoryQueueRepository;
pub use inmemory::session::InMemorySessionRepository;
