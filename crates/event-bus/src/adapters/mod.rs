pub mod durable;
pub mod in_memory;

pub use durable::DurableEventBus;
pub use in_memory::{InMemoryEventBus, DEFAULT_PUBLISH_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
