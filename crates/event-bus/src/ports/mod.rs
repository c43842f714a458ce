pub mod inbound;

pub use inbound::{Backend, EventBus, Handler, HealthReport};
