pub mod errors;
pub mod filter;
pub mod subscription;

pub use errors::BusError;
pub use filter::EventFilter;
pub use subscription::{SubscriptionId, SubscriptionState};
