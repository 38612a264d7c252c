//! Unified debug log: a publish/subscribe bus and the feed that collects it.

mod bus;
mod feed;

pub use bus::{EventBus, Subscription};
pub use feed::{LogFeed, LogView};
