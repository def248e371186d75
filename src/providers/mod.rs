//! Engine input providers

pub mod channel;
pub mod replay;

pub use channel::{ChannelProvider, DEFAULT_CHANNEL_CAPACITY, MessageSender, channel};
pub use replay::{ReplayProvider, ReplayScript, ReplayStep};
