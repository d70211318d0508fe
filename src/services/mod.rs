// src/services/mod.rs
pub mod debounce;
pub mod message;
pub mod search;

pub use debounce::{ControllerState, QueryController};
pub use message::{ChannelSink, MessageBuilder, StickerSink};
pub use search::{Aggregator, Searcher};
