//! Deck input: YDK parsing and card id remapping, upstream of sheet generation.

pub mod changelog;
pub mod handlers;
pub mod ydk;

pub use changelog::IdChangelog;
pub use ydk::{parse_ydk, DeckError};
