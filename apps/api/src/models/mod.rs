pub mod card;

pub use card::{CardError, CardImage, CardLanguage, EffectText, Rgb};
