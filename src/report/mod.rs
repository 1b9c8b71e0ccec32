pub mod blocks;
pub mod citations;
pub mod synthesizer;

pub use synthesizer::{SynthesisContext, TextSynthesizer};
