//! Data models for the thumbnailer
//!
//! Each sub-module covers one concern of a message's journey through the
//! pipeline: the message itself, render requests and results, artifact
//! references and the folded routing outcome.

mod artifact;
mod message;
mod outcome;
mod render;

// Re-export all models for convenient imports
pub use artifact::*;
pub use message::*;
pub use outcome::*;
pub use render::*;
