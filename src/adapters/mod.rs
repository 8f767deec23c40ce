//! Adapter implementations for the image generator port.
//!
//! - `live/`: calls the Gemini API
//! - `recording/`: wraps a live adapter and writes a cassette
//! - `replaying/`: answers from a cassette without network I/O

pub mod live;
pub mod recording;
pub mod replaying;
