//! Streaming repair of mojibake.
//!
//! Text that was decoded with the wrong character set, possibly more than once,
//! is repaired by replaying each misinterpretation in reverse. Every step is a
//! [`Transcoder`]; a [`Pipeline`] runs one task per step, connected by
//! rendezvous channels, and hands the result to a sink on flush.
//!
//! ```no_run
//! # async fn run() -> mojibake_bus::Result<()> {
//! use mojibake_bus::{Encoding, Pipeline};
//!
//! let mut pipeline = Pipeline::new(tokio::io::stdout(), &[Encoding::Cp437, Encoding::Cp932])?;
//! pipeline.copy_from(&mut tokio::io::stdin()).await?;
//! pipeline.flush().await?;
//! pipeline.close().await?;
//! # Ok(())
//! # }
//! ```

/// Builds the code tables up front. Optional: tables are otherwise built on
/// first use.
pub fn init() {
    table::init();
}

pub mod collector;
pub mod convert;
pub mod decode;
pub mod double_byte;
pub mod encoding;
pub mod error;
pub mod pipeline;
pub mod single_byte;
pub mod stage;
pub mod table;
pub mod transcoder;

#[cfg(test)]
mod test_util;

pub use convert::DecodeWriter;
pub use decode::{decode, decode_bytes, must_decode};
pub use encoding::{Encoding, StageKind};
pub use error::{DecodeError, Result};
pub use pipeline::Pipeline;
pub use transcoder::Transcoder;
