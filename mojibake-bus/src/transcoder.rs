use bytes::BytesMut;

use crate::{
    double_byte::DoubleByteStage,
    encoding::Encoding,
    error::Result,
    single_byte::SingleByteStage,
    table,
};

/// One reversible un-mangling step, driven a byte at a time.
///
/// A transcoder is a plain state machine: [`StageTask`](crate::stage::StageTask)
/// runs it inside the asynchronous pipeline and [`Chain`](crate::convert::Chain)
/// runs it synchronously.
pub trait Transcoder: Send + 'static {
    fn name(&self) -> &str;

    /// Consumes one input byte, appending whatever it completes to `out`.
    fn push(&mut self, byte: u8, out: &mut BytesMut);

    /// Ends the current unit of work. Fails when an incomplete sequence is held;
    /// either way the transcoder is back in its idle state afterwards.
    fn finish(&mut self) -> Result<()>;

    /// Number of input bytes held back waiting for the rest of a sequence.
    fn pending(&self) -> usize;

    fn push_slice(&mut self, bytes: &[u8], out: &mut BytesMut) {
        for &b in bytes {
            self.push(b, out);
        }
    }
}

pub fn transcoder_for(encoding: Encoding) -> Box<dyn Transcoder> {
    match encoding {
        Encoding::Cp437 => Box::new(SingleByteStage::new(table::cp437())),
        Encoding::Cp932 => Box::new(DoubleByteStage::new(table::cp932())),
        Encoding::Cp936 => Box::new(DoubleByteStage::new(table::cp936())),
    }
}

pub fn transcoders_for(encodings: &[Encoding]) -> Vec<Box<dyn Transcoder>> {
    encodings.iter().copied().map(transcoder_for).collect()
}
