//! One-shot helpers that run a whole string through a [`Pipeline`].

use crate::{
    encoding::Encoding,
    error::Result,
    pipeline::Pipeline,
};

/// Decodes `input` through a pipeline undoing `encodings` in order.
pub async fn decode_bytes(input: &[u8], encodings: &[Encoding]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut pipeline = Pipeline::new(&mut out, encodings)?;
    pipeline.write(input).await?;
    pipeline.close().await?;
    drop(pipeline);
    Ok(out)
}

/// Like [`decode_bytes`], for text that is expected to decode to UTF-8.
pub async fn decode(text: &str, encodings: &[Encoding]) -> Result<String> {
    let bytes = decode_bytes(text.as_bytes(), encodings).await?;
    Ok(String::from_utf8(bytes)?)
}

/// Like [`decode`] but panics on error. Handy for literals known to be well formed.
pub async fn must_decode(text: &str, encodings: &[Encoding]) -> String {
    match decode(text, encodings).await {
        Ok(decoded) => decoded,
        Err(e) => panic!("{}", e),
    }
}
