//! Blocking conversions that run the same transcoders without a runtime.

use std::io::{self, Write};

use bytes::BytesMut;

use crate::{
    encoding::Encoding,
    error::{DecodeError, Result},
    transcoder::{Transcoder, transcoders_for},
};

/// A chain of transcoders driven synchronously, stage by stage.
pub struct Chain {
    stages: Vec<Box<dyn Transcoder>>,
}

impl Chain {
    pub fn new(encodings: &[Encoding]) -> Result<Self> {
        Self::with_stages(transcoders_for(encodings))
    }

    pub fn with_stages(stages: Vec<Box<dyn Transcoder>>) -> Result<Self> {
        if stages.is_empty() {
            return Err(DecodeError::NoEncodings);
        }
        Ok(Self { stages })
    }

    /// Runs `input` through every stage, appending the final output to `out`.
    pub fn push(&mut self, input: &[u8], out: &mut BytesMut) {
        let mut data = BytesMut::from(input);
        for stage in &mut self.stages {
            let mut next = BytesMut::with_capacity(data.len());
            stage.push_slice(&data, &mut next);
            data = next;
        }
        out.extend_from_slice(&data);
    }

    /// Finishes every stage front to back; reports the first failure.
    pub fn finish(&mut self) -> Result<()> {
        let mut first_err = None;
        for stage in &mut self.stages {
            if let Err(e) = stage.finish() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Decodes `input` undoing `encodings` in order, without spawning any tasks.
pub fn decode_sync(input: &[u8], encodings: &[Encoding]) -> Result<Vec<u8>> {
    let mut chain = Chain::new(encodings)?;
    let mut out = BytesMut::with_capacity(input.len());
    chain.push(input, &mut out);
    chain.finish()?;
    Ok(out.to_vec())
}

/// Recovers the raw bytes behind text that was displayed as code page 437.
pub fn undo_cp437(text: &str) -> Vec<u8> {
    let mut chain = Chain {
        stages: transcoders_for(&[Encoding::Cp437]),
    };
    let mut out = BytesMut::with_capacity(text.len());
    chain.push(text.as_bytes(), &mut out);
    // a &str never ends inside a rune, so there is nothing left to finish
    out.to_vec()
}

/// Converts raw Shift-JIS bytes to UTF-8 text.
pub fn cp932_to_utf8(bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8(decode_sync(bytes, &[Encoding::Cp932])?)?)
}

/// Recovers Shift-JIS text that was displayed as code page 437.
pub fn from_sjis(text: &str) -> Result<String> {
    Ok(String::from_utf8(decode_sync(
        text.as_bytes(),
        &[Encoding::Cp437, Encoding::Cp932],
    )?)?)
}

/// A [`Write`] adapter that decodes everything written to it before passing it
/// on to `inner`. A sequence split across two writes is held until the rest
/// arrives.
pub struct DecodeWriter<W: Write> {
    inner: W,
    chain: Chain,
    out: BytesMut,
}

impl<W: Write> DecodeWriter<W> {
    pub fn new(inner: W, encodings: &[Encoding]) -> Result<Self> {
        Ok(Self::with_chain(inner, Chain::new(encodings)?))
    }

    /// Undoes code page 437 only, for text whose source was UTF-8.
    pub fn utf8(inner: W) -> Self {
        Self::with_chain(
            inner,
            Chain {
                stages: transcoders_for(&[Encoding::Cp437]),
            },
        )
    }

    /// Undoes code page 437, then Shift-JIS.
    pub fn sjis(inner: W) -> Self {
        Self::with_chain(
            inner,
            Chain {
                stages: transcoders_for(&[Encoding::Cp437, Encoding::Cp932]),
            },
        )
    }

    fn with_chain(inner: W, chain: Chain) -> Self {
        Self {
            inner,
            chain,
            out: BytesMut::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Ends the stream and hands back the inner writer. Fails when the input
    /// stopped in the middle of a sequence.
    pub fn finish(mut self) -> Result<W> {
        self.chain.finish()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for DecodeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.chain.push(buf, &mut self.out);
        let written = self.inner.write_all(&self.out);
        self.out.clear();
        written?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::mangle;

    #[test]
    fn test_undo_cp437() {
        assert_eq!(undo_cp437("πâíπâó.txt"), "メモ.txt".as_bytes());
        assert_eq!(undo_cp437("plain"), b"plain");
    }

    #[test]
    fn test_cp932_to_utf8() {
        assert_eq!(
            cp932_to_utf8(b"\x93d\x94g\x8f\x97\x82\xc6").unwrap(),
            "電波女と"
        );
        assert!(cp932_to_utf8(b"\x93").unwrap_err().is_malformed());
    }

    #[test]
    fn test_from_sjis() {
        assert_eq!(from_sjis("ôⁿè╘Élè╘").unwrap(), "入間人間");
        let original = "(一般小説) [桜庭一樹] GOSICK 第1巻.txt";
        assert_eq!(from_sjis(&mangle(original, encoding_rs::SHIFT_JIS)).unwrap(), original);
    }

    #[test]
    fn test_chain_matches_streaming_split() {
        // feeding in pieces gives the same bytes as feeding at once
        let mangled = mangle("文字化け 入間人間", encoding_rs::SHIFT_JIS);
        let whole = decode_sync(mangled.as_bytes(), &[Encoding::Cp437, Encoding::Cp932]).unwrap();

        let mut chain = Chain::new(&[Encoding::Cp437, Encoding::Cp932]).unwrap();
        let mut out = BytesMut::new();
        for piece in mangled.as_bytes().chunks(3) {
            chain.push(piece, &mut out);
        }
        chain.finish().unwrap();
        assert_eq!(out.to_vec(), whole);
    }

    #[test]
    fn test_utf8_writer() -> anyhow::Result<()> {
        let mut writer = DecodeWriter::utf8(Vec::new());
        write!(writer, "GOSICK τ¼¼1σ╖╗.txt")?;
        assert_eq!(std::str::from_utf8(writer.get_ref())?, "GOSICK 第1巻.txt");
        Ok(())
    }

    #[test]
    fn test_sjis_writer_with_io_copy() -> anyhow::Result<()> {
        let mangled = mangle("電波女と青春男　第１巻", encoding_rs::SHIFT_JIS);
        let mut writer = DecodeWriter::sjis(Vec::new());
        io::copy(&mut mangled.as_bytes(), &mut writer)?;
        let out = writer.finish()?;
        assert_eq!(String::from_utf8(out)?, "電波女と青春男　第１巻");
        Ok(())
    }

    #[test]
    fn test_writer_holds_split_sequences() -> anyhow::Result<()> {
        // "ôⁿ" is 93 FC once cp437 is undone; split inside the UTF-8 of "ⁿ"
        let input = "ôⁿè╘".as_bytes();
        let mut writer = DecodeWriter::sjis(Vec::new());
        writer.write_all(&input[..3])?;
        assert!(writer.get_ref().is_empty());
        writer.write_all(&input[3..])?;
        assert_eq!(std::str::from_utf8(writer.get_ref())?, "入間");
        writer.finish()?;
        Ok(())
    }

    #[test]
    fn test_writer_reports_truncation_on_finish() -> anyhow::Result<()> {
        let mut writer = DecodeWriter::new(Vec::new(), &[Encoding::Cp932])?;
        writer.write_all(b"ok\x93")?;
        assert_eq!(writer.get_ref(), b"ok");
        assert!(writer.finish().unwrap_err().is_malformed());
        assert!(matches!(
            DecodeWriter::new(Vec::new(), &[]),
            Err(DecodeError::NoEncodings)
        ));
        Ok(())
    }

    #[test]
    fn test_chain_requires_stages() {
        assert!(matches!(Chain::new(&[]), Err(DecodeError::NoEncodings)));
    }
}
