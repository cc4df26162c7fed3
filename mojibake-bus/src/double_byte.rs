use bytes::{BufMut, BytesMut};

use crate::{
    error::{DecodeError, Result},
    table::DoubleByteTable,
    transcoder::Transcoder,
};

/// Undoes "double-byte source read one byte per character".
///
/// Bytes below 0x80 are ASCII and pass through. Any other byte is a lead byte and
/// waits for its trail; the pair is looked up in the table and written out as
/// UTF-8. Pairs the table does not define come out as U+FFFD, so a miss never
/// stops the stage.
pub struct DoubleByteStage {
    table: &'static DoubleByteTable,
    lead: Option<u8>,
}

impl DoubleByteStage {
    pub fn new(table: &'static DoubleByteTable) -> Self {
        Self { table, lead: None }
    }
}

impl Transcoder for DoubleByteStage {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn push(&mut self, byte: u8, out: &mut BytesMut) {
        match self.lead.take() {
            Some(lead) => {
                let ch = self
                    .table
                    .lookup(DoubleByteTable::key(lead, byte))
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            None if byte < 0x80 => out.put_u8(byte),
            None => self.lead = Some(byte),
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.lead.take().is_some() {
            return Err(DecodeError::malformed(self.name()));
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        usize::from(self.lead.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    fn run(input: &[u8]) -> (Vec<u8>, Result<()>) {
        let mut stage = DoubleByteStage::new(table::cp932());
        let mut out = BytesMut::new();
        stage.push_slice(input, &mut out);
        let result = stage.finish();
        (out.to_vec(), result)
    }

    #[test]
    fn test_pairs_decode_to_utf8() {
        let (out, result) = run(b"\x93\xfc\x8a\xd4\x90l\x8a\xd4");
        assert!(result.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "入間人間");
    }

    #[test]
    fn test_ascii_passes_through() {
        let input: Vec<u8> = (0x00..0x80).collect();
        let (out, result) = run(&input);
        assert!(result.is_ok());
        assert_eq!(out, input);
    }

    #[test]
    fn test_unmapped_pair_becomes_replacement() {
        let (out, result) = run(b"a\x95/b");
        assert!(result.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_lone_lead_is_malformed() {
        let mut stage = DoubleByteStage::new(table::cp932());
        let mut out = BytesMut::new();
        stage.push(0x93, &mut out);
        assert!(out.is_empty());
        assert_eq!(stage.pending(), 1);

        let err = stage.finish().unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.to_string(), "mojibake: cp932: malformed byte stream");
        assert_eq!(stage.pending(), 0);
    }

    #[test]
    fn test_gbk() {
        let mut stage = DoubleByteStage::new(table::cp936());
        let mut out = BytesMut::new();
        stage.push_slice(b"\xd6\xd0\xce\xc4", &mut out);
        assert!(stage.finish().is_ok());
        assert_eq!(&out[..], "中文".as_bytes());
    }
}
