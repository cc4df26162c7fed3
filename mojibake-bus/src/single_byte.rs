use bytes::{BufMut, BytesMut};

use crate::{
    error::{DecodeError, Result},
    table::SingleByteTable,
    transcoder::Transcoder,
};

/// Undoes "single-byte source displayed as characters and saved as UTF-8".
///
/// Input is UTF-8. Each complete rune is looked up in the table and replaced by
/// the byte it was misread from. Runes the table does not know are passed
/// through as their original UTF-8 bytes (plain ASCII falls in this case), and
/// bytes that are not valid UTF-8 are passed through one for one.
pub struct SingleByteStage {
    table: &'static SingleByteTable,
    rune: [u8; 4],
    held: usize,
    need: usize,
}

impl SingleByteStage {
    pub fn new(table: &'static SingleByteTable) -> Self {
        Self {
            table,
            rune: [0; 4],
            held: 0,
            need: 0,
        }
    }

    fn emit_rune(&self, out: &mut BytesMut) {
        let raw = &self.rune[..self.held];
        let ch = std::str::from_utf8(raw).ok().and_then(|s| s.chars().next());
        match ch.and_then(|ch| self.table.lookup(ch)) {
            Some(byte) => out.put_u8(byte),
            None => out.extend_from_slice(raw),
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, or 0 if it cannot start one.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

impl Transcoder for SingleByteStage {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn push(&mut self, byte: u8, out: &mut BytesMut) {
        if self.held == 0 {
            match utf8_width(byte) {
                0 | 1 => out.put_u8(byte),
                n => {
                    self.rune[0] = byte;
                    self.held = 1;
                    self.need = n;
                }
            }
            return;
        }

        if byte & 0xC0 != 0x80 {
            // sequence broken off early: keep what we had, start over with this byte
            out.extend_from_slice(&self.rune[..self.held]);
            self.held = 0;
            self.push(byte, out);
            return;
        }

        self.rune[self.held] = byte;
        self.held += 1;
        if self.held == self.need {
            self.emit_rune(out);
            self.held = 0;
        }
    }

    fn finish(&mut self) -> Result<()> {
        let held = std::mem::take(&mut self.held);
        if held > 0 {
            return Err(DecodeError::malformed(self.name()));
        }
        Ok(())
    }

    fn pending(&self) -> usize {
        self.held
    }
}
