//! Static code tables.
//!
//! Each table is built once on first use and never mutated afterwards.
//! Single-byte tables are stored in the direction the decoder needs them:
//! the codepoint a legacy byte was displayed as, back to that byte.
//! Double-byte tables map `lead << 8 | trail` to the character the pair stands for.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Upper half of code page 437, indexed by `byte - 0x80`.
static CP437_HIGH: [char; 128] = [
    '\u{00C7}', '\u{00FC}', '\u{00E9}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E5}', '\u{00E7}', // 80
    '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00EF}', '\u{00EE}', '\u{00EC}', '\u{00C4}', '\u{00C5}', // 88
    '\u{00C9}', '\u{00E6}', '\u{00C6}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00FB}', '\u{00F9}', // 90
    '\u{00FF}', '\u{00D6}', '\u{00DC}', '\u{00A2}', '\u{00A3}', '\u{00A5}', '\u{20A7}', '\u{0192}', // 98
    '\u{00E1}', '\u{00ED}', '\u{00F3}', '\u{00FA}', '\u{00F1}', '\u{00D1}', '\u{00AA}', '\u{00BA}', // A0
    '\u{00BF}', '\u{2310}', '\u{00AC}', '\u{00BD}', '\u{00BC}', '\u{00A1}', '\u{00AB}', '\u{00BB}', // A8
    '\u{2591}', '\u{2592}', '\u{2593}', '\u{2502}', '\u{2524}', '\u{2561}', '\u{2562}', '\u{2556}', // B0
    '\u{2555}', '\u{2563}', '\u{2551}', '\u{2557}', '\u{255D}', '\u{255C}', '\u{255B}', '\u{2510}', // B8
    '\u{2514}', '\u{2534}', '\u{252C}', '\u{251C}', '\u{2500}', '\u{253C}', '\u{255E}', '\u{255F}', // C0
    '\u{255A}', '\u{2554}', '\u{2569}', '\u{2566}', '\u{2560}', '\u{2550}', '\u{256C}', '\u{2567}', // C8
    '\u{2568}', '\u{2564}', '\u{2565}', '\u{2559}', '\u{2558}', '\u{2552}', '\u{2553}', '\u{256B}', // D0
    '\u{256A}', '\u{2518}', '\u{250C}', '\u{2588}', '\u{2584}', '\u{258C}', '\u{2590}', '\u{2580}', // D8
    '\u{03B1}', '\u{00DF}', '\u{0393}', '\u{03C0}', '\u{03A3}', '\u{03C3}', '\u{00B5}', '\u{03C4}', // E0
    '\u{03A6}', '\u{0398}', '\u{03A9}', '\u{03B4}', '\u{221E}', '\u{03C6}', '\u{03B5}', '\u{2229}', // E8
    '\u{2261}', '\u{00B1}', '\u{2265}', '\u{2264}', '\u{2320}', '\u{2321}', '\u{00F7}', '\u{2248}', // F0
    '\u{00B0}', '\u{2219}', '\u{00B7}', '\u{221A}', '\u{207F}', '\u{00B2}', '\u{25A0}', '\u{00A0}', // F8
];

/// Number of slots in a double-byte table: every lead byte >= 0x80 times every trail byte.
const DOUBLE_BYTE_SLOTS: usize = 0x80 * 0x100;

pub struct SingleByteTable {
    name: &'static str,
    high: &'static [char; 128],
    bytes: HashMap<char, u8>,
}

impl SingleByteTable {
    fn from_high_half(name: &'static str, high: &'static [char; 128]) -> Self {
        let bytes = high
            .iter()
            .enumerate()
            .map(|(i, &ch)| (ch, 0x80 + i as u8))
            .collect();
        Self { name, high, bytes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The character a byte of this code page is displayed as. Bytes below 0x80
    /// are ASCII and not part of the table.
    pub fn char_for(&self, byte: u8) -> Option<char> {
        byte.checked_sub(0x80).map(|i| self.high[i as usize])
    }

    /// The byte `ch` was misread from, if the table knows it.
    pub fn lookup(&self, ch: char) -> Option<u8> {
        self.bytes.get(&ch).copied()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub struct DoubleByteTable {
    name: &'static str,
    chars: Box<[Option<char>]>,
}

impl DoubleByteTable {
    /// Derives the pair table from an `encoding_rs` decoder. A pair is mapped only
    /// when decoding exactly those two bytes yields exactly one character.
    fn from_encoding(name: &'static str, encoding: &'static encoding_rs::Encoding) -> Self {
        let mut chars = vec![None; DOUBLE_BYTE_SLOTS].into_boxed_slice();
        for lead in 0x80u8..=0xFF {
            for trail in 0x00u8..=0xFF {
                let pair = [lead, trail];
                let decoded = encoding.decode_without_bom_handling_and_without_replacement(&pair);
                if let Some(text) = decoded {
                    let mut it = text.chars();
                    if let (Some(ch), None) = (it.next(), it.next()) {
                        chars[Self::slot(Self::key(lead, trail))] = Some(ch);
                    }
                }
            }
        }
        log::debug!(
            "built {} table: {} mapped pairs",
            name,
            chars.iter().filter(|c| c.is_some()).count()
        );
        Self { name, chars }
    }

    pub fn key(lead: u8, trail: u8) -> u16 {
        ((lead as u16) << 8) | trail as u16
    }

    fn slot(key: u16) -> usize {
        key as usize - 0x8000
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Character for a `lead << 8 | trail` key. Keys with a lead byte below 0x80
    /// are never pairs and always miss.
    pub fn lookup(&self, key: u16) -> Option<char> {
        if key < 0x8000 {
            return None;
        }
        self.chars[Self::slot(key)]
    }
}

static CP437: LazyLock<SingleByteTable> =
    LazyLock::new(|| SingleByteTable::from_high_half("cp437", &CP437_HIGH));

static CP932: LazyLock<DoubleByteTable> =
    LazyLock::new(|| DoubleByteTable::from_encoding("cp932", encoding_rs::SHIFT_JIS));

static CP936: LazyLock<DoubleByteTable> =
    LazyLock::new(|| DoubleByteTable::from_encoding("cp936", encoding_rs::GBK));

pub fn cp437() -> &'static SingleByteTable {
    &CP437
}

pub fn cp932() -> &'static DoubleByteTable {
    &CP932
}

pub fn cp936() -> &'static DoubleByteTable {
    &CP936
}

/// Builds every table now instead of on first use.
pub fn init() {
    LazyLock::force(&CP437);
    LazyLock::force(&CP932);
    LazyLock::force(&CP936);
}
