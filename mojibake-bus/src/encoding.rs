use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::DecodeError;

/// A legacy encoding that may have been misapplied to the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// IBM PC code page 437 read as if it were the real character set.
    Cp437,
    /// Shift-JIS (Windows-31J).
    Cp932,
    /// Simplified Chinese GBK.
    Cp936,
}

/// How a stage consumes its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    /// UTF-8 rune in, one byte out.
    SingleByte,
    /// ASCII byte or lead/trail pair in, UTF-8 rune out.
    DoubleByte,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Cp437, Encoding::Cp932, Encoding::Cp936];

    pub fn kind(&self) -> StageKind {
        match self {
            Encoding::Cp437 => StageKind::SingleByte,
            Encoding::Cp932 | Encoding::Cp936 => StageKind::DoubleByte,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cp437 => "cp437",
            Encoding::Cp932 => "cp932",
            Encoding::Cp936 => "cp936",
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "cp473" is the transposed spelling found in older tooling
            "cp437" | "cp473" | "437" | "ibm437" => Ok(Encoding::Cp437),
            "cp932" | "932" | "shift_jis" | "shift-jis" | "sjis" | "windows-31j" => {
                Ok(Encoding::Cp932)
            }
            "cp936" | "936" | "gbk" => Ok(Encoding::Cp936),
            _ => Err(DecodeError::UnknownEncoding(s.to_string())),
        }
    }
}
