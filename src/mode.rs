use std::fmt;
use std::str::FromStr;

use crate::error::FsError;

/// Parsed open mode / 打开模式
///
/// `r` read, `w` write+truncate+create, `a` append+create, `x` exclusive
/// create, `+` adds the missing half of read/write. `b` is accepted and
/// ignored; `t` is rejected since every handle is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    pub reading: bool,
    pub writing: bool,
    pub appending: bool,
    pub truncate: bool,
    pub create: bool,
    pub exclusive: bool,
}

impl OpenMode {
    pub fn parse(mode: &str) -> Result<Self, FsError> {
        let invalid = || FsError::InvalidMode(mode.to_string());

        let mut primary: Option<char> = None;
        let mut update = false;
        for c in mode.chars() {
            match c {
                'r' | 'w' | 'a' | 'x' => {
                    if primary.replace(c).is_some() {
                        return Err(invalid());
                    }
                }
                '+' if !update => update = true,
                'b' => {}
                _ => return Err(invalid()),
            }
        }

        let mut m = match primary.ok_or_else(invalid)? {
            'r' => OpenMode { reading: true, ..Default::default() },
            'w' => OpenMode { writing: true, truncate: true, create: true, ..Default::default() },
            'a' => OpenMode { writing: true, appending: true, create: true, ..Default::default() },
            _ => OpenMode { writing: true, create: true, exclusive: true, ..Default::default() },
        };
        if update {
            m.reading = true;
            m.writing = true;
        }
        Ok(m)
    }

    pub fn read() -> Self {
        OpenMode { reading: true, ..Default::default() }
    }

    /// Whether opening with this mode may change the store / 是否会修改存储
    pub fn is_mutating(&self) -> bool {
        self.writing
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpenMode::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primary = if self.exclusive {
            "x"
        } else if self.appending {
            "a"
        } else if self.truncate {
            "w"
        } else {
            "r"
        };
        let update = self.reading && self.writing;
        write!(f, "{}{}b", primary, if update { "+" } else { "" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        let r = OpenMode::parse("rb").unwrap();
        assert!(r.reading && !r.writing && !r.create);

        let w = OpenMode::parse("w").unwrap();
        assert!(w.writing && w.truncate && w.create && !w.reading && !w.appending);

        let a = OpenMode::parse("ab").unwrap();
        assert!(a.writing && a.appending && a.create && !a.truncate);

        let x = OpenMode::parse("x").unwrap();
        assert!(x.writing && x.exclusive && x.create);

        let rp = OpenMode::parse("r+b").unwrap();
        assert!(rp.reading && rp.writing && !rp.create && !rp.truncate);

        let ap = OpenMode::parse("a+").unwrap();
        assert!(ap.reading && ap.writing && ap.appending);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "b", "rw", "rt", "q", "r++", "wa"] {
            assert_eq!(OpenMode::parse(bad), Err(FsError::InvalidMode(bad.to_string())));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(OpenMode::parse("r").unwrap().to_string(), "rb");
        assert_eq!(OpenMode::parse("w+").unwrap().to_string(), "w+b");
        assert_eq!(OpenMode::parse("ab").unwrap().to_string(), "ab");
        assert_eq!(OpenMode::parse("x").unwrap().to_string(), "xb");
    }
}
