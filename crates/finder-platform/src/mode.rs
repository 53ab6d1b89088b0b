//! Conversions between packed mode bits, octal digit strings and the
//! symbolic `rwxr-xr-x` form shown by `ls -l`.

use thiserror::Error;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

const S_ISUID: u32 = 0o4000;
const S_ISGID: u32 = 0o2000;
const S_ISVTX: u32 = 0o1000;

/// Largest value a packed mode can hold (type bits included).
const MODE_MAX: u32 = 0o177777;

/// (shift, special bit, char used when the special bit is set) per triad
const TRIADS: [(u32, u32, char); 3] = [(6, S_ISUID, 's'), (3, S_ISGID, 's'), (0, S_ISVTX, 't')];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("invalid octal mode: {0:?}")]
    InvalidOctal(String),
    #[error("invalid symbolic mode: {0:?}")]
    InvalidSymbolic(String),
}

fn type_char(mode: u32) -> Option<char> {
    match mode & S_IFMT {
        0 => None,
        S_IFREG => Some('-'),
        S_IFDIR => Some('d'),
        S_IFLNK => Some('l'),
        S_IFCHR => Some('c'),
        S_IFBLK => Some('b'),
        S_IFIFO => Some('p'),
        S_IFSOCK => Some('s'),
        _ => Some('?'),
    }
}

/// Render a packed mode. Ten characters when the file type bits are set
/// (`drwxr-xr-x`), nine otherwise (`rwxr-xr-x`).
pub fn mode_to_symbolic(mode: u32) -> String {
    let mut s = String::with_capacity(10);
    if let Some(c) = type_char(mode) {
        s.push(c);
    }
    for (shift, special, special_char) in TRIADS {
        let bits = (mode >> shift) & 7;
        s.push(if bits & 4 != 0 { 'r' } else { '-' });
        s.push(if bits & 2 != 0 { 'w' } else { '-' });
        s.push(match (mode & special != 0, bits & 1 != 0) {
            (true, true) => special_char,
            (true, false) => special_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    s
}

/// Parse a 9 or 10 character symbolic mode back into permission and
/// special bits. A leading type character is validated and dropped.
pub fn symbolic_to_mode(symbolic: &str) -> Result<u32, ModeError> {
    let invalid = || ModeError::InvalidSymbolic(symbolic.to_string());

    let chars: Vec<char> = symbolic.chars().collect();
    let perms = match chars.len() {
        9 => &chars[..],
        10 if "-dlcbps?".contains(chars[0]) => &chars[1..],
        _ => return Err(invalid()),
    };

    let mut mode = 0;
    for ((shift, special, special_char), triad) in TRIADS.into_iter().zip(perms.chunks(3)) {
        match triad[0] {
            'r' => mode |= 4 << shift,
            '-' => {}
            _ => return Err(invalid()),
        }
        match triad[1] {
            'w' => mode |= 2 << shift,
            '-' => {}
            _ => return Err(invalid()),
        }
        match triad[2] {
            'x' => mode |= 1 << shift,
            '-' => {}
            c if c == special_char => mode |= special | (1 << shift),
            c if c == special_char.to_ascii_uppercase() => mode |= special,
            _ => return Err(invalid()),
        }
    }
    Ok(mode)
}

/// Parse an octal digit string such as `755`, `0644`, `0o4755` or a full
/// `100644` including type bits.
pub fn parse_octal(octal: &str) -> Result<u32, ModeError> {
    let invalid = || ModeError::InvalidOctal(octal.to_string());

    let digits = octal.trim();
    let digits = digits.strip_prefix("0o").unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(invalid());
    }
    let value = u32::from_str_radix(digits, 8).map_err(|_| invalid())?;
    if value > MODE_MAX {
        return Err(invalid());
    }
    Ok(value)
}

pub fn octal_to_symbolic(octal: &str) -> Result<String, ModeError> {
    parse_octal(octal).map(mode_to_symbolic)
}

/// Octal digits for the permission and special bits of a packed mode, at
/// least three digits wide. Type bits are dropped (`0o100644` -> `644`).
pub fn mode_to_octal(mode: u32) -> String {
    format!("{:03o}", mode & 0o7777)
}

/// Octal digits for the permission and special bits of a symbolic mode
/// (`rw-r--r--` -> `644`, `rwsr-xr-x` -> `4755`).
pub fn symbolic_to_octal(symbolic: &str) -> Result<String, ModeError> {
    symbolic_to_mode(symbolic).map(mode_to_octal)
}

/// Accept either notation, as typed on a command line. Only permission and
/// special bits are returned.
pub fn parse_mode(value: &str) -> Result<u32, ModeError> {
    let trimmed = value.trim();
    let is_octal = trimmed
        .strip_prefix("0o")
        .unwrap_or(trimmed)
        .bytes()
        .all(|b| b.is_ascii_digit());
    if is_octal {
        parse_octal(trimmed).map(|mode| mode & 0o7777)
    } else {
        symbolic_to_mode(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_file_mode() {
        assert_eq!(mode_to_symbolic(0o100644), "-rw-r--r--");
        assert_eq!(mode_to_symbolic(0o040755), "drwxr-xr-x");
        assert_eq!(mode_to_symbolic(0o120777), "lrwxrwxrwx");
    }

    #[test]
    fn test_permission_bits_only() {
        assert_eq!(mode_to_symbolic(0o755), "rwxr-xr-x");
        assert_eq!(mode_to_symbolic(0), "---------");
    }

    #[test]
    fn test_special_bits() {
        assert_eq!(mode_to_symbolic(0o4755), "rwsr-xr-x");
        assert_eq!(mode_to_symbolic(0o2644), "rw-r-Sr--");
        assert_eq!(mode_to_symbolic(0o041777), "drwxrwxrwt");
        assert_eq!(mode_to_symbolic(0o1644), "rw-r--r-T");
        assert_eq!(symbolic_to_octal("rwsr-xr-x").unwrap(), "4755");
        assert_eq!(symbolic_to_octal("drwxrwxrwt").unwrap(), "1777");
    }

    #[test]
    fn test_symbolic_to_octal() {
        assert_eq!(symbolic_to_octal("-rw-r--r--").unwrap(), "644");
        assert_eq!(symbolic_to_octal("rwx------").unwrap(), "700");
        assert_eq!(symbolic_to_octal("---------").unwrap(), "000");
    }

    #[test]
    fn test_mode_to_octal_agrees_with_symbolic_path() {
        for v in [0o100644, 0o040755, 0o104755, 0o041777, 0o120777, 0o000, 0o7777] {
            let via_symbolic = symbolic_to_octal(&mode_to_symbolic(v)).unwrap();
            assert_eq!(mode_to_octal(v), via_symbolic, "mode {:o}", v);
        }
        assert_eq!(mode_to_octal(0o100644), "644");
        assert_eq!(mode_to_octal(0o5), "005");
    }

    #[test]
    fn test_octal_to_symbolic() {
        assert_eq!(octal_to_symbolic("755").unwrap(), "rwxr-xr-x");
        assert_eq!(octal_to_symbolic("0o600").unwrap(), "rw-------");
        assert_eq!(octal_to_symbolic("100644").unwrap(), "-rw-r--r--");
    }

    #[test]
    fn test_roundtrip_all_permission_values() {
        for v in 0..=0o7777u32 {
            let symbolic = mode_to_symbolic(v);
            let octal = symbolic_to_octal(&symbolic).unwrap();
            assert_eq!(octal_to_symbolic(&octal).unwrap(), symbolic, "mode {:o}", v);
            assert_eq!(parse_octal(&octal).unwrap(), v);
        }
    }

    #[test]
    fn test_roundtrip_with_type_bits() {
        for v in [0o100644, 0o040755, 0o120777, 0o020620, 0o060660, 0o010644, 0o140755] {
            let symbolic = mode_to_symbolic(v);
            assert_eq!(symbolic.len(), 10);
            assert_eq!(symbolic_to_mode(&symbolic).unwrap(), v & 0o7777);
        }
    }

    #[test]
    fn test_invalid_symbolic() {
        assert!(symbolic_to_mode("rwx").is_err());
        assert!(symbolic_to_mode("xwrr-xr-x").is_err());
        assert!(symbolic_to_mode("zrwxr-xr-x").is_err());
        assert!(symbolic_to_mode("rwxr-xr-xx").is_err());
    }

    #[test]
    fn test_invalid_octal() {
        assert!(parse_octal("").is_err());
        assert!(parse_octal("789").is_err());
        assert!(parse_octal("-644").is_err());
        assert!(parse_octal("1777777").is_err());
    }

    #[test]
    fn test_parse_mode_either_notation() {
        assert_eq!(parse_mode("644").unwrap(), 0o644);
        assert_eq!(parse_mode("0o755").unwrap(), 0o755);
        assert_eq!(parse_mode("rw-------").unwrap(), 0o600);
        assert_eq!(parse_mode("100644").unwrap(), 0o644);
        assert!(parse_mode("9").is_err());
    }
}
