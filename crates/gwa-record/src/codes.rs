//! Restraint codes: `free`, `pin`, `fix`, or a run of `x y z xx yy zz`
//! tokens with translations before rotations, e.g. `xyzz` (x, y, zz).
//! End release codes: six `F`/`R`/`K` characters, one per dof.

use crate::{RecordError, Result};

const ROTATIONS: [(&str, usize); 3] = [("zz", 5), ("yy", 4), ("xx", 3)];
const TRANSLATIONS: [char; 3] = ['x', 'y', 'z'];

/// Decodes a restraint code into `[x, y, z, xx, yy, zz]` flags.
pub fn parse_restraint(code: &str) -> Result<[bool; 6]> {
    let lowered = code.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "" | "free" => return Ok([false; 6]),
        "pin" => return Ok([true, true, true, false, false, false]),
        "fix" => return Ok([true; 6]),
        _ => {}
    }

    let mut flags = [false; 6];
    let mut rest = lowered.as_str();
    // Rotations trail the code, so peel them off from the end first.
    for (token, slot) in ROTATIONS {
        if let Some(head) = rest.strip_suffix(token) {
            flags[slot] = true;
            rest = head;
        }
    }

    let mut next = 0usize;
    for ch in rest.chars() {
        let position = TRANSLATIONS[next..]
            .iter()
            .position(|t| *t == ch)
            .ok_or_else(|| RecordError::Restraint(code.to_string()))?;
        flags[next + position] = true;
        next += position + 1;
    }

    Ok(flags)
}

pub fn format_restraint(flags: [bool; 6]) -> String {
    match flags {
        [false, false, false, false, false, false] => "free".to_string(),
        [true, true, true, false, false, false] => "pin".to_string(),
        [true, true, true, true, true, true] => "fix".to_string(),
        _ => ["x", "y", "z", "xx", "yy", "zz"]
            .iter()
            .zip(flags)
            .filter(|(_, set)| *set)
            .map(|(token, _)| *token)
            .collect(),
    }
}

/// Decodes a six-character end release code. Each character is `F`
/// (fixed), `R` (released) or `K` (spring, stiffness given separately).
pub fn parse_release_code(code: &str) -> Result<[u8; 6]> {
    let upper = code.trim().to_ascii_uppercase();
    let bytes = upper.as_bytes();
    if bytes.len() != 6 || !bytes.iter().all(|b| matches!(b, b'F' | b'R' | b'K')) {
        return Err(RecordError::Release(code.to_string()));
    }
    let mut flags = [b'F'; 6];
    flags.copy_from_slice(bytes);
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_codes() {
        assert_eq!(parse_restraint("FREE").unwrap(), [false; 6]);
        assert_eq!(parse_restraint("pin").unwrap(), [true, true, true, false, false, false]);
        assert_eq!(parse_restraint("fix").unwrap(), [true; 6]);
    }

    #[test]
    fn separates_rotations_from_translations() {
        assert_eq!(parse_restraint("xx").unwrap(), [false, false, false, true, false, false]);
        assert_eq!(parse_restraint("xxx").unwrap(), [true, false, false, true, false, false]);
        assert_eq!(parse_restraint("xzyyzz").unwrap(), [true, false, true, false, true, true]);
    }

    #[test]
    fn every_flag_combination_survives_formatting() {
        for bits in 0u8..64 {
            let flags: [bool; 6] = std::array::from_fn(|i| bits & (1 << i) != 0);
            let code = format_restraint(flags);
            assert_eq!(parse_restraint(&code).unwrap(), flags, "code {code}");
        }
    }

    #[test]
    fn rejects_out_of_order_tokens() {
        assert!(parse_restraint("zx").is_err());
        assert!(parse_restraint("xq").is_err());
    }

    #[test]
    fn release_codes_are_six_flags() {
        assert_eq!(parse_release_code("ffrrrk").unwrap(), *b"FFRRRK");
        assert!(parse_release_code("FFRRR").is_err());
        assert!(parse_release_code("FFRRRX").is_err());
    }
}
