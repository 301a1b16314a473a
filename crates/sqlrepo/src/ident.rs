//! SQL identifier checks for table and column names.
//!
//! Table and column names are spliced into statement text, so every name is
//! checked before rendering. A name is one or more dot-separated parts; each
//! part is either
//!
//! - unquoted: `[A-Za-z_][A-Za-z0-9_$]*`, or
//! - double-quoted: any characters except NUL, with `"` escaped as `""`.

use crate::error::{RepoError, RepoResult};

/// Check that `name` is a safe SQL identifier. `what` names the role of the
/// identifier in the error message (e.g. `"table"`, `"column"`).
pub fn check_ident(what: &str, name: &str) -> RepoResult<()> {
    let invalid = |reason: &str| RepoError::query_build(format!("invalid {what} {name:?}: {reason}"));

    if name.is_empty() {
        return Err(invalid("empty identifier"));
    }
    if name.contains('\0') {
        return Err(invalid("contains NUL"));
    }

    let bytes = name.as_bytes();
    let mut i = 0;
    loop {
        if bytes.get(i) == Some(&b'"') {
            i += 1;
            let start = i;
            loop {
                match bytes.get(i) {
                    Some(b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
                    Some(b'"') => break,
                    Some(_) => i += 1,
                    None => return Err(invalid("unclosed quoted identifier")),
                }
            }
            if i == start {
                return Err(invalid("empty quoted identifier"));
            }
            i += 1;
        } else {
            match bytes.get(i) {
                Some(c) if c.is_ascii_alphabetic() || *c == b'_' => i += 1,
                Some(_) => return Err(invalid("must start with a letter or underscore")),
                None => return Err(invalid("empty identifier segment")),
            }
            while let Some(c) = bytes.get(i) {
                if c.is_ascii_alphanumeric() || *c == b'_' || *c == b'$' {
                    i += 1;
                } else {
                    break;
                }
            }
        }

        match bytes.get(i) {
            None => return Ok(()),
            Some(b'.') => i += 1,
            Some(_) => return Err(invalid("unexpected character")),
        }
    }
}
