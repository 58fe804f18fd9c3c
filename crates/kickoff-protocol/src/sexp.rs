//! A small reader for the server's parenthesized message syntax.
//!
//! Messages look like `(see 12 ((b) 4.5 -10) ((f c) 20.1 3))`: nested lists
//! of whitespace-separated atoms. Double-quoted atoms (`"my team"`) may
//! contain spaces and parentheses; the quotes are stripped. A quote in the
//! middle of a word (`it"s`) is an ordinary character.

use std::fmt;

/// A node in a parsed message: a bare or quoted atom, or a parenthesized
/// list of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    /// The atom's text, or `None` for a list.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(atom) => Some(atom),
            Self::List(_) => None,
        }
    }

    /// The list's items, or `None` for an atom.
    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            Self::Atom(_) => None,
            Self::List(items) => Some(items),
        }
    }

    /// The atom as a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_atom()?
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    /// The atom as an unsigned integer, e.g. a cycle time.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_atom()?.parse().ok()
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => f.write_str(atom),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parses the first complete list in `text`. Anything after its closing
/// parenthesis is ignored, the way the server ignores trailing bytes.
pub fn parse(text: &str) -> Result<SExpr, String> {
    let bytes = text.as_bytes();
    let mut stack: Vec<Vec<SExpr>> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'(' => {
                stack.push(Vec::new());
                pos += 1;
            }
            b')' => {
                let items = stack
                    .pop()
                    .ok_or_else(|| format!("unexpected `)` at byte {pos}"))?;
                let list = SExpr::List(items);
                match stack.last_mut() {
                    Some(parent) => parent.push(list),
                    None => return Ok(list),
                }
                pos += 1;
            }
            b'"' if starts_token(bytes, pos) => {
                let start = pos + 1;
                let len = text[start..]
                    .find('"')
                    .ok_or_else(|| format!("unterminated string at byte {pos}"))?;
                push_atom(&mut stack, &text[start..start + len], pos)?;
                pos = start + len + 1;
            }
            b if b.is_ascii_whitespace() => pos += 1,
            _ => {
                let start = pos;
                while pos < bytes.len() && !is_delimiter(bytes[pos]) {
                    pos += 1;
                }
                push_atom(&mut stack, &text[start..pos], start)?;
            }
        }
    }

    Err("unbalanced parentheses".to_string())
}

fn push_atom(stack: &mut [Vec<SExpr>], atom: &str, pos: usize) -> Result<(), String> {
    stack
        .last_mut()
        .ok_or_else(|| format!("atom outside of a list at byte {pos}"))?
        .push(SExpr::Atom(atom.to_string()));
    Ok(())
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'(' || b == b')'
}

/// Byte index of the parenthesis closing the one `text` starts with.
/// Parentheses inside double quotes don't count; a quote only opens a
/// string at the start of a token, so `it"s` is plain text.
pub(crate) fn closing_paren(text: &str) -> Option<usize> {
    if !text.starts_with('(') {
        return None;
    }
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quoted = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' if quoted => quoted = false,
            b'"' if starts_token(bytes, i) => quoted = true,
            b'(' if !quoted => depth += 1,
            b')' if !quoted => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether byte `i` begins a token: first byte, or right after whitespace
/// or an opening parenthesis.
fn starts_token(bytes: &[u8], i: usize) -> bool {
    i == 0 || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b'('
}
