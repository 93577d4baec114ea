//! Tokenizing helpers shared by both text formats.

use std::str::FromStr;

use crate::error::LineError;

/// A directive line with comments/blank lines already filtered out.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Directive<'a> {
    /// 1-based.
    pub line: usize,
    pub keyword: &'a str,
    /// Everything after the keyword, trimmed. Used for names that may contain spaces.
    pub rest: &'a str,
}

impl<'a> Directive<'a> {
    pub fn args(self) -> impl Iterator<Item = &'a str> {
        self.rest.split_whitespace()
    }
}

/// Iterates the non-blank, non-comment lines of `text`.
pub(crate) fn directives(text: &str) -> impl Iterator<Item = Directive<'_>> {
    text.lines().enumerate().filter_map(|(line_no, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };
        Some(Directive {
            line: line_no + 1,
            keyword,
            rest,
        })
    })
}

pub(crate) fn parse_number<T: FromStr>(token: &str) -> Result<T, LineError> {
    token.parse::<T>().map_err(|_| LineError::MalformedNumber {
        token: token.to_owned(),
    })
}

/// Parses exactly `N` floats.
pub(crate) fn exact_floats<const N: usize>(args: &[&str]) -> Result<[f32; N], LineError> {
    if args.len() < N {
        return Err(LineError::NotEnoughData {
            found: args.len(),
            expected: N,
        });
    }
    if args.len() > N {
        return Err(LineError::TooManyValues {
            found: args.len(),
            expected: N,
        });
    }
    leading_floats(args)
}

/// Parses the first `N` floats, ignoring any trailing tokens.
pub(crate) fn leading_floats<const N: usize>(args: &[&str]) -> Result<[f32; N], LineError> {
    if args.len() < N {
        return Err(LineError::NotEnoughData {
            found: args.len(),
            expected: N,
        });
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(args) {
        *slot = parse_number(token)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "\n# header\n   \nv 1 2 3\n  # indented comment\nusemtl  red  paint \n";
        let found: Vec<_> = directives(text).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, 4);
        assert_eq!(found[0].keyword, "v");
        assert_eq!(found[1].keyword, "usemtl");
        assert_eq!(found[1].rest, "red  paint");
    }

    #[test]
    fn float_arity_is_checked() {
        assert_eq!(exact_floats::<3>(&["1", "0", "0"]), Ok([1.0, 0.0, 0.0]));
        assert_eq!(
            exact_floats::<3>(&["1", "0"]),
            Err(LineError::NotEnoughData { found: 2, expected: 3 })
        );
        assert_eq!(
            exact_floats::<1>(&["1", "2"]),
            Err(LineError::TooManyValues { found: 2, expected: 1 })
        );
        assert_eq!(leading_floats::<2>(&["0.5", "0.25", "0"]), Ok([0.5, 0.25]));
        assert_eq!(
            leading_floats::<1>(&["abc"]),
            Err(LineError::MalformedNumber { token: "abc".into() })
        );
    }
}
