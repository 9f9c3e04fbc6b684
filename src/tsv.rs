//! Tab-separated pair records
//!
//! One record per line, the first two tab-separated fields are the pair.
//! Extra fields are ignored; blank or short records are skipped.
//! Fields are written unescaped, so a field can never hold a tab, a line
//! feed or a carriage return.

use crate::symbol::Pair;

/// Characters the format uses as separators
pub const SEPARATORS: [char; 3] = ['\t', '\n', '\r'];

/// Whether `field` survives a render/parse cycle unchanged
pub fn is_encodable(field: &str) -> bool {
    !field.contains(SEPARATORS)
}

/// A usable record from a TSV text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// 1-based line number in the source text
    pub line: usize,
    pub first: &'a str,
    pub second: &'a str,
}

/// Parse `text` into records, skipping lines without two non-empty fields
pub fn parse(text: &str) -> Vec<Record<'_>> {
    text.split('\n')
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let mut fields = line.split('\t');
            let first = fields.next()?;
            let second = fields.next()?;
            if first.is_empty() || second.is_empty() {
                return None;
            }
            Some(Record {
                line: i + 1,
                first,
                second,
            })
        })
        .collect()
}

/// Render pairs as `canon\tsymbol` lines joined by newlines, no trailing newline.
///
/// Fails with the first pair holding a field that is not [`is_encodable`].
pub fn render(pairs: &[Pair]) -> std::result::Result<String, &Pair> {
    if let Some(bad) = pairs
        .iter()
        .find(|p| !is_encodable(&p.canon) || !is_encodable(&p.symbol))
    {
        return Err(bad);
    }
    Ok(pairs
        .iter()
        .map(Pair::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_line_numbers() {
        let records = parse("a\tb\n\nshort\nc\td\te\r\n");
        assert_eq!(
            records,
            vec![
                Record { line: 1, first: "a", second: "b" },
                Record { line: 4, first: "c", second: "d" },
            ]
        );
    }

    #[test]
    fn test_render_has_no_trailing_newline() {
        let text = render(&[Pair::new("a", "a"), Pair::new("a", "b")]).unwrap();
        assert_eq!(text, "a\ta\na\tb");
        assert_eq!(render(&[]).unwrap(), "");
    }

    #[test]
    fn test_render_refuses_separator_characters() {
        let rows = [
            Pair::new("a", "a"),
            Pair::new("x\ty", "z"),
            Pair::new("w", "v\r"),
        ];
        assert_eq!(render(&rows), Err(&rows[1]));
        assert_eq!(render(&rows[2..]), Err(&rows[2]));
        assert!(render(&[Pair::new("a b", "\"quoted\" é")]).is_ok());

        assert!(is_encodable("http://example.org/a b"));
        for bad in ["x\ty", "line\nbreak", "v\r"] {
            assert!(!is_encodable(bad), "{:?}", bad);
        }
    }
}
