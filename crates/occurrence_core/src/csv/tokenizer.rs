//! Character-level CSV tokenizer.

/// Splits CSV text into rows of raw field values.
///
/// - `""` inside a quoted field yields one literal `"`.
/// - A `"` anywhere in a field toggles quoting, so `a"b,c"d` is one field `ab,cd`.
/// - `,` and line breaks inside quotes are kept as field content.
/// - `\n`, `\r` and `\r\n` outside quotes each end one row.
/// - A final row without a trailing line break is still returned.
///
/// An unterminated quote swallows the rest of the input into the last field.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut value = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    value.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut value));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut value));
                rows.push(std::mem::take(&mut row));
            }
            other => value.push(other),
        }
    }

    if !value.is_empty() || !row.is_empty() {
        row.push(value);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::parse_rows;

    fn owned(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn splits_plain_fields_and_rows() {
        assert_eq!(
            parse_rows("a,b\nc,d"),
            owned(&[&["a", "b"], &["c", "d"]])
        );
    }

    #[test]
    fn quoted_fields_keep_commas_newlines_and_escaped_quotes() {
        let rows = parse_rows("\"x,y\",\"line1\nline2\",\"say \"\"hi\"\"\"\n");
        assert_eq!(rows, owned(&[&["x,y", "line1\nline2", "say \"hi\""]]));
    }

    #[test]
    fn quotes_toggle_in_the_middle_of_a_field() {
        assert_eq!(parse_rows("a\"b,c\"d,e"), owned(&[&["ab,cd", "e"]]));
    }

    #[test]
    fn crlf_and_lone_cr_each_end_one_row() {
        assert_eq!(
            parse_rows("a\r\nb\rc\n"),
            owned(&[&["a"], &["b"], &["c"]])
        );
    }

    #[test]
    fn blank_lines_become_single_empty_field_rows() {
        assert_eq!(parse_rows("a\n\nb"), owned(&[&["a"], &[""], &["b"]]));
    }

    #[test]
    fn trailing_separator_emits_empty_last_field() {
        assert_eq!(parse_rows("a,"), owned(&[&["a", ""]]));
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse_rows("").is_empty());
    }
}
