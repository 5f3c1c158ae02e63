//! Decode/encode between CSV text and occurrence rows.

use crate::csv::schema::{DecodedRow, Fields, HeaderSchema};
use crate::csv::tokenizer::parse_rows;
use crate::model::occurrence::{new_occurrence_id, now_timestamp, Occurrence};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

const UTF8_BOM: char = '\u{feff}';

/// Header did not match any registered schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvFormatError {
    UnrecognizedHeader { header: String },
}

impl Display for CsvFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedHeader { header } => write!(
                f,
                "invalid CSV header `{header}`; expected `{}`",
                HeaderSchema::Current.header_line()
            ),
        }
    }
}

impl Error for CsvFormatError {}

/// Result of decoding one CSV document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCsv {
    /// Schema detected from the header row.
    pub schema: HeaderSchema,
    /// Non-blank data rows, in file order.
    pub rows: Vec<DecodedRow>,
}

/// Decodes CSV text into schema-tagged rows.
///
/// Empty text decodes to zero rows under the current schema. Rows made only of
/// empty cells are dropped. Blank `occurrenceId`, `createdAt` and `updatedAt`
/// cells are backfilled with a fresh ID and the current time.
///
/// # Errors
/// Returns `CsvFormatError::UnrecognizedHeader` with the header line as read.
pub fn decode(text: &str) -> Result<DecodedCsv, CsvFormatError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut rows = parse_rows(text).into_iter();

    let Some(header) = rows.next() else {
        return Ok(DecodedCsv {
            schema: HeaderSchema::Current,
            rows: Vec::new(),
        });
    };

    let schema = HeaderSchema::detect(&header).ok_or_else(|| CsvFormatError::UnrecognizedHeader {
        header: header.join(","),
    })?;

    let now = now_timestamp();
    let mut decoded = Vec::new();
    let mut blank_rows = 0usize;
    for (index, fields) in rows.enumerate() {
        if fields.iter().all(String::is_empty) {
            blank_rows += 1;
            continue;
        }
        // Header is line 1, first data row is line 2.
        let mut row = schema.row(index + 2, Fields(fields));
        row.backfill(new_occurrence_id, &now);
        decoded.push(row);
    }

    debug!(
        "event=csv_decode module=csv status=ok schema={:?} rows={} blank_rows={}",
        schema,
        decoded.len(),
        blank_rows
    );

    Ok(DecodedCsv {
        schema,
        rows: decoded,
    })
}

/// Encodes occurrences under the current header, in canonical order
/// (`date` ascending, then `created_at` ascending).
pub fn encode<'a, I>(occurrences: I) -> String
where
    I: IntoIterator<Item = &'a Occurrence>,
{
    let mut ordered: Vec<&Occurrence> = occurrences.into_iter().collect();
    ordered.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let mut lines = Vec::with_capacity(ordered.len() + 1);
    lines.push(HeaderSchema::Current.header_line());
    for occurrence in ordered {
        let duration = occurrence.duration_minutes.to_string();
        let cells = [
            occurrence.occurrence_id.as_str(),
            occurrence.person_id.as_str(),
            occurrence.person_name.as_str(),
            occurrence.occurrence_type.as_str(),
            occurrence.date.as_str(),
            duration.as_str(),
            occurrence.created_at.as_str(),
            occurrence.updated_at.as_str(),
        ];
        let quoted: Vec<String> = cells.iter().map(|cell| quote(cell)).collect();
        lines.push(quoted.join(","));
    }

    lines.join("\n")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::person::PersonId;

    fn occurrence(id: &str, date: &str, created_at: &str) -> Occurrence {
        Occurrence {
            occurrence_id: id.to_string(),
            person_id: PersonId::new("P0001"),
            person_name: "Ana".to_string(),
            occurrence_type: "Visita".to_string(),
            date: date.to_string(),
            duration_minutes: 30,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    #[test]
    fn encode_sorts_by_date_then_created_at() {
        let items = vec![
            occurrence("c", "2024-01-02", "2024-01-02T08:00:00.000Z"),
            occurrence("b", "2024-01-01", "2024-01-01T09:00:00.000Z"),
            occurrence("a", "2024-01-01", "2024-01-01T08:00:00.000Z"),
        ];
        let text = encode(&items);
        let ids: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["\"a\"", "\"b\"", "\"c\""]);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn encode_quotes_every_cell_and_doubles_quotes() {
        let mut item = occurrence("x", "2024-01-01", "t");
        item.person_name = "Ana \"Nina\", Souza".to_string();
        let text = encode([&item]);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HeaderSchema::Current.header_line());
        assert_eq!(
            lines.next().unwrap(),
            "\"x\",\"P0001\",\"Ana \"\"Nina\"\", Souza\",\"Visita\",\"2024-01-01\",\"30\",\"t\",\"t\""
        );
    }

    #[test]
    fn decode_empty_text_yields_no_rows() {
        let decoded = decode("").unwrap();
        assert_eq!(decoded.schema, HeaderSchema::Current);
        assert!(decoded.rows.is_empty());
    }

    #[test]
    fn decode_rejects_unknown_header_with_literal_line() {
        let err = decode("id,name\n1,Ana").unwrap_err();
        assert_eq!(
            err,
            CsvFormatError::UnrecognizedHeader {
                header: "id,name".to_string()
            }
        );
        assert!(err.to_string().contains("id,name"));
    }

    #[test]
    fn decode_skips_blank_rows_and_backfills_ids_and_timestamps() {
        let text = format!(
            "\u{feff}{}\n\"\",\"P0001\",\"Ana\",\"Visita\",\"2024-01-01\",\"30\",\"\",\"\"\n,,,,,,,\n\n",
            HeaderSchema::Current.header_line()
        );
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded.rows.len(), 1);
        let row = &decoded.rows[0];
        assert_eq!(row.line(), 2);
        assert!(!row.occurrence_id().is_empty());
        assert!(!row.created_at().is_empty());
        assert_eq!(row.created_at(), row.updated_at());
    }
}
