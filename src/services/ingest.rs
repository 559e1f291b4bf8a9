//! CSV ingestion for bulk row uploads.
//!
//! Turns a delimited file of survey responses into upload-ready rows: one
//! column holds the answer text, an optional column the language hint, and
//! every remaining column is carried along as an auxiliary column.

use std::io::Read;

use crate::models::row::{Answer, QuestionRef, Row};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    #[error("file contains no usable data rows")]
    Empty,
}

/// Rows parsed from a delimited file, ready for upload.
#[derive(Debug)]
pub struct ParsedRows {
    /// Auxiliary column names in header order, matching each row's values.
    pub auxiliary_column_names: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse CSV data into rows answering `question`.
///
/// Records with a blank text cell are skipped; the service rejects empty
/// answer texts.
pub fn rows_from_csv<R: Read>(
    reader: R,
    question: &str,
    text_column: &str,
    source_language_column: Option<&str>,
) -> Result<ParsedRows, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let text_idx = headers
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| IngestError::MissingColumn(text_column.to_string()))?;
    let lang_idx = match source_language_column {
        Some(column) => Some(
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IngestError::MissingColumn(column.to_string()))?,
        ),
        None => None,
    };

    let aux_indices: Vec<usize> = (0..headers.len())
        .filter(|&i| i != text_idx && Some(i) != lang_idx)
        .collect();
    let auxiliary_column_names = aux_indices
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in csv_reader.records() {
        let record = result?;

        let text = record.get(text_idx).unwrap_or("").trim();
        if text.is_empty() {
            skipped += 1;
            continue;
        }

        let mut answer = Answer::new(text, QuestionRef::Name(question.to_string()));
        if let Some(idx) = lang_idx {
            answer.source_language = record.get(idx).unwrap_or("").trim().to_string();
        }

        rows.push(Row {
            auxiliary_columns: aux_indices
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect(),
            answers: vec![answer],
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped records with blank answer text");
    }
    if rows.is_empty() {
        return Err(IngestError::Empty);
    }

    Ok(ParsedRows {
        auxiliary_column_names,
        rows,
    })
}
