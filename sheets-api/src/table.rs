//! Rectangular tables as read from a worksheet: a header row naming the columns, then data rows.
//!
//! Spreadsheet backends return ragged rows (trailing empty cells are omitted), so every row is
//! padded with [`Cell::Empty`] up to the header width. Cells past the last header are dropped.

use std::fmt;

use anyhow::{Result, bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One cell value, typed the way the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Text cells from CSV exports and form responses; blank text is treated as empty.
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(text.to_owned())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
            Self::Empty => Ok(()),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    worksheet: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(worksheet: String, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self {
            worksheet,
            headers,
            rows,
        }
    }

    /// Builds a table from raw worksheet values, taking the first row as the header row. A
    /// worksheet with no values at all yields a table with no columns.
    pub fn from_values(worksheet: String, values: Vec<Vec<Cell>>) -> Self {
        let mut values = values.into_iter();
        let headers = values
            .next()
            .map(|header_row| {
                header_row
                    .iter()
                    .map(|cell| cell.to_string().trim().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(worksheet, headers, values.collect())
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column with exactly this header.
    pub fn column(&self, name: &str) -> Result<usize> {
        match self.headers.iter().position(|header| header == name) {
            Some(index) => Ok(index),
            None => bail!(
                "worksheet `{}` has no column `{name}` (columns: {})",
                self.worksheet,
                self.headers.iter().format(", ")
            ),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            headers: &self.headers,
            cells,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    pub fn get(&self, index: usize) -> &'a Cell {
        self.cells.get(index).unwrap_or(&EMPTY)
    }

    /// `(header, cell)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> + 'a {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}
