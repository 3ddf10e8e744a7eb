use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::source::TableSource;
use crate::table::{Cell, Table};

/// Reads worksheets from a directory of CSV exports, one `<worksheet>.csv` file per tab. Useful
/// offline and for demos, where the live spreadsheet is not reachable.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, worksheet: &str) -> PathBuf {
        self.dir.join(format!("{worksheet}.csv"))
    }
}

impl TableSource for CsvDirSource {
    #[tracing::instrument(skip(self), err)]
    async fn read_table(&self, worksheet: &str) -> Result<Table> {
        let path = self.path_for(worksheet);
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("could not read worksheet file `{}`", path.display()))?;
        let table = parse_csv(worksheet, &data)
            .with_context(|| format!("could not parse worksheet file `{}`", path.display()))?;
        debug!(rows = table.len(), "read worksheet from csv");
        Ok(table)
    }
}

pub fn parse_csv(worksheet: &str, data: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let values = reader
        .records()
        .map(|record| {
            record.map(|record| record.iter().map(Cell::from_text).collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table::from_values(worksheet.to_owned(), values))
}
