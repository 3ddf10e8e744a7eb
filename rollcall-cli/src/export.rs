use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use librollcall::attendance::{RosterEntry, STATUS_COLUMN};

/// Writes roster entries with the id first, then the passthrough columns, then the status.
pub fn write_roster<'a>(
    path: &Path,
    id_column: &str,
    entries: impl IntoIterator<Item = &'a RosterEntry>,
) -> Result<()> {
    let mut writer =
        Writer::from_path(path).with_context(|| format!("could not create {}", path.display()))?;
    let mut entries = entries.into_iter().peekable();

    let mut header = vec![id_column];
    if let Some(first) = entries.peek() {
        header.extend(first.student().fields().iter().map(|(name, _)| name.as_str()));
    }
    header.push(STATUS_COLUMN);
    writer.write_record(&header)?;

    for entry in entries {
        let student = entry.student();
        let status = entry.status().to_string();
        let record = std::iter::once(student.id().as_str())
            .chain(student.fields().iter().map(|(_, value)| value.as_str()))
            .chain(std::iter::once(status.as_str()));
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}
