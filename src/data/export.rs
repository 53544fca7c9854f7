use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::filter::WorkingSubset;

/// Default file name offered for an export of `topic`.
pub fn export_file_name(topic: Option<&str>) -> String {
    match topic.filter(|t| !t.is_empty()) {
        Some(topic) => format!("datos_salud_{topic}.csv"),
        None => "datos_salud_todos.csv".to_string(),
    }
}

/// Write the subset as CSV: dataset column order, one line per row, nulls as empty fields.
pub fn write_csv<W: Write>(subset: &WorkingSubset<'_>, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&subset.dataset().columns)?;
    for record in subset.records() {
        out.write_record(record.cells.iter().map(|c| c.to_field()))?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_bytes(subset: &WorkingSubset<'_>) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(subset, &mut buf)?;
    Ok(buf)
}

/// Export to a file chosen by the user.
pub fn save_csv(subset: &WorkingSubset<'_>, path: &Path) -> Result<()> {
    let bytes = to_csv_bytes(subset).context("serialising export")?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} rows to {}", subset.len(), path.display());
    Ok(())
}
