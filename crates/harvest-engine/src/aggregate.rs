//! Collects records per target index and flattens them into one table.

use crate::error::SinkError;
use crate::model::{BusinessRow, ObjectKind, ProfileRow, Record, ReviewRow};
use crate::orchestrator::RunState;
use crate::selection::{SelectionMode, SelectionSet};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Default)]
pub struct Aggregator {
    records: BTreeMap<usize, Record>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the record of `index`, returning the one it replaced.
    pub fn insert(&mut self, index: usize, record: Record) -> Option<Record> {
        self.records.insert(index, record)
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(&index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.keys().copied()
    }

    pub fn row_count(&self) -> usize {
        self.records.values().map(Record::row_count).sum()
    }

    /// Flattens every record of `kind` in index order. `None` when nothing was collected.
    pub fn table(&self, kind: ObjectKind) -> Option<ResultTable> {
        if self.records.is_empty() {
            return None;
        }

        let mut rows = TableRows::empty(kind);
        for (index, record) in &self.records {
            match (&mut rows, record) {
                (TableRows::Profile(rows), Record::Profile(row)) => rows.push(row.clone()),
                (TableRows::Review(rows), Record::Reviews(items)) => {
                    rows.extend(items.iter().cloned())
                }
                (TableRows::Business(rows), Record::Business(row)) => rows.push(row.clone()),
                (_, other) => warn!(
                    "Index {} holds a {} record in a {} run; leaving it out",
                    index,
                    other.kind(),
                    kind
                ),
            }
        }
        Some(ResultTable { kind, rows })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TableRows {
    Profile(Vec<ProfileRow>),
    Review(Vec<ReviewRow>),
    Business(Vec<BusinessRow>),
}

impl TableRows {
    fn empty(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Profile => TableRows::Profile(Vec::new()),
            ObjectKind::Review => TableRows::Review(Vec::new()),
            ObjectKind::Business => TableRows::Business(Vec::new()),
        }
    }
}

/// Header plus rows of one run, in the fixed column order of its object kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    kind: ObjectKind,
    rows: TableRows,
}

impl ResultTable {
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn header(&self) -> &'static [&'static str] {
        self.kind.columns()
    }

    pub fn len(&self) -> usize {
        match &self.rows {
            TableRows::Profile(rows) => rows.len(),
            TableRows::Review(rows) => rows.len(),
            TableRows::Business(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(self.header())?;
        match &self.rows {
            TableRows::Profile(rows) => write_rows(&mut writer, rows)?,
            TableRows::Review(rows) => write_rows(&mut writer, rows)?,
            TableRows::Business(rows) => write_rows(&mut writer, rows)?,
        }
        writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

fn write_rows<T: Serialize>(
    writer: &mut csv::Writer<Vec<u8>>,
    rows: &[T],
) -> Result<(), csv::Error> {
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(())
}

/// Name of the result file for a finished run.
///
/// With `index_suffix` off the name only carries the object kind. Otherwise it
/// encodes the selection: the success count for explicit indices, the page
/// span and target for partial-page runs, and the index span plus failure
/// count for ranges.
pub fn output_file_name(
    prefix: &str,
    kind: ObjectKind,
    selection: &SelectionSet,
    state: &RunState,
    index_suffix: bool,
) -> String {
    let stem = format!("{}_{}", prefix, kind.file_stem());
    if !index_suffix {
        return format!("{}.csv", stem);
    }

    match &selection.mode {
        SelectionMode::Explicit => format!(
            "{}_index_specified ({} of {} {}s).csv",
            stem,
            state.success,
            selection.len(),
            kind.noun()
        ),
        SelectionMode::PartialPage { index, window, .. } => format!(
            "{}_page_specified (from {} to {} of {} reviews).csv",
            stem,
            window.start,
            window.end as i64 - 1,
            index
        ),
        SelectionMode::Range { min, max } => {
            if state.failure == 0 {
                format!("{}_from_{}_to_{}.csv", stem, min, max)
            } else {
                format!(
                    "{}_from_{}_to_{} ({} fails).csv",
                    stem, min, max, state.failure
                )
            }
        }
    }
}
