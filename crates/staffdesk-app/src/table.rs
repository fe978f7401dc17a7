// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::columns::{ColumnDescriptor, ColumnSet, ColumnType};
use crate::model::{Record, Value};
use crate::widgets::{Editor, InputKind};

/// Trailing header cells reserved for row actions.
pub const ACTION_COLUMNS: usize = 2;

/// Anything that can answer a `GET` for a collection path.
pub trait RecordSource {
    fn fetch_records(&mut self, endpoint: &str) -> Result<Vec<Record>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Save,
    Delete,
    Cancel,
    Add,
}

impl RowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Save => "Save",
            Self::Delete => "Delete",
            Self::Cancel => "Cancel",
            Self::Add => "Add",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    /// Text shown in view mode.
    pub display: String,
    /// Value the cell was rendered from, keyed by the column's record key.
    pub value: Value,
    pub editor: Editor,
}

impl CellView {
    fn render(record: &Record, column: &ColumnDescriptor) -> Self {
        let value = record.value(column.record_key()).clone();
        Self {
            display: display_text(record, column),
            editor: Editor::for_column(column, Some(&value)),
            value,
        }
    }

    /// Puts the editor back to what view mode shows.
    pub fn reset(&mut self) {
        match &mut self.editor {
            Editor::Input(input) => input.set_value(&self.display),
            Editor::Dropdown(dropdown) => {
                dropdown.select_value(&self.value);
            }
        }
    }

    /// An empty date input takes the displayed date, if there is one.
    pub fn seed_from_display(&mut self) {
        if let Editor::Input(input) = &mut self.editor
            && input.kind == InputKind::Date
            && input.value().is_empty()
        {
            input.set_value(&self.display);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub primary_key: Value,
    pub mode: RowMode,
    /// A request for this row is in flight.
    pub pending: bool,
    pub cells: Vec<CellView>,
}

impl RowView {
    pub fn id(&self) -> String {
        self.primary_key.display()
    }

    /// The two action cells visible in the current mode.
    pub fn actions(&self) -> [RowAction; 2] {
        match self.mode {
            RowMode::View => [RowAction::Edit, RowAction::Delete],
            RowMode::Edit => [RowAction::Save, RowAction::Cancel],
        }
    }

    /// Reads the edit representation back into a record keyed by record key.
    pub fn extract(&self, columns: &ColumnSet) -> Record {
        columns
            .iter()
            .zip(&self.cells)
            .map(|(column, cell)| (column.record_key().to_owned(), cell.editor.value(column)))
            .collect()
    }
}

pub fn render_row(record: &Record, columns: &ColumnSet, mode: RowMode) -> RowView {
    RowView {
        primary_key: record.value(columns.primary_key()).clone(),
        mode,
        pending: false,
        cells: columns
            .iter()
            .map(|column| CellView::render(record, column))
            .collect(),
    }
}

/// Add-record row: blank editors plus the Add action.
#[derive(Debug, Clone, PartialEq)]
pub struct FooterView {
    pub editors: Vec<Editor>,
    pub pending: bool,
}

impl FooterView {
    pub fn render(columns: &ColumnSet) -> Self {
        Self {
            editors: columns
                .iter()
                .map(|column| Editor::for_column(column, None))
                .collect(),
            pending: false,
        }
    }

    pub fn actions(&self) -> [Option<RowAction>; 2] {
        [Some(RowAction::Add), None]
    }

    pub fn extract(&self, columns: &ColumnSet) -> Record {
        columns
            .iter()
            .zip(&self.editors)
            .map(|(column, editor)| (column.record_key().to_owned(), editor.value(column)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// Column headers followed by the blank action headers.
    pub header: Vec<String>,
    pub rows: Vec<RowView>,
    pub footer: FooterView,
}

impl TableView {
    /// An empty record set still renders one blank body row.
    pub fn has_placeholder_row(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn body_len(&self) -> usize {
        self.rows.len().max(1)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    /// Clears and refills this table in place.
    pub fn replace(&mut self, records: &[Record], columns: &ColumnSet) {
        self.header.clear();
        self.header.extend(header_labels(columns));
        self.rows.clear();
        self.rows.extend(
            records
                .iter()
                .map(|record| render_row(record, columns, RowMode::View)),
        );
        self.footer = FooterView::render(columns);
    }
}

/// Builds a table, or clears and reuses `existing` when given one.
pub fn render_table(
    records: &[Record],
    columns: &ColumnSet,
    existing: Option<TableView>,
) -> TableView {
    let mut table = existing.unwrap_or_else(|| TableView {
        header: Vec::new(),
        rows: Vec::new(),
        footer: FooterView::render(columns),
    });
    table.replace(records, columns);
    table
}

/// Fetches `endpoint` and replaces `table` with the result. A failed fetch
/// leaves the current table untouched.
pub fn refresh_table<S: RecordSource + ?Sized>(
    source: &mut S,
    endpoint: &str,
    columns: &ColumnSet,
    table: &mut TableView,
) -> Result<()> {
    let records = source.fetch_records(endpoint)?;
    table.replace(&records, columns);
    Ok(())
}

fn header_labels(columns: &ColumnSet) -> impl Iterator<Item = String> + '_ {
    columns
        .iter()
        .map(|column| column.header.clone())
        .chain(std::iter::repeat_n(String::new(), ACTION_COLUMNS))
}

fn display_text(record: &Record, column: &ColumnDescriptor) -> String {
    if let Some(fk) = &column.fk {
        if let Some(label) = fk.label_for(record.value(&fk.fk_name)) {
            return label;
        }
        if column.attrib_name != fk.fk_name
            && let Some(joined) = record.get(&column.attrib_name)
        {
            return joined.display();
        }
        return record.value(&fk.fk_name).display();
    }

    let text = record.value(&column.attrib_name).display();
    match column.column_type {
        ColumnType::Date => text.chars().take(10).collect(),
        ColumnType::Text | ColumnType::Decimal(_) => text,
    }
}
