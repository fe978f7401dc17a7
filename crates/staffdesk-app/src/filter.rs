// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::columns::ColumnSet;
use crate::model::{Record, Value};
use crate::table::{RecordSource, TableView, refresh_table};
use crate::widgets::{Dropdown, DropdownOption, build_dropdown};

pub const ANY_LABEL: &str = "(Any)";
pub const ANY_VALUE: i64 = -1;

/// Dropdown that narrows a table to rows referencing one parent record.
#[derive(Debug, Clone, PartialEq)]
pub struct FkFilter {
    dropdown: Dropdown,
    base_endpoint: String,
}

impl FkFilter {
    pub fn dropdown(&self) -> &Dropdown {
        &self.dropdown
    }

    pub fn label(&self) -> &str {
        self.dropdown.selected_label()
    }

    pub fn is_any(&self) -> bool {
        match self.dropdown.selected_value() {
            Value::Null => true,
            value => value.as_i64() == Some(ANY_VALUE),
        }
    }

    /// Unfiltered parent collection for "(Any)", the nested route otherwise.
    pub fn endpoint(&self) -> String {
        let parent = self.base_endpoint.trim_end_matches('/');
        if self.is_any() {
            return parent.to_owned();
        }
        format!("{parent}/{}", self.dropdown.selected_value().display())
    }

    pub fn select(&mut self, index: usize) -> bool {
        self.dropdown.select_index(index)
    }

    /// Selects `index` and reloads `table` in place from the matching route.
    pub fn on_change<S: RecordSource + ?Sized>(
        &mut self,
        index: usize,
        source: &mut S,
        columns: &ColumnSet,
        table: &mut TableView,
    ) -> Result<()> {
        self.select(index);
        refresh_table(source, &self.endpoint(), columns, table)
    }
}

/// `base_endpoint` is the nested filter route, e.g. `/resources/`.
pub fn build_fk_filter(
    records: &[Record],
    display_attr: &str,
    key_attr: &str,
    nullable: bool,
    base_endpoint: &str,
) -> FkFilter {
    let mut dropdown = build_dropdown(records, display_attr, key_attr, nullable);
    dropdown.prepend(DropdownOption {
        value: Value::Integer(ANY_VALUE),
        label: ANY_LABEL.to_owned(),
    });
    FkFilter {
        dropdown,
        base_endpoint: base_endpoint.to_owned(),
    }
}
