// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::columns::ColumnSet;
use crate::sync::{SyncOutcome, SyncRequest};
use crate::table::{RowMode, TableView};
use crate::validation::{ValidationError, check_record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Edit(usize),
    Cancel(usize),
    Save(usize),
    /// Asks for confirmation; nothing is sent yet.
    Delete(usize),
    /// Addressed by row identity since the table may be replaced while the
    /// confirmation is open.
    ConfirmDelete { id: String },
    Add,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditEffect {
    ModeChanged { row: usize, mode: RowMode },
    /// `row` is `None` for the add row.
    Invalid {
        row: Option<usize>,
        error: ValidationError,
    },
    ConfirmationRequested { id: String },
    Sync(SyncRequest),
}

impl TableView {
    /// Applies one row action. Rows with a request in flight ignore everything.
    pub fn dispatch(
        &mut self,
        endpoint: &str,
        columns: &ColumnSet,
        command: EditCommand,
    ) -> Vec<EditEffect> {
        match command {
            EditCommand::Add => self.add(endpoint, columns),
            EditCommand::Edit(index) => {
                let Some(row) = self.idle_row(index, RowMode::View) else {
                    return Vec::new();
                };
                row.cells.iter_mut().for_each(|cell| cell.seed_from_display());
                row.mode = RowMode::Edit;
                vec![EditEffect::ModeChanged {
                    row: index,
                    mode: RowMode::Edit,
                }]
            }
            EditCommand::Cancel(index) => {
                let Some(row) = self.idle_row(index, RowMode::Edit) else {
                    return Vec::new();
                };
                row.cells.iter_mut().for_each(|cell| cell.reset());
                row.mode = RowMode::View;
                vec![EditEffect::ModeChanged {
                    row: index,
                    mode: RowMode::View,
                }]
            }
            EditCommand::Save(index) => {
                let Some(row) = self.idle_row(index, RowMode::Edit) else {
                    return Vec::new();
                };
                let record = row.extract(columns);
                if let Err(error) = check_record(&record, columns) {
                    return vec![EditEffect::Invalid {
                        row: Some(index),
                        error,
                    }];
                }
                row.pending = true;
                vec![EditEffect::Sync(SyncRequest::Update {
                    endpoint: endpoint.to_owned(),
                    id: row.id(),
                    record,
                })]
            }
            EditCommand::Delete(index) => match self.idle_row(index, RowMode::View) {
                Some(row) => vec![EditEffect::ConfirmationRequested { id: row.id() }],
                None => Vec::new(),
            },
            EditCommand::ConfirmDelete { id } => {
                let Some(row) = self
                    .position_of(&id)
                    .and_then(|index| self.idle_row(index, RowMode::View))
                else {
                    return Vec::new();
                };
                row.pending = true;
                vec![EditEffect::Sync(SyncRequest::Delete {
                    endpoint: endpoint.to_owned(),
                    id: row.id(),
                })]
            }
        }
    }

    /// Releases the row or footer a finished request was holding. Success
    /// leaves the pending flag set since the caller replaces the table next.
    pub fn settle(&mut self, request: &SyncRequest, outcome: &SyncOutcome) {
        if outcome.is_applied() {
            return;
        }
        match request.id() {
            Some(id) => {
                if let Some(index) = self.position_of(id) {
                    self.rows[index].pending = false;
                }
            }
            None => self.footer.pending = false,
        }
    }

    fn add(&mut self, endpoint: &str, columns: &ColumnSet) -> Vec<EditEffect> {
        if self.footer.pending {
            return Vec::new();
        }
        let record = self.footer.extract(columns);
        if let Err(error) = check_record(&record, columns) {
            return vec![EditEffect::Invalid { row: None, error }];
        }
        self.footer.pending = true;
        vec![EditEffect::Sync(SyncRequest::Create {
            endpoint: endpoint.to_owned(),
            record,
        })]
    }

    fn idle_row(&mut self, index: usize, mode: RowMode) -> Option<&mut crate::table::RowView> {
        self.rows
            .get_mut(index)
            .filter(|row| !row.pending && row.mode == mode)
    }
}

#[cfg(test)]
mod tests {
    use super::{EditCommand, EditEffect};
    use crate::{
        ColumnDescriptor, ColumnSet, ColumnType, Editor, Record, RowMode, SyncOp, SyncOutcome,
        SyncRequest, TableView, ValidationError, Value, render_table,
    };
    use anyhow::Result;

    fn project_columns() -> Result<ColumnSet> {
        Ok(ColumnSet::new(vec![
            ColumnDescriptor::new("ID", "projectID", ColumnType::Decimal(0)).autoinc(),
            ColumnDescriptor::new("Name", "projectName", ColumnType::Text),
            ColumnDescriptor::new("Start", "startDate", ColumnType::Date),
            ColumnDescriptor::new("Budget", "projectedBudget", ColumnType::Decimal(2)).nullable(),
        ])?)
    }

    fn table(columns: &ColumnSet) -> TableView {
        let records = vec![
            Record::new()
                .with("projectID", 1)
                .with("projectName", "Atlas")
                .with("startDate", "2024-01-15T00:00:00.000Z")
                .with("projectedBudget", 5000.0),
            Record::new()
                .with("projectID", 2)
                .with("projectName", "Borealis")
                .with("startDate", "2024-03-01")
                .with("projectedBudget", Value::Null),
        ];
        render_table(&records, columns, None)
    }

    fn type_into(editor: &mut Editor, text: &str) {
        while editor.pop() {}
        for ch in text.chars() {
            editor.push(ch);
        }
    }

    #[test]
    fn edit_seeds_empty_dates_from_display() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        assert_eq!(table.rows[0].cells[2].editor.text(), "");

        let effects = table.dispatch("/projects", &columns, EditCommand::Edit(0));
        assert_eq!(
            effects,
            vec![EditEffect::ModeChanged {
                row: 0,
                mode: RowMode::Edit
            }]
        );
        assert_eq!(table.rows[0].mode, RowMode::Edit);
        assert_eq!(table.rows[0].cells[2].editor.text(), "2024-01-15");
        assert_eq!(table.rows[1].mode, RowMode::View);
        Ok(())
    }

    #[test]
    fn cancel_discards_edits() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        table.dispatch("/projects", &columns, EditCommand::Edit(0));
        type_into(&mut table.rows[0].cells[1].editor, "Renamed");

        let effects = table.dispatch("/projects", &columns, EditCommand::Cancel(0));
        assert_eq!(effects.len(), 1);
        assert_eq!(table.rows[0].mode, RowMode::View);
        assert_eq!(table.rows[0].cells[1].editor.text(), "Atlas");
        Ok(())
    }

    #[test]
    fn save_validates_before_sending() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        table.dispatch("/projects", &columns, EditCommand::Edit(0));
        type_into(&mut table.rows[0].cells[3].editor, "-");

        let effects = table.dispatch("/projects", &columns, EditCommand::Save(0));
        assert_eq!(
            effects,
            vec![EditEffect::Invalid {
                row: Some(0),
                error: ValidationError::InvalidNumber("Budget".to_owned()),
            }]
        );
        assert_eq!(table.rows[0].mode, RowMode::Edit);
        assert!(!table.rows[0].pending);
        Ok(())
    }

    #[test]
    fn save_sends_update_addressed_by_row_identity() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        table.dispatch("/projects", &columns, EditCommand::Edit(1));
        type_into(&mut table.rows[1].cells[3].editor, "12.5");

        let effects = table.dispatch("/projects", &columns, EditCommand::Save(1));
        let [EditEffect::Sync(request)] = effects.as_slice() else {
            panic!("expected one sync effect, got {effects:?}");
        };
        assert_eq!(request.op(), SyncOp::Update);
        assert_eq!(request.path(), "/projects/2");
        let record = request.record().expect("updates carry a record");
        assert_eq!(record.value("projectedBudget"), &Value::Number(12.5));
        assert_eq!(record.value("startDate"), &Value::text("2024-03-01"));
        assert!(table.rows[1].pending);

        let again = table.dispatch("/projects", &columns, EditCommand::Save(1));
        assert!(again.is_empty(), "pending rows ignore actions");
        Ok(())
    }

    #[test]
    fn failed_save_keeps_edit_fields() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        table.dispatch("/projects", &columns, EditCommand::Edit(1));
        type_into(&mut table.rows[1].cells[1].editor, "Cassini");
        let effects = table.dispatch("/projects", &columns, EditCommand::Save(1));
        let [EditEffect::Sync(request)] = effects.as_slice() else {
            panic!("expected one sync effect");
        };

        table.settle(request, &SyncOutcome::from_status(SyncOp::Update, 500));
        assert!(!table.rows[1].pending);
        assert_eq!(table.rows[1].mode, RowMode::Edit);
        assert_eq!(table.rows[1].cells[1].editor.text(), "Cassini");
        Ok(())
    }

    #[test]
    fn delete_requires_confirmation() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);

        let effects = table.dispatch("/projects", &columns, EditCommand::Delete(0));
        assert_eq!(
            effects,
            vec![EditEffect::ConfirmationRequested {
                id: "1".to_owned()
            }]
        );
        assert!(!table.rows[0].pending);

        let effects = table.dispatch(
            "/projects",
            &columns,
            EditCommand::ConfirmDelete {
                id: "1".to_owned(),
            },
        );
        assert_eq!(
            effects,
            vec![EditEffect::Sync(SyncRequest::Delete {
                endpoint: "/projects".to_owned(),
                id: "1".to_owned(),
            })]
        );
        Ok(())
    }

    #[test]
    fn delete_is_ignored_while_editing() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        table.dispatch("/projects", &columns, EditCommand::Edit(0));
        assert!(
            table
                .dispatch("/projects", &columns, EditCommand::Delete(0))
                .is_empty()
        );
        Ok(())
    }

    #[test]
    fn add_reads_footer_and_skips_autoinc_key() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);

        let invalid = table.dispatch("/projects", &columns, EditCommand::Add);
        assert_eq!(
            invalid,
            vec![EditEffect::Invalid {
                row: None,
                error: ValidationError::MissingValue("Name".to_owned()),
            }]
        );

        type_into(&mut table.footer.editors[1], "Cassini");
        type_into(&mut table.footer.editors[2], "2025-06-01");
        let effects = table.dispatch("/projects", &columns, EditCommand::Add);
        let [EditEffect::Sync(request)] = effects.as_slice() else {
            panic!("expected one sync effect");
        };
        assert_eq!(request.op(), SyncOp::Create);
        let record = request.record().expect("creates carry a record");
        assert_eq!(record.value("projectID"), &Value::Null);
        assert_eq!(record.value("projectedBudget"), &Value::Null);
        assert!(table.footer.pending);

        table.settle(request, &SyncOutcome::Conflict);
        assert!(!table.footer.pending);
        assert_eq!(table.footer.editors[1].text(), "Cassini");
        Ok(())
    }

    #[test]
    fn confirmed_delete_follows_the_record_not_the_position() -> Result<()> {
        let columns = project_columns()?;
        let mut table = table(&columns);
        let effects = table.dispatch("/projects", &columns, EditCommand::Delete(1));
        assert_eq!(
            effects,
            vec![EditEffect::ConfirmationRequested {
                id: "2".to_owned()
            }]
        );

        let reordered = vec![
            Record::new()
                .with("projectID", 9)
                .with("projectName", "Aurora")
                .with("startDate", "2023-11-01"),
            Record::new()
                .with("projectID", 2)
                .with("projectName", "Borealis")
                .with("startDate", "2024-03-01"),
        ];
        table.replace(&reordered, &columns);

        let effects = table.dispatch(
            "/projects",
            &columns,
            EditCommand::ConfirmDelete {
                id: "2".to_owned(),
            },
        );
        assert_eq!(
            effects,
            vec![EditEffect::Sync(SyncRequest::Delete {
                endpoint: "/projects".to_owned(),
                id: "2".to_owned(),
            })]
        );
        assert!(table.rows[1].pending);
        assert!(!table.rows[0].pending);

        table.replace(&reordered[..1], &columns);
        assert!(
            table
                .dispatch(
                    "/projects",
                    &columns,
                    EditCommand::ConfirmDelete {
                        id: "2".to_owned(),
                    },
                )
                .is_empty()
        );
        Ok(())
    }
}
