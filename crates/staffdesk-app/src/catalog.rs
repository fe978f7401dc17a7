// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::columns::{ColumnDescriptor as Column, ColumnSet, ColumnType, FkInfo};
use crate::filter::{FkFilter, build_fk_filter};
use crate::model::{Record, ResourceKind};
use crate::table::RecordSource;

/// Reference collections fetched ahead of building a resource's columns.
pub type References = BTreeMap<ResourceKind, Vec<Record>>;

const MONEY: ColumnType = ColumnType::Decimal(2);
const KEY: ColumnType = ColumnType::Decimal(0);

impl ResourceKind {
    /// Collections whose records populate this resource's dropdowns.
    pub const fn references(self) -> &'static [ResourceKind] {
        match self {
            Self::Employees | Self::Positions | Self::Projects => &[],
            Self::Resources => &[Self::Projects],
            Self::EmployeePositions => &[Self::Employees, Self::Positions],
            Self::ProjectEmployees => &[Self::Employees, Self::Projects],
        }
    }

    /// Attribute shown when another table refers to a record of this kind.
    pub const fn display_attr(self) -> Option<&'static str> {
        match self {
            Self::Employees => Some("fullName"),
            Self::Positions => Some("positionTitle"),
            Self::Projects => Some("projectName"),
            Self::Resources | Self::EmployeePositions | Self::ProjectEmployees => None,
        }
    }

    pub fn columns(self, references: &References) -> Result<ColumnSet> {
        let lookup = |kind: ResourceKind, fk_name: &str| {
            FkInfo::new(
                kind.display_attr().unwrap_or(kind.primary_key()),
                fk_name,
                kind.primary_key(),
                references.get(&kind).cloned().unwrap_or_default(),
            )
        };

        let columns = match self {
            Self::Employees => vec![
                Column::new("ID", "employeeID", KEY),
                Column::new("Full Name", "fullName", ColumnType::Text),
                Column::new("Username", "username", ColumnType::Text),
                Column::new("Project Hours", "projectHoursTotal", MONEY).nullable(),
            ],
            Self::Positions => vec![
                Column::new("ID", "positionID", KEY).autoinc(),
                Column::new("Title", "positionTitle", ColumnType::Text),
                Column::new("Budgeted Salary", "budgetedSalary", MONEY),
            ],
            Self::Projects => vec![
                Column::new("ID", "projectID", KEY).autoinc(),
                Column::new("Name", "projectName", ColumnType::Text),
                Column::new("Start", "startDate", ColumnType::Date),
                Column::new("End", "endDate", ColumnType::Date).nullable(),
                Column::new("Projected Budget", "projectedBudget", MONEY).nullable(),
            ],
            Self::Resources => vec![
                Column::new("ID", "resourceID", KEY).autoinc(),
                Column::new("Name", "resourceName", ColumnType::Text),
                Column::new("Cost", "resourceCost", MONEY),
                Column::new("Description", "resourceDesc", ColumnType::Text).nullable(),
                Column::new("Project", "projectName", KEY)
                    .nullable()
                    .references(lookup(Self::Projects, "projectID")),
            ],
            Self::EmployeePositions => vec![
                Column::new("ID", "employeePositionID", KEY).autoinc(),
                Column::new("Employee", "employeeID", KEY)
                    .references(lookup(Self::Employees, "employeeID")),
                Column::new("Position", "positionID", KEY)
                    .references(lookup(Self::Positions, "positionID")),
                Column::new("Salary", "salary", MONEY),
                Column::new("Start", "startDate", ColumnType::Date),
                Column::new("End", "endDate", ColumnType::Date).nullable(),
            ],
            Self::ProjectEmployees => vec![
                Column::new("ID", "projectEmployeeID", KEY).autoinc(),
                Column::new("Employee", "employeeID", KEY)
                    .references(lookup(Self::Employees, "employeeID")),
                Column::new("Project", "projectID", KEY)
                    .references(lookup(Self::Projects, "projectID")),
                Column::new("Role", "role", ColumnType::Text),
                Column::new("Hours", "hoursWorkedTotal", MONEY).nullable(),
            ],
        };

        ColumnSet::new(columns).with_context(|| format!("build {} columns", self.label()))
    }

    /// Fetches every collection named by [`ResourceKind::references`].
    pub fn load_references<S: RecordSource + ?Sized>(self, source: &mut S) -> Result<References> {
        let mut references = References::new();
        for kind in self.references() {
            let records = source
                .fetch_records(&kind.endpoint())
                .with_context(|| format!("load {} for {} dropdowns", kind.label(), self.label()))?;
            references.insert(*kind, records);
        }
        Ok(references)
    }

    /// Filter dropdown over the parent table, for resources that have one.
    pub fn filter(self, references: &References) -> Option<FkFilter> {
        let (fk_name, parent) = self.filter_key()?;
        let records = references.get(&parent).map(Vec::as_slice).unwrap_or(&[]);
        Some(build_fk_filter(
            records,
            parent.display_attr()?,
            fk_name,
            false,
            &self.filter_endpoint(),
        ))
    }
}
