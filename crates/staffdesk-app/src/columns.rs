// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::model::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    /// Number of decimal places accepted by the input.
    Decimal(u8),
    Date,
}

/// Lookup metadata for a column that references another table.
#[derive(Debug, Clone, PartialEq)]
pub struct FkInfo {
    /// Attribute of the referenced records shown as the option label.
    pub attrib_name: String,
    /// Attribute of this record holding the referenced key.
    pub fk_name: String,
    /// Attribute of the referenced records holding their key.
    pub pk_name: String,
    pub data: Vec<Record>,
}

impl FkInfo {
    pub fn new(attrib_name: &str, fk_name: &str, pk_name: &str, data: Vec<Record>) -> Self {
        Self {
            attrib_name: attrib_name.to_owned(),
            fk_name: fk_name.to_owned(),
            pk_name: pk_name.to_owned(),
            data,
        }
    }

    /// Label of the referenced record whose key matches `key`.
    pub fn label_for(&self, key: &Value) -> Option<String> {
        if key.is_blank() {
            return None;
        }
        let wanted = key.display();
        self.data
            .iter()
            .find(|record| record.value(&self.pk_name).display() == wanted)
            .map(|record| record.value(&self.attrib_name).display())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub header: String,
    pub attrib_name: String,
    pub column_type: ColumnType,
    pub fk: Option<FkInfo>,
    pub nullable: bool,
    pub autoinc: bool,
}

impl ColumnDescriptor {
    pub fn new(header: &str, attrib_name: &str, column_type: ColumnType) -> Self {
        Self {
            header: header.to_owned(),
            attrib_name: attrib_name.to_owned(),
            column_type,
            fk: None,
            nullable: false,
            autoinc: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn autoinc(mut self) -> Self {
        self.autoinc = true;
        self
    }

    pub fn references(mut self, fk: FkInfo) -> Self {
        self.fk = Some(fk);
        self
    }

    /// Key this column reads from and writes to in a record.
    pub fn record_key(&self) -> &str {
        match &self.fk {
            Some(fk) => &fk.fk_name,
            None => &self.attrib_name,
        }
    }

    pub fn is_fk(&self) -> bool {
        self.fk.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    Empty,
    ForeignPrimaryKey(String),
    NullablePrimaryKey(String),
    DuplicateKey(String),
    MissingForeignKeyName(String),
}

impl std::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("column list is empty; the first column must be the primary key"),
            Self::ForeignPrimaryKey(name) => {
                write!(f, "primary key column `{name}` must not be a foreign key")
            }
            Self::NullablePrimaryKey(name) => {
                write!(f, "primary key column `{name}` must not be nullable")
            }
            Self::DuplicateKey(name) => write!(f, "record key `{name}` is used by two columns"),
            Self::MissingForeignKeyName(name) => {
                write!(f, "foreign key column `{name}` has an empty fk name")
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Ordered column descriptors whose first entry is the primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Result<Self, DescriptorError> {
        let Some(primary) = columns.first() else {
            return Err(DescriptorError::Empty);
        };
        if primary.is_fk() {
            return Err(DescriptorError::ForeignPrimaryKey(primary.attrib_name.clone()));
        }
        if primary.nullable {
            return Err(DescriptorError::NullablePrimaryKey(primary.attrib_name.clone()));
        }

        let mut seen = BTreeSet::new();
        for column in &columns {
            if let Some(fk) = &column.fk
                && fk.fk_name.trim().is_empty()
            {
                return Err(DescriptorError::MissingForeignKeyName(column.attrib_name.clone()));
            }
            if !seen.insert(column.record_key().to_owned()) {
                return Err(DescriptorError::DuplicateKey(column.record_key().to_owned()));
            }
        }

        Ok(Self { columns })
    }

    pub fn primary(&self) -> &ColumnDescriptor {
        &self.columns[0]
    }

    pub fn primary_key(&self) -> &str {
        self.primary().record_key()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn by_record_key(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.record_key() == key)
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ColumnDescriptor;
    type IntoIter = std::slice::Iter<'a, ColumnDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
