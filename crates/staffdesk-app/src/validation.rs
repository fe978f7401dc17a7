// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::columns::{ColumnDescriptor, ColumnSet, ColumnType};
use crate::model::{Record, Value};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownAttribute(String),
    MissingValue(String),
    InvalidNumber(String),
    InvalidDate(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAttribute(key) => write!(f, "`{key}` is not a column of this table"),
            Self::MissingValue(header) => write!(f, "{header} is required"),
            Self::InvalidNumber(header) => write!(f, "{header} must be a number"),
            Self::InvalidDate(header) => write!(f, "{header} must be a date ({DATE_LAYOUT})"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub fn validate_attribute(value: &Value, column: &ColumnDescriptor) -> bool {
    check_attribute(value, column).is_ok()
}

pub fn check_attribute(value: &Value, column: &ColumnDescriptor) -> ValidationResult<()> {
    if value.is_blank() {
        if column.nullable || column.autoinc {
            return Ok(());
        }
        return Err(ValidationError::MissingValue(column.header.clone()));
    }

    match column.column_type {
        ColumnType::Text => Ok(()),
        ColumnType::Decimal(_) => {
            let finite = match value {
                Value::Integer(_) => true,
                Value::Number(number) => number.is_finite(),
                Value::Text(text) => parse_number(text).is_some(),
                Value::Null => false,
            };
            if finite {
                Ok(())
            } else {
                Err(ValidationError::InvalidNumber(column.header.clone()))
            }
        }
        ColumnType::Date => match value {
            Value::Text(text) if parse_calendar_date(text).is_some() => Ok(()),
            _ => Err(ValidationError::InvalidDate(column.header.clone())),
        },
    }
}

/// Every key must name a column and every value must pass that column's check.
///
/// A key with no matching column fails validation rather than being skipped.
pub fn validate_data(record: &Record, columns: &ColumnSet) -> bool {
    check_record(record, columns).is_ok()
}

pub fn check_record(record: &Record, columns: &ColumnSet) -> ValidationResult<()> {
    for (key, value) in record.iter() {
        let column = columns
            .by_record_key(key)
            .ok_or_else(|| ValidationError::UnknownAttribute(key.to_owned()))?;
        check_attribute(value, column)?;
    }
    Ok(())
}

pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Accepts a plain date or a timestamp whose date part is used.
pub fn parse_calendar_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if let Ok(value) = Date::parse(trimmed, &format_description!("[year]-[month]-[day]")) {
        return Some(value);
    }
    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(value.date());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.date());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(value.date());
    }
    None
}

/// Strict `YYYY-MM-DD`, the only form a date input holds.
pub fn parse_input_date(raw: &str) -> Option<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}
