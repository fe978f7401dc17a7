// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::columns::{ColumnDescriptor, ColumnType};
use crate::model::{Record, Value};
use crate::validation::{parse_input_date, parse_number};

pub const NONE_LABEL: &str = "(None)";
pub const NULL_PLACEHOLDER: &str = "(NULL)";
pub const AUTOMATIC_PLACEHOLDER: &str = "(Automatic)";
pub const REQUIRED_PLACEHOLDER: &str = "Required";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Text,
    Number { precision: u8 },
    Date,
}

impl InputKind {
    pub const fn for_column(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => Self::Text,
            ColumnType::Decimal(precision) => Self::Number { precision },
            ColumnType::Date => Self::Date,
        }
    }

    /// Whether typing `ch` after `current` keeps the input well formed. Number
    /// inputs take a leading sign, digits, and at most `precision` decimals.
    pub fn accepts(self, current: &str, ch: char) -> bool {
        let Self::Number { precision } = self else {
            return true;
        };
        match ch {
            '-' => current.is_empty(),
            '.' => precision > 0 && !current.contains('.'),
            '0'..='9' => match current.split_once('.') {
                Some((_, decimals)) => decimals.len() < usize::from(precision),
                None => true,
            },
            _ => false,
        }
    }
}

/// Typed single-line input.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub kind: InputKind,
    pub disabled: bool,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    value: String,
}

impl Input {
    fn for_column(column: &ColumnDescriptor) -> Self {
        Self {
            kind: InputKind::for_column(column.column_type),
            disabled: column.autoinc,
            required: !column.nullable,
            placeholder: None,
            value: String::new(),
        }
    }

    /// Empty input for the add row, with a hint about what an empty value means.
    pub fn blank(column: &ColumnDescriptor) -> Self {
        let placeholder = if column.nullable {
            NULL_PLACEHOLDER
        } else if column.autoinc {
            AUTOMATIC_PLACEHOLDER
        } else {
            REQUIRED_PLACEHOLDER
        };
        Self {
            placeholder: Some(placeholder),
            ..Self::for_column(column)
        }
    }

    pub fn prefilled(column: &ColumnDescriptor, raw: &str) -> Self {
        let mut input = Self::for_column(column);
        input.set_value(raw);
        input
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Date inputs only hold `YYYY-MM-DD`; anything else leaves them empty.
    pub fn set_value(&mut self, raw: &str) {
        self.value = match self.kind {
            InputKind::Date if parse_input_date(raw).is_none() => String::new(),
            _ => raw.to_owned(),
        };
    }

    pub fn push(&mut self, ch: char) -> bool {
        if self.disabled || ch.is_control() || !self.kind.accepts(&self.value, ch) {
            return false;
        }
        self.value.push(ch);
        true
    }

    pub fn pop(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        self.value.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownOption {
    pub value: Value,
    pub label: String,
}

/// Single-choice list of referenced records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dropdown {
    options: Vec<DropdownOption>,
    selected: Option<usize>,
}

impl Dropdown {
    pub fn from_options(options: Vec<DropdownOption>) -> Self {
        let selected = if options.is_empty() { None } else { Some(0) };
        Self { options, selected }
    }

    pub fn options(&self) -> &[DropdownOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_option(&self) -> Option<&DropdownOption> {
        self.selected.and_then(|index| self.options.get(index))
    }

    /// Value of the selected option; null when nothing is selected.
    pub fn selected_value(&self) -> Value {
        self.selected_option()
            .map(|option| option.value.clone())
            .unwrap_or_default()
    }

    pub fn selected_label(&self) -> &str {
        self.selected_option()
            .map(|option| option.label.as_str())
            .unwrap_or("")
    }

    /// Selects the option whose value renders the same as `value`; clears the
    /// selection when none does.
    pub fn select_value(&mut self, value: &Value) -> bool {
        let wanted = value.display();
        self.selected = self
            .options
            .iter()
            .position(|option| option.value.display() == wanted);
        self.selected.is_some()
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        if index >= self.options.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn cycle(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len() as isize;
        let current = self.selected.map_or(-1, |index| index as isize);
        let next = if current < 0 && delta < 0 {
            len - 1
        } else {
            (current + delta).rem_euclid(len)
        };
        self.selected = Some(next as usize);
    }

    pub fn prepend(&mut self, option: DropdownOption) {
        self.options.insert(0, option);
        self.selected = Some(0);
    }
}

/// Options labelled by `display_attr` and keyed by `key_attr`, in input order.
/// A nullable dropdown starts with a "(None)" option whose value is null.
pub fn build_dropdown(
    records: &[Record],
    display_attr: &str,
    key_attr: &str,
    nullable: bool,
) -> Dropdown {
    let mut options = Vec::with_capacity(records.len() + usize::from(nullable));
    if nullable {
        options.push(DropdownOption {
            value: Value::Null,
            label: NONE_LABEL.to_owned(),
        });
    }
    options.extend(records.iter().map(|record| DropdownOption {
        value: record.value(key_attr).clone(),
        label: record.value(display_attr).display(),
    }));
    Dropdown::from_options(options)
}

/// Edit representation of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Editor {
    Input(Input),
    Dropdown(Dropdown),
}

impl Editor {
    /// Editor pre-set to `value`, or blank when `value` is `None`.
    pub fn for_column(column: &ColumnDescriptor, value: Option<&Value>) -> Self {
        if let Some(fk) = &column.fk {
            let mut dropdown =
                build_dropdown(&fk.data, &fk.attrib_name, &fk.pk_name, column.nullable);
            if let Some(value) = value {
                dropdown.select_value(value);
            }
            return Self::Dropdown(dropdown);
        }

        match value {
            Some(value) => Self::Input(Input::prefilled(column, &value.display())),
            None => Self::Input(Input::blank(column)),
        }
    }

    /// Current contents converted to the column's scalar type.
    pub fn value(&self, column: &ColumnDescriptor) -> Value {
        match self {
            Self::Dropdown(dropdown) => dropdown.selected_value(),
            Self::Input(input) => coerce_input(input.value(), column),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Input(input) => input.value().to_owned(),
            Self::Dropdown(dropdown) => dropdown.selected_label().to_owned(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Input(input) if input.disabled)
    }

    pub fn push(&mut self, ch: char) -> bool {
        match self {
            Self::Input(input) => input.push(ch),
            Self::Dropdown(_) => false,
        }
    }

    pub fn pop(&mut self) -> bool {
        match self {
            Self::Input(input) => input.pop(),
            Self::Dropdown(_) => false,
        }
    }

    pub fn cycle(&mut self, delta: isize) -> bool {
        match self {
            Self::Dropdown(dropdown) => {
                dropdown.cycle(delta);
                true
            }
            Self::Input(_) => false,
        }
    }
}

/// Empty input on a nullable or server-assigned column becomes null; numbers
/// that parse become numeric; anything else stays text for the validator.
pub fn coerce_input(raw: &str, column: &ColumnDescriptor) -> Value {
    if raw.is_empty() {
        if column.nullable || column.autoinc {
            return Value::Null;
        }
        return Value::text("");
    }

    match column.column_type {
        ColumnType::Decimal(0) => {
            if let Ok(integer) = raw.trim().parse::<i64>() {
                return Value::Integer(integer);
            }
            parse_number(raw).map_or_else(|| Value::text(raw), Value::Number)
        }
        ColumnType::Decimal(_) => parse_number(raw).map_or_else(|| Value::text(raw), Value::Number),
        ColumnType::Text | ColumnType::Date => Value::text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::{Editor, Input, build_dropdown, coerce_input};
    use crate::{ColumnDescriptor, ColumnType, FkInfo, Record, Value};

    fn lettered() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("name", "A"),
            Record::new().with("id", 2).with("name", "B"),
        ]
    }

    #[test]
    fn nullable_dropdown_leads_with_none_option() {
        let dropdown = build_dropdown(&lettered(), "name", "id", true);
        let labels = dropdown
            .options()
            .iter()
            .map(|option| option.label.as_str())
            .collect::<Vec<_>>();
        let values = dropdown
            .options()
            .iter()
            .map(|option| option.value.display())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["(None)", "A", "B"]);
        assert_eq!(values, vec!["", "1", "2"]);
        assert_eq!(dropdown.options()[0].value, Value::Null);
    }

    #[test]
    fn required_dropdown_preserves_input_order() {
        let dropdown = build_dropdown(&lettered(), "name", "id", false);
        assert_eq!(dropdown.options().len(), 2);
        assert_eq!(dropdown.selected_label(), "A");
        assert_eq!(dropdown.selected_value(), Value::Integer(1));
    }

    #[test]
    fn dropdown_select_value_matches_display_and_clears_on_miss() {
        let mut dropdown = build_dropdown(&lettered(), "name", "id", false);
        assert!(dropdown.select_value(&Value::text("2")));
        assert_eq!(dropdown.selected_label(), "B");
        assert!(!dropdown.select_value(&Value::Integer(99)));
        assert_eq!(dropdown.selected(), None);
        assert_eq!(dropdown.selected_value(), Value::Null);
    }

    #[test]
    fn dropdown_cycle_wraps_both_ways() {
        let mut dropdown = build_dropdown(&lettered(), "name", "id", true);
        dropdown.cycle(-1);
        assert_eq!(dropdown.selected_label(), "B");
        dropdown.cycle(1);
        assert_eq!(dropdown.selected_label(), "(None)");
    }

    #[test]
    fn blank_inputs_carry_placeholders() {
        let nullable = ColumnDescriptor::new("Desc", "resourceDesc", ColumnType::Text).nullable();
        let autoinc = ColumnDescriptor::new("ID", "resourceID", ColumnType::Decimal(0)).autoinc();
        let required = ColumnDescriptor::new("Name", "resourceName", ColumnType::Text);

        assert_eq!(Input::blank(&nullable).placeholder, Some("(NULL)"));
        let automatic = Input::blank(&autoinc);
        assert_eq!(automatic.placeholder, Some("(Automatic)"));
        assert!(automatic.disabled);
        let name = Input::blank(&required);
        assert_eq!(name.placeholder, Some("Required"));
        assert!(name.required);
    }

    #[test]
    fn number_inputs_only_take_digits_within_precision() {
        let cost = ColumnDescriptor::new("Cost", "resourceCost", ColumnType::Decimal(2));
        let mut input = Input::blank(&cost);
        for ch in "-12a.5.07".chars() {
            input.push(ch);
        }
        assert_eq!(input.value(), "-12.50");
        assert!(!input.push('-'));

        let id = ColumnDescriptor::new("ID", "employeeID", ColumnType::Decimal(0));
        let mut input = Input::blank(&id);
        for ch in "10.01".chars() {
            input.push(ch);
        }
        assert_eq!(input.value(), "1001");

        let name = ColumnDescriptor::new("Name", "resourceName", ColumnType::Text);
        let mut input = Input::blank(&name);
        assert!(input.push('.'));
        assert!(input.push('x'));
        assert_eq!(input.value(), ".x");
    }

    #[test]
    fn date_input_rejects_timestamps() {
        let column = ColumnDescriptor::new("Start", "startDate", ColumnType::Date);
        assert_eq!(Input::prefilled(&column, "2024-01-15").value(), "2024-01-15");
        assert_eq!(Input::prefilled(&column, "2024-01-15T00:00:00Z").value(), "");
    }

    #[test]
    fn disabled_inputs_ignore_typing() {
        let column = ColumnDescriptor::new("ID", "positionID", ColumnType::Decimal(0)).autoinc();
        let mut editor = Editor::for_column(&column, Some(&Value::Integer(4)));
        assert!(editor.is_disabled());
        assert!(!editor.push('9'));
        assert!(!editor.pop());
        assert_eq!(editor.text(), "4");
    }

    #[test]
    fn fk_editor_is_preselected_dropdown() {
        let column = ColumnDescriptor::new("Project", "projectID", ColumnType::Decimal(0))
            .nullable()
            .references(FkInfo::new("name", "projectID", "id", lettered()));
        let editor = Editor::for_column(&column, Some(&Value::Integer(2)));
        assert_eq!(editor.text(), "B");
        assert_eq!(editor.value(&column), Value::Integer(2));

        let blank = Editor::for_column(&column, None);
        assert_eq!(blank.value(&column), Value::Null);
    }

    #[test]
    fn coerce_input_types_by_column() {
        let id = ColumnDescriptor::new("ID", "employeeID", ColumnType::Decimal(0));
        let cost = ColumnDescriptor::new("Cost", "resourceCost", ColumnType::Decimal(2));
        let desc = ColumnDescriptor::new("Desc", "resourceDesc", ColumnType::Text).nullable();

        assert_eq!(coerce_input("42", &id), Value::Integer(42));
        assert_eq!(coerce_input("12.5", &cost), Value::Number(12.5));
        assert_eq!(coerce_input("3000", &cost), Value::Number(3000.0));
        assert_eq!(coerce_input("abc", &cost), Value::text("abc"));
        assert_eq!(coerce_input("", &desc), Value::Null);
        assert_eq!(coerce_input("", &id), Value::text(""));
    }
}
