// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use time::Date;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Employees,
    Positions,
    Projects,
    Resources,
    EmployeePositions,
    ProjectEmployees,
}

impl ResourceKind {
    pub const ALL: [Self; 6] = [
        Self::Employees,
        Self::Positions,
        Self::Projects,
        Self::Resources,
        Self::EmployeePositions,
        Self::ProjectEmployees,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::Positions => "positions",
            Self::Projects => "projects",
            Self::Resources => "resources",
            Self::EmployeePositions => "employee_positions",
            Self::ProjectEmployees => "project_employees",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "employees" => Some(Self::Employees),
            "positions" => Some(Self::Positions),
            "projects" => Some(Self::Projects),
            "resources" => Some(Self::Resources),
            "employee_positions" => Some(Self::EmployeePositions),
            "project_employees" => Some(Self::ProjectEmployees),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Employees => "employees",
            Self::Positions => "positions",
            Self::Projects => "projects",
            Self::Resources => "resources",
            Self::EmployeePositions => "employee positions",
            Self::ProjectEmployees => "project employees",
        }
    }

    /// Record key of the first column; the row identity used in `PUT`/`DELETE` paths.
    pub const fn primary_key(self) -> &'static str {
        match self {
            Self::Employees => "employeeID",
            Self::Positions => "positionID",
            Self::Projects => "projectID",
            Self::Resources => "resourceID",
            Self::EmployeePositions => "employeePositionID",
            Self::ProjectEmployees => "projectEmployeeID",
        }
    }

    /// Foreign key that `GET /{resource}/{id}` filters on, with the table it references.
    pub const fn filter_key(self) -> Option<(&'static str, ResourceKind)> {
        match self {
            Self::Resources => Some(("projectID", Self::Projects)),
            Self::EmployeePositions => Some(("employeeID", Self::Employees)),
            Self::ProjectEmployees => Some(("projectID", Self::Projects)),
            Self::Employees | Self::Positions | Self::Projects => None,
        }
    }

    pub fn endpoint(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Base for filtered fetches; the selected key value is appended verbatim.
    pub fn filter_endpoint(self) -> String {
        format!("/{}/", self.as_str())
    }
}

static NULL_VALUE: Value = Value::Null;

/// 2^63; integral floats in `[-2^63, 2^63)` convert to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A scalar as it travels between the REST boundary and the table engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Null and the empty string are both "no value" to the validator.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Integer(_) | Self::Number(_) => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Number(value)
                if value.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(value) =>
            {
                Some(*value as i64)
            }
            Self::Text(value) => value.trim().parse().ok(),
            Self::Number(_) | Self::Null => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Attribute name to scalar; the generic shape the renderer works over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Missing keys read as null.
    pub fn value(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL_VALUE)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "employeeID")]
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub project_hours_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "positionID", default)]
    pub position_id: PositionId,
    pub position_title: String,
    pub budgeted_salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "projectID", default)]
    pub project_id: ProjectId,
    pub project_name: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date::option", default)]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub projected_budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "resourceID", default)]
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub resource_cost: f64,
    #[serde(default)]
    pub resource_desc: Option<String>,
    #[serde(rename = "projectID", default)]
    pub project_id: Option<ProjectId>,
    /// Joined from `projects` on read; ignored on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePosition {
    #[serde(rename = "employeePositionID", default)]
    pub employee_position_id: EmployeePositionId,
    #[serde(rename = "employeeID")]
    pub employee_id: EmployeeId,
    #[serde(rename = "positionID")]
    pub position_id: PositionId,
    pub salary: f64,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date::option", default)]
    pub end_date: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEmployee {
    #[serde(rename = "projectEmployeeID", default)]
    pub project_employee_id: ProjectEmployeeId,
    #[serde(rename = "employeeID")]
    pub employee_id: EmployeeId,
    #[serde(rename = "projectID")]
    pub project_id: ProjectId,
    pub role: String,
    #[serde(default)]
    pub hours_worked_total: Option<f64>,
}

/// Shared capability of the per-resource record types.
pub trait TableRecord: Serialize + DeserializeOwned + Into<Entity> {
    const KIND: ResourceKind;

    fn primary_key(&self) -> i64;
}

impl TableRecord for Employee {
    const KIND: ResourceKind = ResourceKind::Employees;

    fn primary_key(&self) -> i64 {
        self.employee_id.get()
    }
}

impl TableRecord for Position {
    const KIND: ResourceKind = ResourceKind::Positions;

    fn primary_key(&self) -> i64 {
        self.position_id.get()
    }
}

impl TableRecord for Project {
    const KIND: ResourceKind = ResourceKind::Projects;

    fn primary_key(&self) -> i64 {
        self.project_id.get()
    }
}

impl TableRecord for Resource {
    const KIND: ResourceKind = ResourceKind::Resources;

    fn primary_key(&self) -> i64 {
        self.resource_id.get()
    }
}

impl TableRecord for EmployeePosition {
    const KIND: ResourceKind = ResourceKind::EmployeePositions;

    fn primary_key(&self) -> i64 {
        self.employee_position_id.get()
    }
}

impl TableRecord for ProjectEmployee {
    const KIND: ResourceKind = ResourceKind::ProjectEmployees;

    fn primary_key(&self) -> i64 {
        self.project_employee_id.get()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Employee(Employee),
    Position(Position),
    Project(Project),
    Resource(Resource),
    EmployeePosition(EmployeePosition),
    ProjectEmployee(ProjectEmployee),
}

impl Entity {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Employee(_) => ResourceKind::Employees,
            Self::Position(_) => ResourceKind::Positions,
            Self::Project(_) => ResourceKind::Projects,
            Self::Resource(_) => ResourceKind::Resources,
            Self::EmployeePosition(_) => ResourceKind::EmployeePositions,
            Self::ProjectEmployee(_) => ResourceKind::ProjectEmployees,
        }
    }

    pub fn primary_key(&self) -> i64 {
        match self {
            Self::Employee(value) => value.primary_key(),
            Self::Position(value) => value.primary_key(),
            Self::Project(value) => value.primary_key(),
            Self::Resource(value) => value.primary_key(),
            Self::EmployeePosition(value) => value.primary_key(),
            Self::ProjectEmployee(value) => value.primary_key(),
        }
    }

    /// Decodes a request body as the record type for `kind`. Null members are
    /// treated as absent, so a null server-assigned key decodes to its default.
    pub fn from_json(kind: ResourceKind, body: &[u8]) -> Result<Self> {
        fn decode<T: TableRecord>(body: &[u8]) -> Result<Entity> {
            let mut json: serde_json::Value = serde_json::from_slice(body)
                .with_context(|| format!("parse {} request body", T::KIND.label()))?;
            if let Some(members) = json.as_object_mut() {
                members.retain(|_, member| !member.is_null());
            }
            let value: T = serde_json::from_value(json)
                .with_context(|| format!("decode {} record", T::KIND.label()))?;
            Ok(value.into())
        }

        match kind {
            ResourceKind::Employees => decode::<Employee>(body),
            ResourceKind::Positions => decode::<Position>(body),
            ResourceKind::Projects => decode::<Project>(body),
            ResourceKind::Resources => decode::<Resource>(body),
            ResourceKind::EmployeePositions => decode::<EmployeePosition>(body),
            ResourceKind::ProjectEmployees => decode::<ProjectEmployee>(body),
        }
    }

    pub fn to_record(&self) -> Result<Record> {
        let value = serde_json::to_value(self).context("encode entity")?;
        serde_json::from_value(value).context("convert entity to record")
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Employee(value) => value.serialize(serializer),
            Self::Position(value) => value.serialize(serializer),
            Self::Project(value) => value.serialize(serializer),
            Self::Resource(value) => value.serialize(serializer),
            Self::EmployeePosition(value) => value.serialize(serializer),
            Self::ProjectEmployee(value) => value.serialize(serializer),
        }
    }
}

macro_rules! entity_variant {
    ($record:ident) => {
        impl From<$record> for Entity {
            fn from(value: $record) -> Self {
                Self::$record(value)
            }
        }
    };
}

entity_variant!(Employee);
entity_variant!(Position);
entity_variant!(Project);
entity_variant!(Resource);
entity_variant!(EmployeePosition);
entity_variant!(ProjectEmployee);

pub mod iso_date {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::validation::format_date(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::validation::parse_calendar_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid date {raw:?}; use YYYY-MM-DD")))
    }

    pub mod option {
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            value: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => crate::validation::parse_calendar_date(text)
                    .map(Some)
                    .ok_or_else(|| {
                        D::Error::custom(format!("invalid date {text:?}; use YYYY-MM-DD"))
                    }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Employee, Entity, Project, Record, Resource, ResourceKind, Value};
    use crate::{EmployeeId, ProjectId};
    use anyhow::Result;
    use time::{Date, Month};

    #[test]
    fn resource_kind_parse_round_trips_every_path() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("vendors"), None);
    }

    #[test]
    fn as_i64_rejects_floats_outside_integer_range() {
        assert_eq!(Value::Number(7.0).as_i64(), Some(7));
        assert_eq!(Value::Number(-1.0).as_i64(), Some(-1));
        assert_eq!(Value::Number(-9_223_372_036_854_775_808.0).as_i64(), Some(i64::MIN));
        assert_eq!(Value::Number(9_223_372_036_854_775_808.0).as_i64(), None);
        assert_eq!(Value::Number(1e300).as_i64(), None);
        assert_eq!(Value::Number(f64::NEG_INFINITY).as_i64(), None);
        assert_eq!(Value::Number(2.5).as_i64(), None);
    }

    #[test]
    fn filter_endpoint_keeps_trailing_slash() {
        assert_eq!(ResourceKind::Resources.endpoint(), "/resources");
        assert_eq!(ResourceKind::Resources.filter_endpoint(), "/resources/");
    }

    #[test]
    fn value_deserializes_untagged_scalars() -> Result<()> {
        let record: Record = serde_json::from_str(
            r#"{"id":7,"cost":12.5,"name":"Ada","endDate":null}"#,
        )?;
        assert_eq!(record.value("id"), &Value::Integer(7));
        assert_eq!(record.value("cost"), &Value::Number(12.5));
        assert_eq!(record.value("name"), &Value::text("Ada"));
        assert_eq!(record.value("endDate"), &Value::Null);
        assert_eq!(record.value("missing"), &Value::Null);
        Ok(())
    }

    #[test]
    fn value_display_drops_trailing_zero_fraction() {
        assert_eq!(Value::Number(3000.0).display(), "3000");
        assert_eq!(Value::Number(12.5).display(), "12.5");
        assert_eq!(Value::Null.display(), "");
    }

    #[test]
    fn employee_uses_wire_attribute_names() -> Result<()> {
        let employee = Employee {
            employee_id: EmployeeId::new(42),
            full_name: "Ada Lovelace".to_owned(),
            username: "ada".to_owned(),
            project_hours_total: None,
        };
        let record = Entity::from(employee).to_record()?;
        assert_eq!(record.value("employeeID"), &Value::Integer(42));
        assert_eq!(record.value("fullName"), &Value::text("Ada Lovelace"));
        assert_eq!(record.value("projectHoursTotal"), &Value::Null);
        Ok(())
    }

    #[test]
    fn project_dates_accept_timestamps_and_blank_end() -> Result<()> {
        let entity = Entity::from_json(
            ResourceKind::Projects,
            br#"{"projectName":"Atlas","startDate":"2024-01-15T00:00:00.000Z","endDate":""}"#,
        )?;
        let Entity::Project(Project {
            project_id,
            start_date,
            end_date,
            ..
        }) = entity
        else {
            panic!("expected project entity");
        };
        assert_eq!(project_id, ProjectId::new(0));
        assert_eq!(
            start_date,
            Date::from_calendar_date(2024, Month::January, 15)?
        );
        assert_eq!(end_date, None);
        Ok(())
    }

    #[test]
    fn resource_join_column_is_omitted_when_absent() -> Result<()> {
        let resource = Resource {
            resource_id: crate::ResourceId::new(1),
            resource_name: "Laptop".to_owned(),
            resource_cost: 1200.0,
            resource_desc: None,
            project_id: Some(ProjectId::new(3)),
            project_name: None,
        };
        let json = serde_json::to_value(&resource)?;
        assert!(json.get("projectName").is_none());
        assert_eq!(json["projectID"], serde_json::json!(3));
        Ok(())
    }

    #[test]
    fn null_server_assigned_key_decodes_as_default() -> Result<()> {
        let entity = Entity::from_json(
            ResourceKind::Positions,
            br#"{"positionID":null,"positionTitle":"Engineer","budgetedSalary":95000}"#,
        )?;
        assert_eq!(entity.primary_key(), 0);
        assert_eq!(entity.kind(), ResourceKind::Positions);
        Ok(())
    }

    #[test]
    fn employee_body_without_key_is_rejected() {
        let error = Entity::from_json(ResourceKind::Employees, br#"{"fullName":"Ada"}"#)
            .expect_err("employee id is user-supplied and required");
        assert!(error.to_string().contains("decode employees record"));
    }
}
