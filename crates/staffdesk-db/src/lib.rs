// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod demo;
mod error;

pub use error::StoreError;

use anyhow::{Context, Result, anyhow, bail};
use error::write_error;
use rusqlite::{Connection, Row, params};
use staffdesk_app::{
    Employee, EmployeeId, EmployeePosition, EmployeePositionId, Entity, Position, PositionId,
    Project, ProjectEmployee, ProjectEmployeeId, ProjectId, Resource, ResourceId, ResourceKind,
    format_date, parse_calendar_date,
};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;

pub const APP_NAME: &str = "staffdesk";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "employees",
        &["employee_id", "full_name", "username", "project_hours_total"],
    ),
    (
        "positions",
        &["position_id", "position_title", "budgeted_salary"],
    ),
    (
        "projects",
        &[
            "project_id",
            "project_name",
            "start_date",
            "end_date",
            "projected_budget",
        ],
    ),
    (
        "resources",
        &[
            "resource_id",
            "resource_name",
            "resource_cost",
            "resource_desc",
            "project_id",
        ],
    ),
    (
        "employee_positions",
        &[
            "employee_position_id",
            "employee_id",
            "position_id",
            "salary",
            "start_date",
            "end_date",
        ],
    ),
    (
        "project_employees",
        &[
            "project_employee_id",
            "employee_id",
            "project_id",
            "role",
            "hours_worked_total",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_resources_project_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_resources_project_id ON resources (project_id);",
    },
    RequiredIndex {
        name: "idx_employee_positions_employee_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_employee_positions_employee_id ON employee_positions (employee_id);",
    },
    RequiredIndex {
        name: "idx_employee_positions_position_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_employee_positions_position_id ON employee_positions (position_id);",
    },
    RequiredIndex {
        name: "idx_project_employees_employee_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_project_employees_employee_id ON project_employees (employee_id);",
    },
    RequiredIndex {
        name: "idx_project_employees_project_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_project_employees_project_id ON project_employees (project_id);",
    },
];

type RowMapper = fn(&Row<'_>) -> rusqlite::Result<Entity>;

/// Per-resource SQL used by the generic read and delete paths.
struct TableSql {
    table: &'static str,
    key_column: &'static str,
    select: &'static str,
    /// Column `GET /{resource}/{id}` filters on.
    filter_column: Option<&'static str>,
    map: RowMapper,
}

fn table_sql(kind: ResourceKind) -> TableSql {
    match kind {
        ResourceKind::Employees => TableSql {
            table: "employees",
            key_column: "employee_id",
            select: "
                SELECT employee_id, full_name, username, project_hours_total
                FROM employees
                ",
            filter_column: None,
            map: employee_from_row,
        },
        ResourceKind::Positions => TableSql {
            table: "positions",
            key_column: "position_id",
            select: "
                SELECT position_id, position_title, budgeted_salary
                FROM positions
                ",
            filter_column: None,
            map: position_from_row,
        },
        ResourceKind::Projects => TableSql {
            table: "projects",
            key_column: "project_id",
            select: "
                SELECT project_id, project_name, start_date, end_date, projected_budget
                FROM projects
                ",
            filter_column: None,
            map: project_from_row,
        },
        ResourceKind::Resources => TableSql {
            table: "resources",
            key_column: "resource_id",
            select: "
                SELECT
                  r.resource_id, r.resource_name, r.resource_cost, r.resource_desc,
                  r.project_id, p.project_name
                FROM resources r
                LEFT JOIN projects p ON p.project_id = r.project_id
                ",
            filter_column: Some("r.project_id"),
            map: resource_from_row,
        },
        ResourceKind::EmployeePositions => TableSql {
            table: "employee_positions",
            key_column: "employee_position_id",
            select: "
                SELECT
                  employee_position_id, employee_id, position_id, salary,
                  start_date, end_date
                FROM employee_positions
                ",
            filter_column: Some("employee_id"),
            map: employee_position_from_row,
        },
        ResourceKind::ProjectEmployees => TableSql {
            table: "project_employees",
            key_column: "project_employee_id",
            select: "
                SELECT project_employee_id, employee_id, project_id, role, hours_worked_total
                FROM project_employees
                ",
            filter_column: Some("project_id"),
            map: project_employee_from_row,
        },
    }
}

/// Data access the REST boundary is built on.
pub trait Repository {
    fn list(&self, kind: ResourceKind) -> Result<Vec<Entity>>;

    /// Rows whose filter foreign key equals `parent_id`.
    fn list_filtered(&self, kind: ResourceKind, parent_id: i64) -> Result<Vec<Entity>>;

    /// Inserts `entity` and returns its primary key.
    fn create(&self, entity: &Entity) -> Result<i64>;

    /// Overwrites row `id` with `entity`; the key inside `entity` is ignored.
    fn update(&self, id: i64, entity: &Entity) -> Result<()>;

    fn delete(&self, kind: ResourceKind, id: i64) -> Result<()>;
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the schema in an empty database, or checks an existing one.
    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            tracing::info!("created database schema");
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn count(&self, kind: ResourceKind) -> Result<i64> {
        let sql = table_sql(kind);
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", sql.table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("count {}", kind.label()))
    }

    fn query(&self, kind: ResourceKind, parent_id: Option<i64>) -> Result<Vec<Entity>> {
        let table = table_sql(kind);
        let mut sql = table.select.to_owned();
        if parent_id.is_some() {
            let column = table
                .filter_column
                .ok_or(StoreError::NoFilterRoute(kind))?;
            sql.push_str(&format!("WHERE {column} = ?1\n"));
        }
        sql.push_str(&format!("ORDER BY {} ASC", table.key_column));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare {} query", kind.label()))?;
        let rows = match parent_id {
            Some(id) => stmt.query_map(params![id], table.map),
            None => stmt.query_map([], table.map),
        }
        .with_context(|| format!("query {}", kind.label()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect {}", kind.label()))
    }

    fn insert(&self, entity: &Entity) -> rusqlite::Result<i64> {
        match entity {
            Entity::Employee(employee) => {
                self.conn.execute(
                    "
                    INSERT INTO employees (employee_id, full_name, username, project_hours_total)
                    VALUES (?, ?, ?, ?)
                    ",
                    params![
                        employee.employee_id.get(),
                        employee.full_name,
                        employee.username,
                        employee.project_hours_total,
                    ],
                )?;
                return Ok(employee.employee_id.get());
            }
            Entity::Position(position) => self.conn.execute(
                "INSERT INTO positions (position_title, budgeted_salary) VALUES (?, ?)",
                params![position.position_title, position.budgeted_salary],
            )?,
            Entity::Project(project) => self.conn.execute(
                "
                INSERT INTO projects (project_name, start_date, end_date, projected_budget)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    project.project_name,
                    format_date(project.start_date),
                    project.end_date.map(format_date),
                    project.projected_budget,
                ],
            )?,
            Entity::Resource(resource) => self.conn.execute(
                "
                INSERT INTO resources (resource_name, resource_cost, resource_desc, project_id)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    resource.resource_name,
                    resource.resource_cost,
                    resource.resource_desc,
                    resource.project_id.map(ProjectId::get),
                ],
            )?,
            Entity::EmployeePosition(assignment) => self.conn.execute(
                "
                INSERT INTO employee_positions (
                  employee_id, position_id, salary, start_date, end_date
                ) VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    assignment.employee_id.get(),
                    assignment.position_id.get(),
                    assignment.salary,
                    format_date(assignment.start_date),
                    assignment.end_date.map(format_date),
                ],
            )?,
            Entity::ProjectEmployee(staffing) => self.conn.execute(
                "
                INSERT INTO project_employees (employee_id, project_id, role, hours_worked_total)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    staffing.employee_id.get(),
                    staffing.project_id.get(),
                    staffing.role,
                    staffing.hours_worked_total,
                ],
            )?,
        };
        Ok(self.conn.last_insert_rowid())
    }

    fn overwrite(&self, id: i64, entity: &Entity) -> rusqlite::Result<usize> {
        match entity {
            Entity::Employee(employee) => self.conn.execute(
                "
                UPDATE employees
                SET full_name = ?, username = ?, project_hours_total = ?
                WHERE employee_id = ?
                ",
                params![
                    employee.full_name,
                    employee.username,
                    employee.project_hours_total,
                    id,
                ],
            ),
            Entity::Position(position) => self.conn.execute(
                "
                UPDATE positions
                SET position_title = ?, budgeted_salary = ?
                WHERE position_id = ?
                ",
                params![position.position_title, position.budgeted_salary, id],
            ),
            Entity::Project(project) => self.conn.execute(
                "
                UPDATE projects
                SET project_name = ?, start_date = ?, end_date = ?, projected_budget = ?
                WHERE project_id = ?
                ",
                params![
                    project.project_name,
                    format_date(project.start_date),
                    project.end_date.map(format_date),
                    project.projected_budget,
                    id,
                ],
            ),
            Entity::Resource(resource) => self.conn.execute(
                "
                UPDATE resources
                SET resource_name = ?, resource_cost = ?, resource_desc = ?, project_id = ?
                WHERE resource_id = ?
                ",
                params![
                    resource.resource_name,
                    resource.resource_cost,
                    resource.resource_desc,
                    resource.project_id.map(ProjectId::get),
                    id,
                ],
            ),
            Entity::EmployeePosition(assignment) => self.conn.execute(
                "
                UPDATE employee_positions
                SET employee_id = ?, position_id = ?, salary = ?, start_date = ?, end_date = ?
                WHERE employee_position_id = ?
                ",
                params![
                    assignment.employee_id.get(),
                    assignment.position_id.get(),
                    assignment.salary,
                    format_date(assignment.start_date),
                    assignment.end_date.map(format_date),
                    id,
                ],
            ),
            Entity::ProjectEmployee(staffing) => self.conn.execute(
                "
                UPDATE project_employees
                SET employee_id = ?, project_id = ?, role = ?, hours_worked_total = ?
                WHERE project_employee_id = ?
                ",
                params![
                    staffing.employee_id.get(),
                    staffing.project_id.get(),
                    staffing.role,
                    staffing.hours_worked_total,
                    id,
                ],
            ),
        }
    }
}

impl Repository for Store {
    fn list(&self, kind: ResourceKind) -> Result<Vec<Entity>> {
        self.query(kind, None)
    }

    fn list_filtered(&self, kind: ResourceKind, parent_id: i64) -> Result<Vec<Entity>> {
        self.query(kind, Some(parent_id))
    }

    fn create(&self, entity: &Entity) -> Result<i64> {
        let kind = entity.kind();
        let id = self
            .insert(entity)
            .map_err(|error| write_error(kind, error))
            .with_context(|| format!("insert {} record", kind.label()))?;
        tracing::debug!(resource = kind.as_str(), id, "inserted record");
        Ok(id)
    }

    fn update(&self, id: i64, entity: &Entity) -> Result<()> {
        let kind = entity.kind();
        let rows_affected = self
            .overwrite(id, entity)
            .map_err(|error| write_error(kind, error))
            .with_context(|| format!("update {} record {id}", kind.label()))?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound { kind, id }.into());
        }
        tracing::debug!(resource = kind.as_str(), id, "updated record");
        Ok(())
    }

    fn delete(&self, kind: ResourceKind, id: i64) -> Result<()> {
        let table = table_sql(kind);
        let rows_affected = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE {} = ?", table.table, table.key_column),
                params![id],
            )
            .map_err(|error| write_error(kind, error))
            .with_context(|| format!("delete {} record {id}", kind.label()))?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound { kind, id }.into());
        }
        tracing::debug!(resource = kind.as_str(), id, "deleted record");
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("STAFFDESK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set STAFFDESK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("staffdesk.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::Employee(Employee {
        employee_id: EmployeeId::new(row.get(0)?),
        full_name: row.get(1)?,
        username: row.get(2)?,
        project_hours_total: row.get(3)?,
    }))
}

fn position_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::Position(Position {
        position_id: PositionId::new(row.get(0)?),
        position_title: row.get(1)?,
        budgeted_salary: row.get(2)?,
    }))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::Project(Project {
        project_id: ProjectId::new(row.get(0)?),
        project_name: row.get(1)?,
        start_date: required_date(row, 2)?,
        end_date: optional_date(row, 3)?,
        projected_budget: row.get(4)?,
    }))
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::Resource(Resource {
        resource_id: ResourceId::new(row.get(0)?),
        resource_name: row.get(1)?,
        resource_cost: row.get(2)?,
        resource_desc: row.get(3)?,
        project_id: row.get::<_, Option<i64>>(4)?.map(ProjectId::new),
        project_name: row.get(5)?,
    }))
}

fn employee_position_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::EmployeePosition(EmployeePosition {
        employee_position_id: EmployeePositionId::new(row.get(0)?),
        employee_id: EmployeeId::new(row.get(1)?),
        position_id: PositionId::new(row.get(2)?),
        salary: row.get(3)?,
        start_date: required_date(row, 4)?,
        end_date: optional_date(row, 5)?,
    }))
}

fn project_employee_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity::ProjectEmployee(ProjectEmployee {
        project_employee_id: ProjectEmployeeId::new(row.get(0)?),
        employee_id: EmployeeId::new(row.get(1)?),
        project_id: ProjectId::new(row.get(2)?),
        role: row.get(3)?,
        hours_worked_total: row.get(4)?,
    }))
}

fn required_date(row: &Row<'_>, index: usize) -> rusqlite::Result<Date> {
    let raw: String = row.get(index)?;
    parse_date(&raw).map_err(|error| to_sql_error(index, error))
}

fn optional_date(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<Date>> {
    let raw: Option<String> = row.get(index)?;
    raw.as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_date)
        .transpose()
        .map_err(|error| to_sql_error(index, error))
}

fn parse_date(raw: &str) -> Result<Date> {
    parse_calendar_date(raw).ok_or_else(|| anyhow!("unsupported date format {raw:?}"))
}

fn to_sql_error(index: usize, error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; point [storage] db_path at a staffdesk database"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; recreate the database or add the columns",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("database is missing required indexes: {}", missing.join(", "));
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}
