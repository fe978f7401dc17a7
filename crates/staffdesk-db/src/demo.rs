// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use staffdesk_app::{
    Employee, EmployeeId, EmployeePosition, EmployeePositionId, Entity, Position, PositionId,
    Project, ProjectEmployee, ProjectEmployeeId, ProjectId, Resource, ResourceId, ResourceKind,
};
use time::macros::date;

use crate::{Repository, Store};

const EMPLOYEES: [(i64, &str, &str, Option<f64>); 4] = [
    (1001, "Ada Lovelace", "alovelace", Some(320.0)),
    (1002, "Grace Hopper", "ghopper", Some(410.5)),
    (1003, "Alan Turing", "aturing", None),
    (1004, "Katherine Johnson", "kjohnson", Some(96.25)),
];

const POSITIONS: [(&str, f64); 3] = [
    ("Software Engineer", 120_000.0),
    ("Project Manager", 105_000.0),
    ("Data Analyst", 85_000.0),
];

const RESOURCES: [(&str, f64, Option<&str>, Option<usize>); 4] = [
    ("Laptop", 1_450.0, Some("14 inch developer laptop"), Some(0)),
    ("Test Rig", 8_200.0, None, Some(1)),
    ("Projector", 640.0, Some("Conference room"), None),
    ("GPU Server", 23_500.0, Some("Shared training box"), Some(1)),
];

impl Store {
    /// Fills an empty database with a small connected data set. A database
    /// that already has employees is left alone.
    pub fn seed_demo_data(&self) -> Result<()> {
        if self.count(ResourceKind::Employees)? > 0 {
            tracing::debug!("database already has data; skipping demo seed");
            return Ok(());
        }

        for (id, full_name, username, hours) in EMPLOYEES {
            self.create(&Entity::Employee(Employee {
                employee_id: EmployeeId::new(id),
                full_name: full_name.to_owned(),
                username: username.to_owned(),
                project_hours_total: hours,
            }))
            .with_context(|| format!("seed employee {username}"))?;
        }

        let mut positions = Vec::with_capacity(POSITIONS.len());
        for (title, salary) in POSITIONS {
            let id = self
                .create(&Entity::Position(Position {
                    position_id: PositionId::default(),
                    position_title: title.to_owned(),
                    budgeted_salary: salary,
                }))
                .with_context(|| format!("seed position {title}"))?;
            positions.push(PositionId::new(id));
        }

        let projects = [
            Project {
                project_id: ProjectId::default(),
                project_name: "Atlas Migration".to_owned(),
                start_date: date!(2024 - 01 - 15),
                end_date: Some(date!(2024 - 09 - 30)),
                projected_budget: Some(250_000.0),
            },
            Project {
                project_id: ProjectId::default(),
                project_name: "Borealis Analytics".to_owned(),
                start_date: date!(2024 - 06 - 01),
                end_date: None,
                projected_budget: None,
            },
        ];
        let mut project_ids = Vec::with_capacity(projects.len());
        for project in projects {
            let name = project.project_name.clone();
            let id = self
                .create(&Entity::Project(project))
                .with_context(|| format!("seed project {name}"))?;
            project_ids.push(ProjectId::new(id));
        }

        for (name, cost, desc, project) in RESOURCES {
            self.create(&Entity::Resource(Resource {
                resource_id: ResourceId::default(),
                resource_name: name.to_owned(),
                resource_cost: cost,
                resource_desc: desc.map(str::to_owned),
                project_id: project.and_then(|index| project_ids.get(index).copied()),
                project_name: None,
            }))
            .with_context(|| format!("seed resource {name}"))?;
        }

        let assignments = [
            (1001, 0, 118_000.0, date!(2023 - 03 - 01), None),
            (1002, 1, 104_000.0, date!(2022 - 11 - 14), None),
            (1003, 2, 82_500.0, date!(2021 - 05 - 03), Some(date!(2023 - 12 - 31))),
            (1003, 0, 121_000.0, date!(2024 - 01 - 02), None),
        ];
        for (employee, position, salary, start_date, end_date) in assignments {
            let Some(position_id) = positions.get(position).copied() else {
                continue;
            };
            self.create(&Entity::EmployeePosition(EmployeePosition {
                employee_position_id: EmployeePositionId::default(),
                employee_id: EmployeeId::new(employee),
                position_id,
                salary,
                start_date,
                end_date,
            }))
            .with_context(|| format!("seed position assignment for employee {employee}"))?;
        }

        let staffing = [
            (1001, 0, "Tech Lead", Some(220.0)),
            (1002, 0, "Manager", Some(180.5)),
            (1002, 1, "Advisor", Some(230.0)),
            (1004, 1, "Analyst", Some(96.25)),
        ];
        for (employee, project, role, hours) in staffing {
            let Some(project_id) = project_ids.get(project).copied() else {
                continue;
            };
            self.create(&Entity::ProjectEmployee(ProjectEmployee {
                project_employee_id: ProjectEmployeeId::default(),
                employee_id: EmployeeId::new(employee),
                project_id,
                role: role.to_owned(),
                hours_worked_total: hours,
            }))
            .with_context(|| format!("seed {role} on project {}", project_id.get()))?;
        }

        tracing::info!("seeded demo data");
        Ok(())
    }
}
