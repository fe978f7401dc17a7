// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use staffdesk_app::{
    Employee, EmployeeId, EmployeePosition, EmployeePositionId, Position, PositionId, Project,
    ProjectEmployee, ProjectEmployeeId, ProjectId, Resource, ResourceId,
};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const POSITION_LEVELS: [&str; 4] = ["Junior", "Senior", "Staff", "Principal"];
const POSITION_ROLES: [&str; 8] = [
    "Engineer",
    "Designer",
    "Analyst",
    "Accountant",
    "Recruiter",
    "Architect",
    "Technician",
    "Coordinator",
];

const PROJECT_CODENAMES: [&str; 12] = [
    "Atlas", "Borealis", "Cassini", "Dynamo", "Ember", "Fjord", "Granite", "Harbor", "Ion",
    "Juniper", "Keystone", "Lumen",
];
const PROJECT_KINDS: [&str; 6] = [
    "Migration",
    "Rollout",
    "Audit",
    "Redesign",
    "Integration",
    "Analytics",
];

const RESOURCE_NAMES: [&str; 10] = [
    "Laptop",
    "Monitor",
    "Test Rig",
    "Projector",
    "GPU Server",
    "License Seat",
    "Vehicle",
    "Oscilloscope",
    "Tablet",
    "Docking Station",
];

const ROLES: [&str; 6] = ["Lead", "Developer", "Reviewer", "Manager", "Advisor", "Tester"];

const EPOCH: Date = date!(2020 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for staffing records. Every call yields a unique
/// employee id, username, position title, and project name.
#[derive(Debug, Clone)]
pub struct StaffFaker {
    rng: DeterministicRng,
    sequence: i64,
}

impl StaffFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            sequence: 0,
        }
    }

    pub fn employee(&mut self) -> Employee {
        let serial = self.next_serial();
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        Employee {
            employee_id: EmployeeId::new(1000 + serial),
            full_name: format!("{first} {last}"),
            username: format!("{}{}{serial}", first[..1].to_lowercase(), last.to_lowercase()),
            project_hours_total: self.maybe(|faker| faker.hours()),
        }
    }

    pub fn position(&mut self) -> Position {
        let serial = self.next_serial();
        let level = self.pick(&POSITION_LEVELS);
        let role = self.pick(&POSITION_ROLES);
        Position {
            position_id: PositionId::default(),
            position_title: format!("{level} {role} {serial}"),
            budgeted_salary: self.money(45_000, 180_000),
        }
    }

    pub fn project(&mut self) -> Project {
        let serial = self.next_serial();
        let start_date = self.date();
        let end_date = if self.rng.bool() {
            Some(start_date + Duration::days(self.int_range(30, 540)))
        } else {
            None
        };
        Project {
            project_id: ProjectId::default(),
            project_name: format!(
                "{} {} {serial}",
                self.pick(&PROJECT_CODENAMES),
                self.pick(&PROJECT_KINDS)
            ),
            start_date,
            end_date,
            projected_budget: self.maybe(|faker| faker.money(10_000, 900_000)),
        }
    }

    pub fn resource(&mut self, project_id: Option<ProjectId>) -> Resource {
        Resource {
            resource_id: ResourceId::default(),
            resource_name: self.pick(&RESOURCE_NAMES).to_owned(),
            resource_cost: self.money(50, 25_000),
            resource_desc: self.maybe(|faker| format!("Asset tag {}", faker.int_range(100, 999))),
            project_id,
            project_name: None,
        }
    }

    pub fn employee_position(
        &mut self,
        employee_id: EmployeeId,
        position_id: PositionId,
    ) -> EmployeePosition {
        let start_date = self.date();
        EmployeePosition {
            employee_position_id: EmployeePositionId::default(),
            employee_id,
            position_id,
            salary: self.money(40_000, 200_000),
            start_date,
            end_date: self.maybe(|faker| start_date + Duration::days(faker.int_range(90, 900))),
        }
    }

    pub fn project_employee(
        &mut self,
        employee_id: EmployeeId,
        project_id: ProjectId,
    ) -> ProjectEmployee {
        ProjectEmployee {
            project_employee_id: ProjectEmployeeId::default(),
            employee_id,
            project_id,
            role: self.pick(&ROLES).to_owned(),
            hours_worked_total: self.maybe(|faker| faker.hours()),
        }
    }

    fn next_serial(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn maybe<T>(&mut self, make: impl FnOnce(&mut Self) -> T) -> Option<T> {
        if self.rng.bool() { Some(make(self)) } else { None }
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    /// Whole dollars, so the value survives any decimal formatting unchanged.
    fn money(&mut self, min: i64, max: i64) -> f64 {
        self.int_range(min, max) as f64
    }

    fn hours(&mut self) -> f64 {
        self.int_range(0, 4_000) as f64 / 4.0
    }

    fn date(&mut self) -> Date {
        EPOCH + Duration::days(self.int_range(0, 5 * 365))
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("staffdesk.db");
    Ok((dir, db_path))
}
