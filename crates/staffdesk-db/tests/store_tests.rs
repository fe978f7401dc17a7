// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use staffdesk_app::{Entity, ProjectId, ResourceKind};
use staffdesk_db::{Repository, Store, StoreError, validate_db_path};
use staffdesk_testkit::{StaffFaker, temp_db_path};

fn store() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn store_error(error: &anyhow::Error) -> Option<&StoreError> {
    error.downcast_ref::<StoreError>()
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("/tmp/staffdesk.db").is_ok());
    assert!(validate_db_path(":memory:").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        store.create(&Entity::Employee(StaffFaker::new(1).employee()))?;
    }

    let reopened = Store::open(&path)?;
    reopened.bootstrap()?;
    assert_eq!(reopened.list(ResourceKind::Employees)?.len(), 1);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = store()?;
    store.raw_connection().execute_batch(
        "
        PRAGMA foreign_keys = OFF;
        DROP TABLE positions;
        CREATE TABLE positions (
          position_id INTEGER PRIMARY KEY,
          position_title TEXT NOT NULL
        );
        ",
    )?;

    let error = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = error.to_string();
    assert!(message.contains("table `positions` is missing required columns"));
    assert!(message.contains("budgeted_salary"));
    Ok(())
}

#[test]
fn created_employee_is_listed() -> Result<()> {
    let store = store()?;
    let employee = StaffFaker::new(2).employee();
    let id = store.create(&Entity::Employee(employee.clone()))?;
    assert_eq!(id, employee.employee_id.get());

    let listed = store.list(ResourceKind::Employees)?;
    assert_eq!(listed, vec![Entity::Employee(employee)]);
    Ok(())
}

#[test]
fn duplicate_employee_id_is_a_conflict() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(3);
    let first = faker.employee();
    let mut second = faker.employee();
    second.employee_id = first.employee_id;

    store.create(&Entity::Employee(first))?;
    let error = store
        .create(&Entity::Employee(second))
        .expect_err("duplicate key should be rejected");
    assert!(matches!(
        store_error(&error),
        Some(StoreError::Conflict {
            kind: ResourceKind::Employees,
            ..
        })
    ));
    assert_eq!(store.list(ResourceKind::Employees)?.len(), 1);
    Ok(())
}

#[test]
fn duplicate_username_is_a_conflict() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(4);
    let first = faker.employee();
    let mut second = faker.employee();
    second.username = first.username.clone();

    store.create(&Entity::Employee(first))?;
    let error = store
        .create(&Entity::Employee(second))
        .expect_err("duplicate username should be rejected");
    assert!(matches!(
        store_error(&error),
        Some(StoreError::Conflict { .. })
    ));
    Ok(())
}

#[test]
fn autoinc_keys_are_assigned_by_the_database() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(5);
    let first = store.create(&Entity::Position(faker.position()))?;
    let second = store.create(&Entity::Position(faker.position()))?;
    assert!(second > first);

    let listed = store.list(ResourceKind::Positions)?;
    let keys = listed.iter().map(Entity::primary_key).collect::<Vec<_>>();
    assert_eq!(keys, vec![first, second]);
    Ok(())
}

#[test]
fn resources_join_project_name_and_filter_by_project() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(6);
    let project = faker.project();
    let project_name = project.project_name.clone();
    let project_id = ProjectId::new(store.create(&Entity::Project(project))?);

    store.create(&Entity::Resource(faker.resource(Some(project_id))))?;
    store.create(&Entity::Resource(faker.resource(None)))?;

    let all = store.list(ResourceKind::Resources)?;
    assert_eq!(all.len(), 2);
    let Entity::Resource(linked) = &all[0] else {
        panic!("expected resource rows");
    };
    assert_eq!(linked.project_name.as_deref(), Some(project_name.as_str()));

    let filtered = store.list_filtered(ResourceKind::Resources, project_id.get())?;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].primary_key(), all[0].primary_key());
    Ok(())
}

#[test]
fn deleting_project_clears_resource_link_and_cascades_staffing() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(7);
    let employee = faker.employee();
    let employee_id = employee.employee_id;
    store.create(&Entity::Employee(employee))?;
    let project_id = ProjectId::new(store.create(&Entity::Project(faker.project()))?);
    store.create(&Entity::Resource(faker.resource(Some(project_id))))?;
    store.create(&Entity::ProjectEmployee(
        faker.project_employee(employee_id, project_id),
    ))?;

    store.delete(ResourceKind::Projects, project_id.get())?;

    let resources = store.list(ResourceKind::Resources)?;
    let Entity::Resource(orphan) = &resources[0] else {
        panic!("expected resource rows");
    };
    assert_eq!(orphan.project_id, None);
    assert_eq!(orphan.project_name, None);
    assert!(store.list(ResourceKind::ProjectEmployees)?.is_empty());
    Ok(())
}

#[test]
fn staffing_pair_is_unique() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(8);
    let employee = faker.employee();
    let employee_id = employee.employee_id;
    store.create(&Entity::Employee(employee))?;
    let project_id = ProjectId::new(store.create(&Entity::Project(faker.project()))?);

    store.create(&Entity::ProjectEmployee(
        faker.project_employee(employee_id, project_id),
    ))?;
    let error = store
        .create(&Entity::ProjectEmployee(
            faker.project_employee(employee_id, project_id),
        ))
        .expect_err("same employee twice on a project");
    assert!(matches!(
        store_error(&error),
        Some(StoreError::Conflict { .. })
    ));
    Ok(())
}

#[test]
fn unknown_reference_is_invalid() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(9);
    let error = store
        .create(&Entity::Resource(faker.resource(Some(ProjectId::new(404)))))
        .expect_err("project 404 does not exist");
    assert_eq!(
        store_error(&error),
        Some(&StoreError::InvalidReference {
            kind: ResourceKind::Resources
        })
    );
    Ok(())
}

#[test]
fn update_keeps_path_key_and_rewrites_fields() -> Result<()> {
    let store = store()?;
    let mut faker = StaffFaker::new(10);
    let employee = faker.employee();
    let id = employee.employee_id.get();
    store.create(&Entity::Employee(employee.clone()))?;

    let mut renamed = employee;
    renamed.full_name = "Renamed Person".to_owned();
    renamed.employee_id = staffdesk_app::EmployeeId::new(id + 500);
    store.update(id, &Entity::Employee(renamed))?;

    let listed = store.list(ResourceKind::Employees)?;
    assert_eq!(listed.len(), 1);
    let Entity::Employee(stored) = &listed[0] else {
        panic!("expected employee rows");
    };
    assert_eq!(stored.employee_id.get(), id);
    assert_eq!(stored.full_name, "Renamed Person");
    Ok(())
}

#[test]
fn delete_missing_row_is_not_found() -> Result<()> {
    let store = store()?;
    let error = store
        .delete(ResourceKind::Projects, 77)
        .expect_err("nothing to delete");
    assert_eq!(
        store_error(&error),
        Some(&StoreError::NotFound {
            kind: ResourceKind::Projects,
            id: 77
        })
    );
    Ok(())
}

#[test]
fn demo_seed_populates_every_table_once() -> Result<()> {
    let store = store()?;
    store.seed_demo_data()?;
    for kind in ResourceKind::ALL {
        assert!(!store.list(kind)?.is_empty(), "{kind:?} should be seeded");
    }

    let employees = store.count(ResourceKind::Employees)?;
    store.seed_demo_data()?;
    assert_eq!(store.count(ResourceKind::Employees)?, employees);
    Ok(())
}
