// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use staffdesk_app::{
    Record, ResourceKind, SyncOp, SyncOutcome, SyncRequest, Value, refresh_table, render_table,
};
use staffdesk_client::Client;
use staffdesk_db::Store;
use staffdesk_server::ApiServer;
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_header() -> Header {
    Header::from_bytes("Content-Type", "application/json").expect("valid content type header")
}

fn serve_demo_store() -> Result<String> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.seed_demo_data()?;
    let server = ApiServer::bind("127.0.0.1:0", store)?;
    let addr = format!("http://{}", server.local_addr()?);
    thread::spawn(move || server.serve());
    Ok(addr)
}

#[test]
fn unreachable_server_is_a_failed_sync_with_remediation() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))?;

    let error = client
        .fetch("/employees")
        .expect_err("nothing listens on port 1");
    assert!(error.to_string().contains("staffdesk --serve"));

    let outcome = client.sync(&SyncRequest::Delete {
        endpoint: "/employees".to_owned(),
        id: "1001".to_owned(),
    });
    assert_eq!(
        outcome,
        SyncOutcome::Failed {
            op: SyncOp::Delete,
            status: None
        }
    );
    Ok(())
}

#[test]
fn create_conflict_is_reported_as_duplicate() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method().as_str(), "POST");
        assert_eq!(request.url(), "/employees");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body");
        let sent: serde_json::Value = serde_json::from_str(&body).expect("JSON body");
        assert_eq!(sent["employeeID"], 1001);

        let response = Response::from_string(r#"{"error":"employees record duplicates"}"#)
            .with_status_code(409)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let outcome = client.sync(&SyncRequest::Create {
        endpoint: "/employees".to_owned(),
        record: Record::new()
            .with("employeeID", 1001)
            .with("fullName", "Ada Lovelace"),
    });
    assert_eq!(outcome, SyncOutcome::Conflict);
    assert_eq!(outcome.feedback().message, "Error: Duplicate entry detected.");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn update_uses_member_path_and_reports_server_errors() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method().as_str(), "PUT");
        assert_eq!(request.url(), "/projects/3");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body");
        assert!(body.contains("projectID"));
        let response = Response::from_string("database is locked").with_status_code(500);
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let outcome = client.sync(&SyncRequest::Update {
        endpoint: "/projects/".to_owned(),
        id: "3".to_owned(),
        record: Record::new().with("projectID", 3),
    });
    assert_eq!(
        outcome,
        SyncOutcome::Failed {
            op: SyncOp::Update,
            status: Some(500)
        }
    );
    assert_eq!(outcome.feedback().message, "Error updating record");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_surfaces_error_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(r#"{"error":"no route for /vendors"}"#)
            .with_status_code(404)
            .with_header(json_header());
        request.respond(response).expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch("/vendors")
        .expect_err("unknown collection");
    assert_eq!(error.to_string(), "server error (404): no route for /vendors");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn live_server_round_trip() -> Result<()> {
    let addr = serve_demo_store()?;
    let mut client = Client::new(&addr, Duration::from_secs(2))?;
    client.ping()?;

    let employees = client.fetch("/employees")?;
    assert_eq!(employees.len(), 4);
    assert_eq!(employees[0].value("fullName"), &Value::text("Ada Lovelace"));

    let added = client.sync(&SyncRequest::Create {
        endpoint: "/positions".to_owned(),
        record: Record::new()
            .with("positionID", Value::Null)
            .with("positionTitle", "QA Lead")
            .with("budgetedSalary", 90_000.0),
    });
    assert_eq!(added, SyncOutcome::Applied(SyncOp::Create));

    let duplicate = client.sync(&SyncRequest::Create {
        endpoint: "/positions".to_owned(),
        record: Record::new()
            .with("positionTitle", "QA Lead")
            .with("budgetedSalary", 91_000.0),
    });
    assert_eq!(duplicate, SyncOutcome::Conflict);

    let positions = client.fetch("/positions")?;
    assert_eq!(positions.len(), 4);

    let projects = ResourceKind::Resources.load_references(&mut client)?;
    let columns = ResourceKind::Resources.columns(&projects)?;
    let mut table = render_table(&[], &columns, None);
    refresh_table(&mut client, "/resources/2", &columns, &mut table)?;
    assert_eq!(table.rows.len(), 2);
    assert!(
        table
            .rows
            .iter()
            .all(|row| row.cells[4].display == "Borealis Analytics")
    );

    let removed = client.sync(&SyncRequest::Delete {
        endpoint: "/resources".to_owned(),
        id: table.rows[0].id(),
    });
    assert_eq!(removed, SyncOutcome::Applied(SyncOp::Delete));
    assert_eq!(client.fetch("/resources/2")?.len(), 1);
    Ok(())
}
