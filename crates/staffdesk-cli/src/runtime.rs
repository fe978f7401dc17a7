// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use staffdesk_app::{Record, RecordSource, SyncOutcome, SyncRequest};
use staffdesk_client::Client;
use staffdesk_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;

/// Drives the table against a REST server.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RecordSource for HttpRuntime {
    fn fetch_records(&mut self, endpoint: &str) -> Result<Vec<Record>> {
        self.client.fetch(endpoint)
    }
}

impl staffdesk_tui::AppRuntime for HttpRuntime {
    fn run_sync(&mut self, request: &SyncRequest) -> SyncOutcome {
        self.client.sync(request)
    }

    fn spawn_sync(&mut self, request: SyncRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("sync-{}", request.op().method().to_lowercase()))
            .spawn(move || {
                let outcome = client.sync(&request);
                // Receiver is gone once the UI has exited.
                let _ = tx.send(InternalEvent::SyncCompleted { request, outcome });
            })
            .context("spawn sync worker")?;
        Ok(())
    }
}
