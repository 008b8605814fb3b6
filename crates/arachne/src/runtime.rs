//! Single-node runtime: manager + N workers + exporter over the in-memory bus.

use anyhow::{Context, Result};
use arachne_bus::{
    spawn_exporter_adapter, spawn_manager_adapter, spawn_worker_adapter, MemorySpiderBusBackend,
    SpiderBus,
};
use arachne_engine::ActionRegistry;
use arachne_manager::Manager;
use arachne_protocol::{BusConfig, Workflow};
use arachne_sinks::{CsvExporterBackend, Exporter, JsonLinesExporterBackend};
use arachne_worker::Worker;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SingleNodeOptions {
    pub workers: usize,
    pub output_dir: PathBuf,
    pub bus: BusConfig,
}

impl Default for SingleNodeOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            output_dir: PathBuf::from("output"),
            bus: BusConfig::default(),
        }
    }
}

pub struct RunSummary {
    pub job_uuid: Uuid,
    pub items_csv: PathBuf,
}

/// Field names for the exporter header, derived from every item-producing
/// field-join template in the workflow.
fn collect_field_names(workflow: &Workflow) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for template in &workflow.task_templates {
        for action in &template.action_templates {
            if action.struct_name != "FieldJoinAction" || action.param("itemName").is_none() {
                continue;
            }
            for name in action.require_strings("inputNames")? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    Ok(names)
}

/// Declare the job done once the bus has stayed empty for the grace period.
async fn wait_for_idle_bus(bus: &SpiderBus, config: &BusConfig) -> Result<()> {
    let mut empty_since: Option<Instant> = None;
    loop {
        tokio::time::sleep(config.poll_interval).await;
        if bus.is_empty().await.context("failed to poll bus depth")? {
            let since = empty_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= config.idle_grace {
                return Ok(());
            }
        } else {
            empty_since = None;
        }
    }
}

/// Launch the full single-node topology, run the workflow to quiescence, and
/// tear everything down. Fails before any work is emitted when the workflow
/// does not validate.
pub async fn run_single_node(
    workflow: Workflow,
    options: SingleNodeOptions,
) -> Result<RunSummary> {
    let registry = Arc::new(ActionRegistry::with_builtin_actions());
    let bus = SpiderBus::new(Arc::new(MemorySpiderBusBackend::new(
        options.bus.channel_capacity,
    )));
    let (done_tx, done_rx) = watch::channel(false);

    let field_names = collect_field_names(&workflow)?;

    let (mut manager, manager_channels) =
        Manager::new(registry.clone(), options.bus.channel_capacity, done_rx.clone());
    let job_uuid = manager
        .start_scraping_job(workflow)
        .await
        .context("workflow validation failed")?;

    let mut exporter = Exporter::new();
    exporter.add_backend(Box::new(CsvExporterBackend::new(&options.output_dir)));
    exporter.add_backend(Box::new(JsonLinesExporterBackend::new(&options.output_dir)));
    exporter
        .start_exporting(job_uuid, &field_names)
        .context("failed to start exporter backends")?;

    let (exporter_items_tx, exporter_items_rx) = mpsc::channel(options.bus.channel_capacity);

    let mut handles = Vec::new();
    handles.extend(spawn_manager_adapter(
        bus.clone(),
        options.bus.clone(),
        manager_channels.scheduled_tasks_rx,
        manager_channels.promises_tx,
        manager_channels.items_tx,
        done_rx.clone(),
    ));
    handles.extend(spawn_exporter_adapter(
        bus.clone(),
        options.bus.clone(),
        exporter_items_tx.clone(),
        done_rx.clone(),
    ));

    // Items the manager re-emits converge on the same exporter channel.
    {
        let tx = exporter_items_tx.clone();
        let mut rx = manager_channels.items_out_rx;
        handles.push(tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(exporter_items_tx);

    for _ in 0..options.workers.max(1) {
        let (worker, worker_channels) =
            Worker::new(registry.clone(), options.bus.channel_capacity, done_rx.clone());
        handles.extend(spawn_worker_adapter(
            bus.clone(),
            options.bus.clone(),
            worker_channels.scheduled_tasks_tx,
            worker_channels.promises_rx,
            worker_channels.items_rx,
            done_rx.clone(),
        ));
        handles.push(tokio::spawn(worker.run()));
    }

    handles.push(tokio::spawn(manager.run()));
    let exporter_handle = tokio::spawn(exporter.run(exporter_items_rx));

    wait_for_idle_bus(&bus, &options.bus).await?;
    info!(job = %job_uuid, "bus idle; shutting down");
    let _ = done_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }
    let _ = exporter_handle.await;
    bus.close().await?;

    Ok(RunSummary {
        job_uuid,
        items_csv: options.output_dir.join(format!("{job_uuid}.csv")),
    })
}
