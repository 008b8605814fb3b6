//! Item sinks: the exporter loop and its pluggable backends.
//!
//! The exporter multiplexes one inbound item stream into an ordered list of
//! backends. Backend contract: `start_exporting` once before any item,
//! `write_item` per item, `finish` after the stream closes. Backend errors
//! are logged and drop the item for that backend only.

pub mod backends;

pub use backends::blob::FsBlobExporterBackend;
pub use backends::csv::CsvExporterBackend;
pub use backends::jsonl::JsonLinesExporterBackend;

use arachne_protocol::Item;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors raised by sink backends.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("backend was not started before writing")]
    NotStarted,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One export destination. Backends may buffer; `finish` flushes.
pub trait ExporterBackend: Send {
    fn start_exporting(&mut self, job_uuid: Uuid, field_names: &[String]) -> Result<(), SinkError>;
    fn write_item(&mut self, item: &Item) -> Result<(), SinkError>;
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Multiplexes items into every registered backend, in registration order.
#[derive(Default)]
pub struct Exporter {
    backends: Vec<Box<dyn ExporterBackend>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backends must be registered before [`run`](Self::run).
    pub fn add_backend(&mut self, backend: Box<dyn ExporterBackend>) {
        self.backends.push(backend);
    }

    /// Announce the job to every backend.
    pub fn start_exporting(
        &mut self,
        job_uuid: Uuid,
        field_names: &[String],
    ) -> Result<(), SinkError> {
        for backend in &mut self.backends {
            backend.start_exporting(job_uuid, field_names)?;
        }
        Ok(())
    }

    /// Read items until the channel closes, then finish all backends.
    pub async fn run(mut self, mut items_rx: mpsc::Receiver<Item>) {
        while let Some(item) = items_rx.recv().await {
            for backend in &mut self.backends {
                if let Err(error) = backend.write_item(&item) {
                    warn!(%error, item = %item.name, "sink backend failed to write item");
                }
            }
        }

        for backend in &mut self.backends {
            if let Err(error) = backend.finish() {
                warn!(%error, "sink backend failed to finish");
            }
        }
        info!("exporter finished");
    }
}
