//! JSON-lines sink: one serialized item per line, one file per job.

use crate::{ExporterBackend, SinkError};
use arachne_protocol::Item;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use uuid::Uuid;

pub struct JsonLinesExporterBackend {
    output_dir: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonLinesExporterBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            writer: None,
        }
    }

    /// `<output_dir>/<jobUUID>.jsonl`
    pub fn output_path(&self, job_uuid: Uuid) -> PathBuf {
        self.output_dir.join(format!("{job_uuid}.jsonl"))
    }
}

impl ExporterBackend for JsonLinesExporterBackend {
    fn start_exporting(
        &mut self,
        job_uuid: Uuid,
        _field_names: &[String],
    ) -> Result<(), SinkError> {
        fs::create_dir_all(&self.output_dir)?;
        let file = File::create(self.output_path(job_uuid))?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_item(&mut self, item: &Item) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::NotStarted)?;
        serde_json::to_writer(&mut *writer, item)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
