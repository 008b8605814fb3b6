//! Filesystem blob sink: one JSON object per item under `<jobUUID>/`.

use crate::{ExporterBackend, SinkError};
use arachne_protocol::Item;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

pub struct FsBlobExporterBackend {
    output_dir: PathBuf,
    job_dir: Option<PathBuf>,
}

impl FsBlobExporterBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            job_dir: None,
        }
    }
}

impl ExporterBackend for FsBlobExporterBackend {
    fn start_exporting(
        &mut self,
        job_uuid: Uuid,
        _field_names: &[String],
    ) -> Result<(), SinkError> {
        let job_dir = self.output_dir.join(job_uuid.to_string());
        fs::create_dir_all(&job_dir)?;
        self.job_dir = Some(job_dir);
        Ok(())
    }

    fn write_item(&mut self, item: &Item) -> Result<(), SinkError> {
        let job_dir = self.job_dir.as_ref().ok_or(SinkError::NotStarted)?;
        let path = job_dir.join(format!("{}.json", item.uuid));
        fs::write(path, serde_json::to_vec(item)?)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.job_dir = None;
        Ok(())
    }
}
