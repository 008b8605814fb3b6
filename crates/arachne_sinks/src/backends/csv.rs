//! CSV sink: one file per job, header from the announced field names.

use crate::{ExporterBackend, SinkError};
use arachne_protocol::Item;
use csv::Writer;
use std::fs::{self, File};
use std::path::PathBuf;
use uuid::Uuid;

pub struct CsvExporterBackend {
    output_dir: PathBuf,
    field_names: Vec<String>,
    writer: Option<Writer<File>>,
}

impl CsvExporterBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            field_names: Vec::new(),
            writer: None,
        }
    }

    /// `<output_dir>/<jobUUID>.csv`
    pub fn output_path(&self, job_uuid: Uuid) -> PathBuf {
        self.output_dir.join(format!("{job_uuid}.csv"))
    }
}

impl ExporterBackend for CsvExporterBackend {
    fn start_exporting(&mut self, job_uuid: Uuid, field_names: &[String]) -> Result<(), SinkError> {
        fs::create_dir_all(&self.output_dir)?;
        let file = File::create(self.output_path(job_uuid))?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(field_names)?;

        self.field_names = field_names.to_vec();
        self.writer = Some(writer);
        Ok(())
    }

    fn write_item(&mut self, item: &Item) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::NotStarted)?;
        let record: Vec<String> = self
            .field_names
            .iter()
            .map(|name| item.field_string(name))
            .collect();
        writer.write_record(&record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
