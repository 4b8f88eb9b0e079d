use super::BenchmarkResult;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub struct ResultLogger {
    writer: Writer<File>,
}

impl ResultLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, result: &BenchmarkResult) -> Result<()> {
        self.writer.serialize(result)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_batch(&mut self, results: &[BenchmarkResult]) -> Result<()> {
        for result in results {
            self.writer.serialize(result)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
