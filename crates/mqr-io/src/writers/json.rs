//! Snapshot JSON writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use mqr_core::snapshot::Snapshot;

pub struct SnapshotWriter<W: Write> {
    writer: BufWriter<W>,
    pretty: bool,
}

impl SnapshotWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> SnapshotWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            pretty: true,
        }
    }

    /// Emit one JSON object per line instead of indented output.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, snapshot)?;
        } else {
            serde_json::to_writer(&mut self.writer, snapshot)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
