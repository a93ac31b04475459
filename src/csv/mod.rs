use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::dedup::constants::{BYTES_PER_KB, DEFAULT_IO_BUFFER_SIZE_KB};
use crate::dedup::coordinate::Coordinate;
use crate::dedup::record::{PointRecord, RecordSink, RecordSource};

/// Parses one `id,lon,lat[,attr...]` line. Lines that do not carry a
/// well-formed id and coordinate are skipped, not fatal.
pub fn parse_point_line(line: &str) -> Option<PointRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let mut fields = trimmed.split(',');
    let id = fields.next()?.trim().parse::<u64>().ok()?;
    let lon = fields.next()?.trim().parse::<f64>().ok()?;
    let lat = fields.next()?.trim().parse::<f64>().ok()?;

    let attributes = fields.map(|f| f.trim().to_string()).collect();
    Some(PointRecord::new(id, Coordinate::from_degrees(lon, lat), attributes))
}

pub fn format_point_line(record: &PointRecord) -> String {
    let mut line = format!(
        "{},{},{}",
        record.id,
        record.coordinate.lon(),
        record.coordinate.lat()
    );
    for attribute in &record.attributes {
        line.push(',');
        line.push_str(attribute);
    }
    line
}

/// A two-pass record source over one CSV file. Every pass re-opens the
/// file, so both passes see the same records in the same order.
pub struct CsvPointSource {
    path: PathBuf,
    io_buffer_size: usize,
}

impl CsvPointSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE_KB * BYTES_PER_KB,
        }
    }

    pub fn with_io_buffer_size(mut self, bytes: usize) -> Self {
        self.io_buffer_size = bytes;
        self
    }

    fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Can't open input file '{}'", self.path.display()))?;
        Ok(BufReader::with_capacity(self.io_buffer_size, file))
    }
}

impl RecordSource for CsvPointSource {
    fn coordinates(&mut self) -> Result<Box<dyn Iterator<Item = Result<Coordinate>> + '_>> {
        let reader = self.open()?;
        let path = self.path.clone();

        Ok(Box::new(reader.lines().filter_map(move |line| match line {
            Ok(line) => parse_point_line(&line).map(|record| Ok(record.coordinate)),
            Err(e) => Some(Err(e).with_context(|| {
                format!("Can't read from input file '{}'", path.display())
            })),
        })))
    }

    fn records(&mut self) -> Result<Box<dyn Iterator<Item = Result<PointRecord>> + '_>> {
        let reader = self.open()?;
        let path = self.path.clone();

        Ok(Box::new(reader.lines().filter_map(move |line| match line {
            Ok(line) => parse_point_line(&line).map(Ok),
            Err(e) => Some(Err(e).with_context(|| {
                format!("Can't read from input file '{}'", path.display())
            })),
        })))
    }
}

/// Writes matched records back out as CSV, one line per record, in the
/// order they arrive.
pub struct CsvRecordSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl CsvRecordSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Can't create output file '{}'", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for CsvRecordSink {
    fn write(&mut self, record: &PointRecord) -> Result<()> {
        writeln!(self.writer, "{}", format_point_line(record))
            .with_context(|| format!("Can't write to output file '{}'", self.path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Can't finalize output file '{}'", self.path.display()))
    }
}
