use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::alert::AlertState;
use crate::pose::LandmarkFrame;
use crate::session::FrameReport;

/// 下流に渡す1フレーム分の記録
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PostureSample {
    pub timestamp_ms: u64,
    pub posture_score: u8,
    pub slouch: bool,
    pub alert: AlertState,
}

impl PostureSample {
    pub fn from_report(timestamp_ms: u64, report: &FrameReport) -> Self {
        Self {
            timestamp_ms,
            posture_score: report.score,
            slouch: report.slouch,
            alert: report.alert,
        }
    }
}

/// JSON Lines のランドマークを1行ずつ読む
pub struct FrameReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl FrameReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<LandmarkFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    let err = anyhow::Error::new(e).context(format!("Failed to read line {}", self.line_no));
                    return Some(Err(err));
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(trimmed)
                    .with_context(|| format!("Invalid frame on line {}", self.line_no)),
            );
        }
    }
}

/// PostureSample を JSON Lines で書き出す
pub struct SampleWriter<W: Write> {
    writer: W,
}

impl SampleWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SampleWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write(&mut self, sample: &PostureSample) -> Result<()> {
        serde_json::to_writer(&mut self.writer, sample)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
