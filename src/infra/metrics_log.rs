// ============================================================
// Layer 6 — CSV Metric Sink
// ============================================================
// Appends one row per metric event to metrics.csv so training
// runs leave a permanent, plottable record. The trainer only
// knows the MetricSink trait; this file is one implementation.
//
// Example output:
//   phase,step,loss,accuracy,perplexity,bleu
//   train,0,3.2181,0.1250,24.9845,
//   val,0,3.1994,0.1310,24.5211,0.0000
//
// The bleu column is empty for train rows.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::metric_event::MetricEvent;
use crate::domain::traits::MetricSink;

pub struct CsvMetricSink {
    csv_path: PathBuf,
}

impl CsvMetricSink {
    /// Open (or create) metrics.csv in the given directory. The
    /// header is only written for a fresh file so reruns append.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "phase,step,loss,accuracy,perplexity,bleu")?;
        }
        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

impl MetricSink for CsvMetricSink {
    fn record(&mut self, event: &MetricEvent) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        match event {
            MetricEvent::Train { step, loss, accuracy, perplexity } => {
                writeln!(f, "train,{step},{loss:.6},{accuracy:.6},{perplexity:.6},")?;
            }
            MetricEvent::Validation { step, loss, accuracy, perplexity, bleu } => {
                writeln!(f, "val,{step},{loss:.6},{accuracy:.6},{perplexity:.6},{bleu:.6}")?;
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_append_as_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvMetricSink::new(dir.path()).unwrap();

        sink.record(&MetricEvent::Train {
            step: 0,
            loss: 2.5,
            accuracy: 0.25,
            perplexity: 12.18,
        })
        .unwrap();
        sink.record(&MetricEvent::Validation {
            step: 0,
            loss: 2.4,
            accuracy: 0.3,
            perplexity: 11.02,
            bleu: 0.12,
        })
        .unwrap();

        let content = fs::read_to_string(sink.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "phase,step,loss,accuracy,perplexity,bleu");
        assert!(lines[1].starts_with("train,0,2.5"));
        assert!(lines[2].starts_with("val,0,2.4"));
        assert!(lines[2].ends_with("0.120000"));
    }

    #[test]
    fn reopening_does_not_duplicate_the_header() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = CsvMetricSink::new(dir.path()).unwrap();
            sink.record(&MetricEvent::Train {
                step: 1,
                loss: 1.0,
                accuracy: 0.5,
                perplexity: 2.72,
            })
            .unwrap();
        }
        let sink = CsvMetricSink::new(dir.path()).unwrap();
        let content = fs::read_to_string(sink.csv_path()).unwrap();
        assert_eq!(content.matches("phase,step").count(), 1);
        assert_eq!(content.lines().count(), 2);
    }
}
