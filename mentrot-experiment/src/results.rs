use anyhow::{Context, Result};
use mentrot_core::trial::TrialResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Where completed sessions land. The engine hands over the full ordered
/// result sequence exactly once; failures must reach the operator.
pub trait ResultSink {
    fn write_all(&mut self, results: &[TrialResult]) -> Result<()>;
}

/// CSV sink writing `results{N}.csv` into a directory, picking the first N
/// with no existing file so earlier sessions are never overwritten.
pub struct CsvResultSink {
    dir: PathBuf,
}

pub const CSV_HEADER: &str = "Block,Trial,RT_ms,Response";

impl CsvResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// First unused `results{N}.csv`, N starting at 1.
    pub fn next_path(&self) -> PathBuf {
        let mut n = 1usize;
        loop {
            let candidate = self.dir.join(format!("results{n}.csv"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl ResultSink for CsvResultSink {
    fn write_all(&mut self, results: &[TrialResult]) -> Result<()> {
        let path = self.next_path();
        let file = File::create(&path)
            .with_context(|| format!("creating result file {}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "{CSV_HEADER}")?;
        for result in results {
            writeln!(w, "{}", format_row(result))?;
        }
        w.flush()
            .with_context(|| format!("flushing result file {}", path.display()))?;
        println!("Results saved to {}", path.display());
        Ok(())
    }
}

/// One CSV row. A missing reaction time or response serializes as an empty
/// cell, matching the tabular output format.
pub fn format_row(result: &TrialResult) -> String {
    let rt = result
        .rt_ms
        .map(|ms| ms.to_string())
        .unwrap_or_default();
    let response = result.response.map(|r| r.as_str()).unwrap_or_default();
    format!("{},{},{},{}", result.block, result.trial, rt, response)
}
