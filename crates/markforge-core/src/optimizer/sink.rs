use super::stats::RunStatistics;
use crate::energy::ScoreSize;
use crate::error::MppResult;
use serde::Serialize;
use std::path::Path;

/// A reported state handed to the sink at a checkpoint.
pub struct Checkpoint<'a, R> {
    pub iteration: usize,
    pub temperature: f64,
    pub score: ScoreSize,
    pub state: &'a R,
}

pub trait ReportSink<R> {
    fn report(&mut self, checkpoint: &Checkpoint<'_, R>) -> MppResult<()>;

    fn finish(&mut self, _stats: &RunStatistics) -> MppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl<R> ReportSink<R> for NullSink {
    fn report(&mut self, _checkpoint: &Checkpoint<'_, R>) -> MppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub iteration: usize,
    pub temperature: f64,
    pub score: f64,
    pub size: usize,
}

/// Keeps one row per checkpoint.
#[derive(Debug, Default, Clone)]
pub struct HistorySink {
    rows: Vec<TraceRow>,
    finished: Option<RunStatistics>,
}

impl HistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    pub fn statistics(&self) -> Option<&RunStatistics> {
        self.finished.as_ref()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> MppResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl<R> ReportSink<R> for HistorySink {
    fn report(&mut self, checkpoint: &Checkpoint<'_, R>) -> MppResult<()> {
        self.rows.push(TraceRow {
            iteration: checkpoint.iteration,
            temperature: checkpoint.temperature,
            score: checkpoint.score.score,
            size: checkpoint.score.size,
        });
        Ok(())
    }

    fn finish(&mut self, stats: &RunStatistics) -> MppResult<()> {
        self.finished = Some(stats.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_exports_csv() {
        let mut sink = HistorySink::new();
        let state = ();
        for i in 0..3 {
            sink.report(&Checkpoint {
                iteration: i,
                temperature: 1.0,
                score: ScoreSize::new(-(i as f64), i),
                state: &state,
            })
            .unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        sink.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("iteration,temperature,score,size"));
        assert_eq!(text.lines().count(), 4);
    }
}
