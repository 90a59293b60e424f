use std::path::{Path, PathBuf};

use chart_metrics::{ChartSummary, MetricExtractor, MetricVectors};
use chart_model::{ChartDecoder, ChartMeta, Note};
use log::{debug, warn};
use serde::Serialize;

/// One output record per input path
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChartReport {
    Analyzed {
        path: PathBuf,
        meta: ChartMeta,
        summary: ChartSummary,
        metrics: MetricVectors,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<Vec<Note>>,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl ChartReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, ChartReport::Failed { .. })
    }
}

/// Decode one chart and extract its signals. Failures become a `Failed` record.
pub fn analyze_path(path: &Path, extractor: &MetricExtractor, include_notes: bool) -> ChartReport {
    let chart = match ChartDecoder::decode(path) {
        Ok(chart) => chart,
        Err(e) => {
            warn!("skipping {}: {e}", path.display());
            return ChartReport::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            };
        }
    };

    let metrics = extractor.extract(&chart);
    let summary = ChartSummary::from_chart(&chart, extractor.config().window_size);
    debug!(
        "{}: {} notes, {} windows, global nps {:.2}",
        path.display(),
        summary.total_notes,
        metrics.len(),
        summary.global_nps
    );

    ChartReport::Analyzed {
        path: path.to_path_buf(),
        meta: chart.meta,
        summary,
        metrics,
        notes: include_notes.then_some(chart.notes),
    }
}
