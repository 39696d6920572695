use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    chart::{render, ChartSpec, RenderedChart},
    dataset::Dataset,
    error::{Error, Result},
};

pub const DEFAULT_CONFIG: &str = "./config/charts.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ChartJob {
    /// csv file, or a directory of csv files
    pub data: PathBuf,
    #[serde(flatten)]
    pub spec: ChartSpec,
}

/// Chart jobs read from a toml file, one `[[chart]]` table each.
#[derive(Debug, Clone, Deserialize)]
pub struct Batch {
    /// name of the log file under `./logs`, stdout when absent
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default, rename = "chart")]
    pub charts: Vec<ChartJob>,
}

#[derive(Debug)]
pub struct JobReport {
    pub output: PathBuf,
    pub result: Result<RenderedChart>,
}

impl Batch {
    /// Relative `data` and `output` paths are taken from the config file's directory.
    pub fn value_parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let c = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut batch = Self::from_toml_str(&c)?;
        let base = path.parent().unwrap_or(Path::new(""));
        for job in batch.charts.iter_mut() {
            job.data = base.join(&job.data);
            job.spec.output = base.join(&job.spec.output);
        }
        Ok(batch)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let batch: Self = toml::from_str(s)?;
        let mut outputs = HashSet::new();
        for job in &batch.charts {
            if !outputs.insert(&job.spec.output) {
                return Err(Error::DuplicateOutput(job.spec.output.clone()));
            }
        }
        Ok(batch)
    }

    /// Renders every job. Outputs are distinct, so jobs run in parallel; a failing job
    /// only fails its own report.
    pub fn run(&self) -> Vec<JobReport> {
        self.charts
            .par_iter()
            .map(|job| {
                let result = job.run();
                match &result {
                    Ok(chart) => info!(
                        "{}: {} lines from {}",
                        job.spec.output.display(),
                        chart.line_count(),
                        job.data.display()
                    ),
                    Err(e) => error!("{}: {e}", job.spec.output.display()),
                }
                JobReport {
                    output: job.spec.output.clone(),
                    result,
                }
            })
            .collect()
    }
}

impl ChartJob {
    pub fn run(&self) -> Result<RenderedChart> {
        let dataset = Dataset::read_from_csv(&self.data)?;
        if let Some(dir) = self.spec.output.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        render(&dataset, &self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Formatter;

    const CONFIG: &str = r#"
        log_file = "sample_size"

        [[chart]]
        data = "tmp2.csv"
        group = "mode"
        x = "sample_size"
        y = "tot_cr"
        output = "sample_size_tot.png"
        title = "Total Compression over Sample Size"
        x_label = "Sample Size"
        y_label = "Total Compression Ratio"
        x_format = { kind = "thousands" }

        [[chart]]
        data = "tmp2.csv"
        group = "mode"
        x = "sample_size"
        y = "runtime"
        output = "sample_size_runtime.png"
        y_format = { kind = "divide_suffix", scale = 3600, suffix = "h" }
    "#;

    #[test]
    fn parse() {
        let batch = Batch::from_toml_str(CONFIG).unwrap();
        assert_eq!(batch.log_file.as_deref(), Some("sample_size"));
        assert_eq!(batch.charts.len(), 2);

        let tot = &batch.charts[0];
        assert_eq!(tot.data, Path::new("tmp2.csv"));
        assert_eq!(tot.spec.x_desc(), "Sample Size");
        assert!(matches!(tot.spec.x_format, Formatter::Thousands));
        assert!(matches!(tot.spec.y_format, Formatter::AsIs));

        let runtime = &batch.charts[1];
        assert_eq!(runtime.spec.title, "");
        assert_eq!(runtime.spec.y_desc(), "runtime");
        assert_eq!(runtime.spec.y_format.format(7200.), "2h");
    }

    #[test]
    fn duplicate_output() {
        let config = r#"
            [[chart]]
            data = "a.csv"
            group = "mode"
            x = "n"
            y = "runtime"
            output = "plot.png"

            [[chart]]
            data = "b.csv"
            group = "mode"
            x = "n"
            y = "seconds"
            output = "plot.png"
        "#;
        assert!(matches!(
            Batch::from_toml_str(config),
            Err(Error::DuplicateOutput(p)) if p == Path::new("plot.png")
        ));
    }

    #[test]
    fn unknown_formatter_kind() {
        let config = r#"
            [[chart]]
            data = "a.csv"
            group = "mode"
            x = "n"
            y = "runtime"
            output = "plot.png"
            x_format = { kind = "minutes" }
        "#;
        assert!(matches!(Batch::from_toml_str(config), Err(Error::Config(_))));
    }

    #[test]
    fn value_parse_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("charts.toml");
        std::fs::write(&config, CONFIG).unwrap();
        let batch = Batch::value_parse(&config).unwrap();
        assert_eq!(batch.charts[0].data, dir.path().join("tmp2.csv"));
        assert_eq!(
            batch.charts[1].spec.output,
            dir.path().join("sample_size_runtime.png")
        );
    }
}
