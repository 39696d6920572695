use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("column `{0}` not found in dataset")]
    Schema(String),

    #[error("dataset has no rows to plot")]
    EmptyDataset,

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("column `{column}` has non-numeric value `{value}` at row {row}")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("{} does not share the header of the first csv file", .path.display())]
    HeaderMismatch { path: PathBuf },

    #[error("values of `{0}` span more than an axis can hold")]
    AxisOverflow(String),

    #[error("invalid formatter: {0}")]
    InvalidFormatter(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("output path {} is used by more than one chart", .0.display())]
    DuplicateOutput(PathBuf),

    #[error("failed to draw chart: {0}")]
    Draw(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
