use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Rows of a csv file, kept as text. Columns are typed when they are read.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows: rows.into_iter().map(StringRecord::from).collect(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = csv.headers()?.iter().map(str::to_owned).collect();
        let rows = csv.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Reads one csv file, or every `*.csv` file of a directory in file name order.
    pub fn read_from_csv(path: impl AsRef<Path>) -> Result<Self> {
        fn read_from_csv_file(path: &Path) -> Result<Dataset> {
            let file = File::open(path).map_err(|e| Error::io(path, e))?;
            Dataset::from_reader(file)
        }
        let path = path.as_ref();
        info!("read from csv: {}", path.display());
        if !path.is_dir() {
            return read_from_csv_file(path);
        }

        let mut files = std::fs::read_dir(path)
            .map_err(|e| Error::io(path, e))?
            .map(|entry| entry.map(|e| e.path()).map_err(|e| Error::io(path, e)))
            .collect::<Result<Vec<PathBuf>>>()?;
        files.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"));
        files.sort();

        let mut dataset: Option<Dataset> = None;
        for file in files {
            let mut part = read_from_csv_file(&file)?;
            if let Some(d) = dataset.as_mut() {
                if d.headers != part.headers {
                    return Err(Error::HeaderMismatch { path: file });
                }
                d.rows.append(&mut part.rows);
                continue;
            }
            dataset = Some(part);
        }
        dataset.ok_or_else(|| {
            Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no csv files in directory"),
            )
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Schema(name.to_owned()))
    }

    fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).unwrap_or("")
    }

    /// Values of a numeric column in row order. Empty cells read as NaN.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.column_index(name)?;
        (0..self.len())
            .map(|row| match self.cell(row, column) {
                "" => Ok(f64::NAN),
                s => s.parse::<f64>().map_err(|_| Error::NotNumeric {
                    column: name.to_owned(),
                    row,
                    value: s.to_owned(),
                }),
            })
            .collect()
    }

    /// Partitions row indices by the value of `name`, in ascending key order.
    /// Rows with an empty key are left out.
    pub fn group_by(&self, name: &str) -> Result<Vec<Group>> {
        let column = self.column_index(name)?;
        let numeric = (0..self.len())
            .map(|row| self.cell(row, column))
            .filter(|s| !s.is_empty())
            .all(|s| s.parse::<f64>().is_ok());

        let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();
        let mut dropped = 0;
        for row in 0..self.len() {
            let raw = self.cell(row, column);
            if raw.is_empty() {
                dropped += 1;
                continue;
            }
            let key = match raw.parse::<f64>() {
                // -0.0 and 0.0 are one group
                Ok(v) if numeric => GroupKey::Number(v + 0.),
                _ => GroupKey::Text(raw.to_owned()),
            };
            groups
                .entry(key.clone())
                .or_insert_with(|| Group {
                    key,
                    label: raw.to_owned(),
                    rows: vec![],
                })
                .rows
                .push(row);
        }
        if dropped > 0 {
            debug!("dropped {dropped} rows with an empty `{name}`");
        }
        Ok(groups.into_values().collect())
    }
}

#[derive(Debug, Clone)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// Rows sharing one key, in the order they appear in the dataset.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: GroupKey,
    /// first spelling of the key seen in the file
    pub label: String,
    pub rows: Vec<usize>,
}
