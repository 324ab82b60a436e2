//! Where a pipeline's input comes from, and what it will be called locally.

use std::fmt;

use crate::common::*;
use crate::config::ArchiveConfig;

/// The format of a staged input file, decided by its file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataFormat {
    /// Gzip-compressed comma-separated values (`*.csv.gz`).
    CsvGz,
    /// Comma-separated values (`*.csv`).
    Csv,
    /// Apache Parquet. Anything we don't otherwise recognize is assumed to be
    /// Parquet.
    Parquet,
}

impl DataFormat {
    /// Classify a file name or URL path by its suffix.
    ///
    /// The match is case-sensitive, so `DATA.CSV` is treated as Parquet.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".csv.gz") {
            DataFormat::CsvGz
        } else if name.ends_with(".csv") {
            DataFormat::Csv
        } else {
            DataFormat::Parquet
        }
    }

    /// The name we give a staged download in this format.
    pub fn staging_file_name(self) -> &'static str {
        match self {
            DataFormat::CsvGz => "output.csv.gz",
            DataFormat::Csv => "output.csv",
            DataFormat::Parquet => "output.parquet",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::CsvGz => write!(f, "csv.gz"),
            DataFormat::Csv => write!(f, "csv"),
            DataFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// A remote file, the local name we stage it under, and where it ends up.
///
/// For archive runs `destination` is an object key such as
/// `raw/yellow_tripdata_2024-01.parquet`. For ingest runs it is the name of
/// the target table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    url: Url,
    file_name: String,
    destination: String,
}

impl SourceDescriptor {
    /// Describe the monthly file for `month` under `config`.
    pub fn for_month(config: &ArchiveConfig, month: &str) -> Result<Self> {
        let file_name =
            format!("{}_tripdata_{}-{}.parquet", config.color, config.year, month);
        let base = config.base_url.trim_end_matches('/');
        let url = format!("{}/{}", base, file_name)
            .parse::<Url>()
            .with_context(|| format!("cannot build URL for month {}", month))?;
        let destination = format!("{}{}", config.prefix, file_name);
        Ok(SourceDescriptor {
            url,
            file_name,
            destination,
        })
    }

    /// Describe a single file to be loaded into `table_name`.
    pub fn for_url(url: Url, table_name: &str) -> Self {
        let file_name = DataFormat::from_file_name(url.path())
            .staging_file_name()
            .to_owned();
        SourceDescriptor {
            url,
            file_name,
            destination: table_name.to_owned(),
        }
    }

    /// The remote URL to download.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The file name to use in the staging directory.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The object key or table name this source is written to.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The format of the staged file.
    pub fn format(&self) -> DataFormat {
        DataFormat::from_file_name(&self.file_name)
    }
}
