// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Reading DataFrames from files and writing them back out.

use crate::error::{FlareError, Result};
use crate::session::Session;
use datafusion::arrow::array::StringArray;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::prelude::{CsvReadOptions, DataFrame, NdJsonReadOptions, ParquetReadOptions};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Name of the only column produced by [`DataFrameReader::text`].
pub const TEXT_COLUMN: &str = "value";

/// Reads files into DataFrames of a session.
pub struct DataFrameReader<'a> {
    session: &'a Session,
}

impl<'a> DataFrameReader<'a> {
    /// Creates a reader for the given session.
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Reads a text file, or every file of a directory in name order. Each
    /// line becomes one row of a single [`TEXT_COLUMN`] column.
    pub fn text<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let files = if path.is_dir() {
            let mut files = fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<PathBuf>>>()?;
            files.retain(|f| f.is_file());
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut lines = vec![];
        for file in &files {
            let content = fs::read_to_string(file)?;
            lines.extend(content.lines().map(str::to_owned));
        }
        info!("Read {} lines from {}", lines.len(), path.display());

        let schema = Arc::new(Schema::new(vec![Field::new(
            TEXT_COLUMN,
            DataType::Utf8,
            false,
        )]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(lines))])?;
        Ok(self.session.context().read_batch(batch)?)
    }

    /// Reads a CSV file with an optional header line.
    pub async fn csv(&self, path: &str, has_header: bool, delimiter: u8) -> Result<DataFrame> {
        let options = CsvReadOptions::new()
            .has_header(has_header)
            .delimiter(delimiter);
        Ok(self.session.context().read_csv(path, options).await?)
    }

    /// Reads a parquet file or directory.
    pub async fn parquet(&self, path: &str) -> Result<DataFrame> {
        Ok(self
            .session
            .context()
            .read_parquet(path, ParquetReadOptions::default())
            .await?)
    }

    /// Reads a newline-delimited JSON file.
    pub async fn json(&self, path: &str) -> Result<DataFrame> {
        Ok(self
            .session
            .context()
            .read_json(path, NdJsonReadOptions::default())
            .await?)
    }

    /// Reads a file in the given format. CSV files are expected to carry a
    /// header line.
    pub async fn load(&self, format: WriteFormat, path: &str) -> Result<DataFrame> {
        match format {
            WriteFormat::Csv => self.csv(path, true, b',').await,
            WriteFormat::Parquet => self.parquet(path).await,
            WriteFormat::Json => self.json(path).await,
        }
    }
}

/// File formats the writer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteFormat {
    /// Comma separated values with a header line.
    Csv,
    /// Apache Parquet.
    Parquet,
    /// Newline-delimited JSON.
    Json,
}

impl FromStr for WriteFormat {
    type Err = FlareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(WriteFormat::Csv),
            "parquet" => Ok(WriteFormat::Parquet),
            "json" => Ok(WriteFormat::Json),
            _ => Err(FlareError::Config(format!("Unknown file format: {}", s))),
        }
    }
}

/// What a write does when the target table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Insert the rows into the existing table.
    Append,
    /// Drop the table and create it again from the DataFrame schema.
    Overwrite,
    /// Fail.
    ErrorIfExists,
    /// Leave the table untouched and write nothing.
    Ignore,
}

impl FromStr for SaveMode {
    type Err = FlareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "append" => Ok(SaveMode::Append),
            "overwrite" => Ok(SaveMode::Overwrite),
            "error" | "errorifexists" => Ok(SaveMode::ErrorIfExists),
            "ignore" => Ok(SaveMode::Ignore),
            _ => Err(FlareError::Config(format!("Unknown save mode: {}", s))),
        }
    }
}

/// Writes a DataFrame to a single output file.
pub struct DataFrameWriter {
    df: DataFrame,
}

impl DataFrameWriter {
    /// Creates a writer for the given DataFrame.
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Writes the DataFrame in the given format. Parent directories are
    /// created as needed.
    pub async fn save(self, format: WriteFormat, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let options = DataFrameWriteOptions::new().with_single_file_output(true);
        match format {
            WriteFormat::Csv => {
                self.df.write_csv(path, options, None).await?;
            }
            WriteFormat::Parquet => {
                self.df.write_parquet(path, options, None).await?;
            }
            WriteFormat::Json => {
                self.df.write_json(path, options, None).await?;
            }
        }
        info!("Wrote {:?} output to {}", format, path);
        Ok(())
    }

    /// Writes a CSV file with a header line.
    pub async fn csv(self, path: &str) -> Result<()> {
        self.save(WriteFormat::Csv, path).await
    }

    /// Writes a parquet file.
    pub async fn parquet(self, path: &str) -> Result<()> {
        self.save(WriteFormat::Parquet, path).await
    }

    /// Writes a newline-delimited JSON file.
    pub async fn json(self, path: &str) -> Result<()> {
        self.save(WriteFormat::Json, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::Array;
    use datafusion::arrow::util::pretty::pretty_format_batches;
    use tempfile::tempdir;

    #[tokio::test]
    async fn text_file_and_directory() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.txt"), "third line\n")?;
        fs::write(dir.path().join("a.txt"), "first line\nsecond line\n")?;

        let session = Session::builder().build()?;

        let df = session.read().text(dir.path().join("a.txt"))?;
        assert_eq!(2, df.count().await?);

        let batches = session.read().text(dir.path())?.collect().await?;
        let values = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(3, values.len());
        assert_eq!("first line", values.value(0));
        assert_eq!("third line", values.value(2));
        assert_eq!(TEXT_COLUMN, batches[0].schema().field(0).name());

        assert!(matches!(
            session.read().text(dir.path().join("missing.txt")),
            Err(FlareError::IoError(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn write_and_read_back() -> Result<()> {
        let dir = tempdir()?;
        let session = Session::builder().build()?;

        for format in [WriteFormat::Csv, WriteFormat::Parquet, WriteFormat::Json] {
            let df = session
                .sql("SELECT * FROM (VALUES (1, 'a'), (2, 'b'), (3, 'c')) AS t(id, name)")
                .await?;
            let path = dir
                .path()
                .join("out")
                .join(format!("t.{:?}", format).to_lowercase());
            let path = path.to_str().unwrap();

            DataFrameWriter::new(df).save(format, path).await?;

            let batches = session
                .read()
                .load(format, path)
                .await?
                .sort(vec![datafusion::prelude::col("id").sort(true, false)])?
                .collect()
                .await?;
            println!("{}", pretty_format_batches(&batches)?);
            assert_eq!(3, batches.iter().map(|b| b.num_rows()).sum::<usize>());
        }

        Ok(())
    }

    #[test]
    fn parse_save_mode() {
        assert_eq!(SaveMode::Overwrite, "overwrite".parse().unwrap());
        assert_eq!(SaveMode::ErrorIfExists, "error".parse().unwrap());
        assert!("replace".parse::<SaveMode>().is_err());
    }

    #[test]
    fn parse_format() {
        assert_eq!(WriteFormat::Parquet, "PARQUET".parse().unwrap());
        assert_eq!(WriteFormat::Csv, "csv".parse().unwrap());
        assert!("avro".parse::<WriteFormat>().is_err());
    }
}
