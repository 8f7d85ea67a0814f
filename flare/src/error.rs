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

//! Flare error types

use datafusion::arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use datafusion::parquet::errors::ParquetError;

use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::result;

/// Result type for operations that could result in an [FlareError]
pub type Result<T> = result::Result<T, FlareError>;

/// Flare error
#[derive(Debug)]
pub enum FlareError {
    /// Error associated to I/O operations and associated traits.
    IoError(io::Error),
    /// Error returned when Arrow is unexpectedly executed.
    Arrow(ArrowError),
    /// Error returned when writing a parquet file outside the engine.
    Parquet(ParquetError),
    /// Error returned by the query engine: planning, malformed SQL, missing
    /// files, failed execution.
    DataFusion(DataFusionError),
    /// Error returned by the relational database driver.
    Database(sqlx::Error),
    /// Error returned when a connection URL cannot be parsed.
    Url(url::ParseError),
    /// Error returned when a remote file cannot be downloaded.
    Http(reqwest::Error),
    /// Error returned when serde_json failed to serialize or deserialize data.
    SerdeJson(serde_json::Error),
    /// Error returned when a setting is missing or has an invalid value.
    Config(String),
    /// Error returned when the database connector is used incorrectly, e.g.
    /// an unsupported column type or an existing target table.
    Connector(String),
    /// Error returned on a branch that we know it is possible but to which we
    /// still have no implementation for.
    NotImplemented(String),
    /// Error returned as a consequence of an error in Flare.
    /// This error should not happen in normal usage of Flare.
    Internal(String),
    /// Error returned during execution of a demo or a catalog operation.
    Execution(String),
}

impl From<io::Error> for FlareError {
    fn from(e: io::Error) -> Self {
        FlareError::IoError(e)
    }
}

impl From<DataFusionError> for FlareError {
    fn from(e: DataFusionError) -> Self {
        FlareError::DataFusion(e)
    }
}

impl From<ParquetError> for FlareError {
    fn from(e: ParquetError) -> Self {
        FlareError::Parquet(e)
    }
}

impl From<ArrowError> for FlareError {
    fn from(e: ArrowError) -> Self {
        FlareError::Arrow(e)
    }
}

impl From<sqlx::Error> for FlareError {
    fn from(e: sqlx::Error) -> Self {
        FlareError::Database(e)
    }
}

impl From<url::ParseError> for FlareError {
    fn from(e: url::ParseError) -> Self {
        FlareError::Url(e)
    }
}

impl From<reqwest::Error> for FlareError {
    fn from(e: reqwest::Error) -> Self {
        FlareError::Http(e)
    }
}

impl From<serde_json::Error> for FlareError {
    fn from(e: serde_json::Error) -> Self {
        FlareError::SerdeJson(e)
    }
}

impl From<&str> for FlareError {
    fn from(e: &str) -> Self {
        FlareError::Internal(e.to_string())
    }
}

impl Display for FlareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            FlareError::IoError(ref desc) => write!(f, "IO error: {}", desc),
            FlareError::Arrow(ref desc) => write!(f, "Arrow error: {}", desc),
            FlareError::Parquet(ref desc) => write!(f, "Parquet error: {}", desc),
            FlareError::DataFusion(ref desc) => write!(f, "DataFusion error: {}", desc),
            FlareError::Database(ref desc) => write!(f, "Database error: {}", desc),
            FlareError::Url(ref desc) => write!(f, "URL error: {}", desc),
            FlareError::Http(ref desc) => write!(f, "HTTP error: {}", desc),
            FlareError::SerdeJson(ref desc) => write!(f, "serde_json error: {:?}", desc),
            FlareError::Config(ref desc) => write!(f, "Configuration error: {}", desc),
            FlareError::Connector(ref desc) => write!(f, "Connector error: {}", desc),
            FlareError::NotImplemented(ref desc) => {
                write!(f, "This feature is not implemented: {}", desc)
            }
            FlareError::Internal(ref desc) => write!(
                f,
                "Internal error: {}. This was likely caused by a bug in Flare's \
                    code and we would welcome that you file an bug report in our issue tracker",
                desc
            ),
            FlareError::Execution(ref desc) => write!(f, "Execution error: {}", desc),
        }
    }
}

impl error::Error for FlareError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_errors() {
        let err = FlareError::Config("missing setting [jdbc] url".to_string());
        assert_eq!(
            "Configuration error: missing setting [jdbc] url",
            err.to_string()
        );

        let err: FlareError = DataFusionError::Plan("table 'x' not found".to_string()).into();
        assert!(err.to_string().starts_with("DataFusion error:"));

        let err: FlareError = "oops".into();
        assert!(matches!(err, FlareError::Internal(_)));
    }
}
