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

//! The SQL differences between the databases the connector talks to.

use crate::error::{FlareError, Result};
use datafusion::arrow::datatypes::DataType;
use itertools::Itertools;
use sqlx::error::DatabaseError;

/// A relational database vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Detects the vendor from a connection URL, with or without the `jdbc:`
    /// prefix.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(FlareError::Connector(format!(
                "Unsupported database URL: {}",
                url
            ))),
        }
    }

    /// URL scheme the database driver expects.
    pub fn scheme(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Quotes an identifier; dotted names are quoted part by part.
    pub fn quote_identifier(&self, ident: &str) -> String {
        let quote = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        ident
            .split('.')
            .map(|part| {
                let escaped = part.replace(quote, &format!("{}{}", quote, quote));
                format!("{}{}{}", quote, escaped, quote)
            })
            .join(".")
    }

    /// The placeholder of the `index`-th (1-based) bind parameter.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_owned(),
        }
    }

    /// The column type a table created for `data_type` uses.
    pub fn column_type(&self, data_type: &DataType) -> Result<&'static str> {
        let sql_type = match data_type {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::UInt8 | DataType::UInt16 => {
                "INTEGER"
            }
            DataType::Int64 | DataType::UInt32 | DataType::UInt64 => "BIGINT",
            DataType::Float16 | DataType::Float32 | DataType::Float64 => match self {
                Dialect::MySql => "DOUBLE",
                Dialect::Postgres => "DOUBLE PRECISION",
                Dialect::Sqlite => "REAL",
            },
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "TEXT",
            other => {
                return Err(FlareError::NotImplemented(format!(
                    "writing {} columns to a database",
                    other
                )))
            }
        };
        Ok(sql_type)
    }

    /// Returns true if the database rejected a statement because a table it
    /// names does not exist.
    pub fn is_missing_table(&self, error: &dyn DatabaseError) -> bool {
        match self {
            Dialect::MySql => error.code().as_deref() == Some("42S02"),
            Dialect::Postgres => error.code().as_deref() == Some("42P01"),
            Dialect::Sqlite => error.message().starts_with("no such table"),
        }
    }

    /// `INSERT INTO table (columns) VALUES (...), (...)` for `rows` rows.
    pub fn insert_statement(&self, table: &str, columns: &[String], rows: usize) -> String {
        let column_list = columns.iter().map(|c| self.quote_identifier(c)).join(", ");
        let mut index = 0;
        let values = (0..rows)
            .map(|_| {
                let row = (0..columns.len())
                    .map(|_| {
                        index += 1;
                        self.placeholder(index)
                    })
                    .join(", ");
                format!("({})", row)
            })
            .join(", ");
        format!("INSERT INTO {} ({}) VALUES {}", table, column_list, values)
    }
}
