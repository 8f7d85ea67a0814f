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

//! Catalog operations of a session: databases, tables, views and columns.
//!
//! A database here is a schema of the engine's default catalog. Table names
//! may be qualified as `database.table`; unqualified names resolve against
//! the current database.

use crate::error::{FlareError, Result};
use crate::io::SaveMode;
use datafusion::arrow::array::UInt64Array;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::catalog::{CatalogProvider, SchemaProvider};
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::datasource::MemTable;
use datafusion::logical_expr::TableType;
use datafusion::prelude::{DataFrame, SessionContext};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INFORMATION_SCHEMA: &str = "information_schema";

/// A table or view of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name:       String,
    /// Database the table belongs to.
    pub database:   String,
    /// `TABLE`, `VIEW` or `TEMPORARY`.
    pub table_type: String,
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name:      String,
    /// Arrow type of the column, e.g. `Int64`.
    pub data_type: String,
    /// Whether the column accepts nulls.
    pub nullable:  bool,
}

/// Catalog operations over a session context.
pub struct Catalog<'a> {
    ctx: &'a SessionContext,
}

impl<'a> Catalog<'a> {
    /// Creates the catalog view of a context.
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    /// Name of the catalog databases live in.
    pub fn current_catalog(&self) -> String {
        self.ctx
            .copied_config()
            .options()
            .catalog
            .default_catalog
            .clone()
    }

    /// Name of the database unqualified table names resolve against.
    pub fn current_database(&self) -> String {
        self.ctx
            .copied_config()
            .options()
            .catalog
            .default_schema
            .clone()
    }

    /// Makes `name` the current database.
    pub async fn set_current_database(&self, name: &str) -> Result<()> {
        if !self.database_exists(name)? {
            return Err(FlareError::Execution(format!(
                "Database '{}' not found",
                name
            )));
        }
        self.ctx
            .sql(&format!(
                "SET datafusion.catalog.default_schema = '{}'",
                name
            ))
            .await?;
        info!("Current database is now {}", name);
        Ok(())
    }

    fn provider(&self) -> Result<Arc<dyn CatalogProvider>> {
        let name = self.current_catalog();
        self.ctx
            .catalog(&name)
            .ok_or_else(|| FlareError::Internal(format!("catalog '{}' is not registered", name)))
    }

    fn schema(&self, database: &str) -> Result<Arc<dyn SchemaProvider>> {
        self.provider()?
            .schema(database)
            .ok_or_else(|| FlareError::Execution(format!("Database '{}' not found", database)))
    }

    /// Lists the databases in name order.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let mut names = self.provider()?.schema_names();
        names.retain(|n| n != INFORMATION_SCHEMA);
        names.sort();
        Ok(names)
    }

    /// Returns true if the database exists.
    pub fn database_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_databases()?.iter().any(|n| n == name))
    }

    /// Creates an empty database.
    pub async fn create_database(&self, name: &str, if_not_exists: bool) -> Result<()> {
        let sql = if if_not_exists {
            format!("CREATE SCHEMA IF NOT EXISTS {}", name)
        } else {
            format!("CREATE SCHEMA {}", name)
        };
        self.ctx.sql(&sql).await?;
        info!("Created database {}", name);
        Ok(())
    }

    /// Drops a database. Without `cascade` the database must be empty.
    pub async fn drop_database(&self, name: &str, if_exists: bool, cascade: bool) -> Result<()> {
        let sql = format!(
            "DROP SCHEMA {}{}{}",
            if if_exists { "IF EXISTS " } else { "" },
            name,
            if cascade { " CASCADE" } else { "" }
        );
        self.ctx.sql(&sql).await?;
        info!("Dropped database {}", name);
        Ok(())
    }

    /// Lists the tables and views of a database, the current one if `None`,
    /// in name order.
    pub async fn list_tables(&self, database: Option<&str>) -> Result<Vec<TableInfo>> {
        let database = database
            .map(str::to_owned)
            .unwrap_or_else(|| self.current_database());
        let schema = self.schema(&database)?;

        let mut names = schema.table_names();
        names.sort();

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            if let Some(table) = schema.table(&name).await? {
                let table_type = match table.table_type() {
                    TableType::Base => "TABLE",
                    TableType::View => "VIEW",
                    TableType::Temporary => "TEMPORARY",
                };
                tables.push(TableInfo {
                    name,
                    database: database.clone(),
                    table_type: table_type.to_owned(),
                });
            }
        }
        Ok(tables)
    }

    /// Returns true if the table or view exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.ctx.table_exist(name)?)
    }

    /// Lists the columns of a table or view in definition order.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let df = self.ctx.table(table).await?;
        Ok(df
            .schema()
            .fields()
            .iter()
            .map(|f| ColumnInfo {
                name:      f.name().to_owned(),
                data_type: f.data_type().to_string(),
                nullable:  f.is_nullable(),
            })
            .collect())
    }

    /// Creates an empty in-memory table.
    pub fn create_table(&self, name: &str, schema: SchemaRef) -> Result<()> {
        if self.table_exists(name)? {
            return Err(FlareError::Execution(format!(
                "Table '{}' already exists",
                name
            )));
        }
        let table = MemTable::try_new(schema, vec![vec![]])?;
        self.ctx.register_table(name, Arc::new(table))?;
        info!("Created table {}", name);
        Ok(())
    }

    /// Drops a table.
    pub async fn drop_table(&self, name: &str, if_exists: bool) -> Result<()> {
        let sql = format!(
            "DROP TABLE {}{}",
            if if_exists { "IF EXISTS " } else { "" },
            name
        );
        self.ctx.sql(&sql).await?;
        info!("Dropped table {}", name);
        Ok(())
    }

    /// Stores the rows of a DataFrame in a table. A missing table is created
    /// with the DataFrame's schema; `mode` decides what happens to an
    /// existing one. Returns the number of rows written.
    pub async fn save_as_table(&self, name: &str, df: DataFrame, mode: SaveMode) -> Result<u64> {
        let schema: SchemaRef = Arc::new(df.schema().as_arrow().clone());
        match (mode, self.table_exists(name)?) {
            (SaveMode::ErrorIfExists, true) => {
                return Err(FlareError::Execution(format!(
                    "Table '{}' already exists",
                    name
                )));
            }
            (SaveMode::Ignore, true) => return Ok(0),
            (SaveMode::Overwrite, true) => {
                self.ctx.deregister_table(name)?;
                self.create_table(name, schema)?;
            }
            (SaveMode::Append, true) => {}
            (_, false) => self.create_table(name, schema)?,
        }

        let batches = df.write_table(name, DataFrameWriteOptions::new()).await?;
        let written = batches
            .first()
            .and_then(|b| b.column(0).as_any().downcast_ref::<UInt64Array>())
            .map(|count| count.value(0))
            .unwrap_or_default();
        info!("Saved {} rows to table {} ({:?})", written, name, mode);
        Ok(written)
    }

    /// Registers a DataFrame as a view of the current session. With
    /// `replace` an existing table or view of that name is replaced.
    pub fn create_temp_view(&self, name: &str, df: DataFrame, replace: bool) -> Result<()> {
        if replace {
            self.ctx.deregister_table(name)?;
        } else if self.table_exists(name)? {
            return Err(FlareError::Execution(format!(
                "Temporary view '{}' already exists",
                name
            )));
        }
        self.ctx.register_table(name, df.into_view())?;
        Ok(())
    }

    /// Drops a view registered with [`Catalog::create_temp_view`]. Returns
    /// false if there was none.
    pub fn drop_temp_view(&self, name: &str) -> Result<bool> {
        Ok(self.ctx.deregister_table(name)?.is_some())
    }
}
