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

//! The session is the entry point of every demo. It wraps the engine's
//! `SessionContext` together with the application name it was built for.

use crate::catalog::Catalog;
use crate::configs::{FlareConfig, FLARE_APP_NAME, FLARE_BATCH_SIZE, FLARE_TARGET_PARTITIONS};
use crate::error::Result;
use crate::io::DataFrameReader;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::pretty::pretty_format_batches;
use datafusion::config::ConfigOptions;
use datafusion::logical_expr::ScalarUDF;
use datafusion::prelude::{DataFrame, SessionConfig, SessionContext};
use log::{debug, info};

/// Builds a [`Session`] from an application name and engine settings.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    app_name: String,
    options:  Vec<(String, String)>,
}

impl SessionBuilder {
    /// Creates a builder with the built-in defaults.
    pub fn new() -> Self {
        Self {
            app_name: FLARE_APP_NAME.to_string(),
            options:  vec![],
        }
        .target_partitions(*FLARE_TARGET_PARTITIONS)
        .batch_size(*FLARE_BATCH_SIZE)
    }

    /// Creates a builder from the `[session]` section of a configuration.
    pub fn from_conf(conf: &FlareConfig) -> Result<Self> {
        Ok(Self::new()
            .app_name(conf.get_str("session", "app_name")?)
            .target_partitions(conf.get_parsed("session", "target_partitions")?)
            .batch_size(conf.get_parsed("session", "batch_size")?)
            .enable_information_schema(conf.get_parsed("session", "information_schema")?))
    }

    /// Sets the application name.
    pub fn app_name<T: Into<String>>(mut self, name: T) -> Self {
        self.app_name = name.into();
        self
    }

    /// Sets an engine option, e.g. `datafusion.execution.batch_size`. Later
    /// calls for the same key win. Unknown keys fail in
    /// [`SessionBuilder::build`].
    pub fn config<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Sets the number of partitions the engine plans with.
    pub fn target_partitions(self, n: usize) -> Self {
        self.config("datafusion.execution.target_partitions", n.to_string())
    }

    /// Sets the number of rows per record batch.
    pub fn batch_size(self, n: usize) -> Self {
        self.config("datafusion.execution.batch_size", n.to_string())
    }

    /// Exposes `information_schema` and enables `SHOW TABLES`.
    pub fn enable_information_schema(self, enabled: bool) -> Self {
        self.config("datafusion.catalog.information_schema", enabled.to_string())
    }

    /// Creates the session.
    pub fn build(self) -> Result<Session> {
        let mut options = ConfigOptions::new();
        for (key, value) in &self.options {
            debug!("{}: {} = {}", self.app_name, key, value);
            options.set(key, value)?;
        }

        let config = SessionConfig::from(options);
        info!(
            "Starting session {} [target_partitions: {}, batch_size: {}, information_schema: {}]",
            self.app_name,
            config.options().execution.target_partitions,
            config.options().execution.batch_size,
            config.options().catalog.information_schema
        );

        Ok(Session {
            app_name: self.app_name,
            ctx:      SessionContext::new_with_config(config),
        })
    }
}

/// A query session. Cloning is cheap and clones share the same catalog,
/// tables and functions.
#[derive(Clone)]
pub struct Session {
    app_name: String,
    ctx:      SessionContext,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({:?}, {:?})", self.app_name, self.ctx.session_id())
    }
}

impl Session {
    /// Returns a builder with the built-in defaults.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Returns the application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns the underlying engine context.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Plans a SQL statement. DDL statements take effect immediately, queries
    /// run when the result is collected.
    pub async fn sql(&self, sql: &str) -> Result<DataFrame> {
        debug!("{}: {}", self.app_name, sql);
        Ok(self.ctx.sql(sql).await?)
    }

    /// Runs a SQL statement to completion and returns its output.
    pub async fn sql_collect(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        Ok(self.sql(sql).await?.collect().await?)
    }

    /// Returns a registered table or view as a DataFrame.
    pub async fn table(&self, name: &str) -> Result<DataFrame> {
        Ok(self.ctx.table(name).await?)
    }

    /// Registers a DataFrame as a view, replacing any table with the same
    /// name.
    pub fn register_dataframe(&self, name: &str, df: DataFrame) -> Result<()> {
        self.ctx.deregister_table(name)?;
        self.ctx.register_table(name, df.into_view())?;
        Ok(())
    }

    /// Registers a scalar user-defined function.
    pub fn register_udf(&self, udf: ScalarUDF) {
        debug!("{}: registering function {}", self.app_name, udf.name());
        self.ctx.register_udf(udf);
    }

    /// Returns the reader for text, CSV, parquet and JSON sources.
    pub fn read(&self) -> DataFrameReader<'_> {
        DataFrameReader::new(self)
    }

    /// Returns the catalog of databases, tables and views.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.ctx)
    }
}

/// Collects a DataFrame, prints it as a table and returns the batches.
pub async fn collect_and_show(df: DataFrame) -> Result<Vec<RecordBatch>> {
    let batches = df.collect().await?;
    println!("{}", pretty_format_batches(&batches)?);
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlareError;
    use datafusion::arrow::array::Int64Array;

    #[tokio::test]
    async fn build_with_settings() -> Result<()> {
        let session = Session::builder()
            .app_name("word count")
            .target_partitions(2)
            .batch_size(1024)
            .enable_information_schema(true)
            .build()?;

        assert_eq!("word count", session.app_name());
        let config = session.context().copied_config();
        assert_eq!(2, config.options().execution.target_partitions);
        assert_eq!(1024, config.options().execution.batch_size);
        assert!(config.options().catalog.information_schema);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_setting_fails() {
        let result = Session::builder()
            .config("datafusion.execution.no_such_option", "1")
            .build();
        assert!(matches!(result, Err(FlareError::DataFusion(_))));
    }

    #[tokio::test]
    async fn from_builtin_conf() -> Result<()> {
        let session = SessionBuilder::from_conf(&FlareConfig::builtin())?.build()?;
        assert_eq!("flare", session.app_name());
        Ok(())
    }

    #[tokio::test]
    async fn sql_and_views() -> Result<()> {
        let session = Session::builder().build()?;

        let df = session.sql("SELECT 1 AS one UNION ALL SELECT 2").await?;
        session.register_dataframe("numbers", df)?;

        let batches = session
            .sql_collect("SELECT SUM(one) AS total FROM numbers")
            .await?;
        let total = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(3, total.value(0));

        let batches = collect_and_show(session.table("numbers").await?).await?;
        assert_eq!(2, batches.iter().map(|b| b.num_rows()).sum::<usize>());

        assert!(session.sql("SELECT * FROM missing_table").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn views_are_replaced() -> Result<()> {
        let session = Session::builder().build()?;
        session.register_dataframe("v", session.sql("SELECT 1 AS n").await?)?;
        session.register_dataframe("v", session.sql("SELECT 2 AS n UNION ALL SELECT 3").await?)?;
        assert_eq!(2, session.table("v").await?.count().await?);

        let catalog = session.catalog();
        catalog.create_temp_view("v", session.sql("SELECT 4 AS n").await?, true)?;
        assert_eq!(1, session.table("v").await?.count().await?);
        Ok(())
    }
}
