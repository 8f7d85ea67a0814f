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

//! Copies a table of a relational database through the engine: the rows
//! are read, shown and written to another table of the same database.

use crate::error::Result;
use crate::jdbc::{read_jdbc, write_jdbc, JdbcOptions, SaveMode};
use crate::session::{collect_and_show, Session};
use datafusion::arrow::record_batch::RecordBatch;
use log::info;

/// Reads `options.dbtable` and overwrites `target_table` with its rows.
/// Returns the rows read.
pub async fn run(
    session: &Session,
    options: &JdbcOptions,
    target_table: &str,
) -> Result<Vec<RecordBatch>> {
    let source = read_jdbc(session, options).await?;
    let batches = collect_and_show(source.clone()).await?;

    let target = options.clone().with_dbtable(target_table);
    let written = write_jdbc(source, &target, SaveMode::Overwrite).await?;
    info!(
        "Copied {} rows from {} to {}",
        written, options.dbtable, target_table
    );
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::num_rows;
    use crate::jdbc::JdbcConnection;

    #[tokio::test]
    async fn copy_authors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let url = format!(
            "jdbc:sqlite:{}?mode=rwc",
            dir.path().join("pubs.db").display()
        );
        let options = JdbcOptions::new(url, "authors");

        let connection = JdbcConnection::connect(&options).await?;
        connection
            .execute("CREATE TABLE authors (au_id TEXT, au_lname TEXT, au_fname TEXT, contract INTEGER)")
            .await?;
        connection
            .execute(
                "INSERT INTO authors VALUES \
                 ('172-32-1176', 'White', 'Johnson', 0), \
                 ('213-46-8915', 'Green', 'Marjorie', 1), \
                 ('238-95-7766', 'Carson', 'Cheryl', 1)",
            )
            .await?;

        let session = Session::builder().build()?;
        let batches = run(&session, &options, "authors2").await?;
        assert_eq!(3, num_rows(&batches));

        // a second run replaces the previous copy
        run(&session, &options, "authors2").await?;
        let copy = read_jdbc(&session, &options.clone().with_dbtable("authors2")).await?;
        assert_eq!(3, copy.count().await?);

        connection.close().await;
        Ok(())
    }
}
