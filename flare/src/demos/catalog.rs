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

//! A tour of the catalog with a `pubs` database and a `student` table:
//! databases and tables are created, listed, described, filled, copied,
//! backed by existing files and dropped again.
//!
//! The tour leaves `pubs` as the current database with a `student_copy`
//! table, ready to be served to SQL clients.

use crate::error::Result;
use crate::io::SaveMode;
use crate::session::{collect_and_show, Session};
use datafusion::arrow::record_batch::RecordBatch;
use indoc::formatdoc;
use log::info;
use std::path::Path;

/// Database the tour works in.
pub const DATABASE: &str = "pubs";

async fn show(session: &Session, sql: &str) -> Result<Vec<RecordBatch>> {
    println!("> {}", sql);
    collect_and_show(session.sql(sql).await?).await
}

async fn show_tables(session: &Session) -> Result<()> {
    let tables = session.catalog().list_tables(None).await?;
    println!("{}", serde_json::to_string_pretty(&tables)?);
    Ok(())
}

/// Runs the tour. `students_dir` holds `student.csv` and the
/// `existing_student/` directory, see
/// [`write_students`](crate::datagen::write_students). Returns the rows of the
/// external table.
pub async fn run<P: AsRef<Path>>(session: &Session, students_dir: P) -> Result<Vec<RecordBatch>> {
    let catalog = session.catalog();
    let students_dir = students_dir.as_ref();

    // start from an empty database
    catalog.drop_database(DATABASE, true, true).await?;

    catalog.create_database(DATABASE, false).await?;
    println!("Databases: {:?}", catalog.list_databases()?);
    println!("Database {} in catalog {}", DATABASE, catalog.current_catalog());
    catalog.set_current_database(DATABASE).await?;
    println!("Current database: {}", catalog.current_database());

    show(session, "CREATE TABLE student (id INT, name VARCHAR, age INT)").await?;
    show_tables(session).await?;
    show(session, "DESCRIBE student").await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&catalog.list_columns("student").await?)?
    );
    catalog.drop_table("student", true).await?;

    show(session, "CREATE TABLE student (id INT, name VARCHAR, age INT)").await?;
    show(session, "INSERT INTO student VALUES (1, 'Sergio', 45)").await?;
    show(session, "SELECT * FROM student").await?;
    show(session, "CREATE TABLE student_copy AS SELECT * FROM student").await?;
    catalog.drop_table("student", false).await?;

    show(session, "CREATE TABLE student AS SELECT name, age FROM student_copy").await?;
    show(session, "DESCRIBE student").await?;
    catalog.drop_table("student", false).await?;

    // rows of a CSV file, inserted through a temporary view
    let csv = students_dir.join("student.csv").to_string_lossy().into_owned();
    show(session, "CREATE TABLE student (name VARCHAR, age INT)").await?;
    let temp_student = session.read().csv(&csv, true, b',').await?;
    catalog.create_temp_view("temp_student", temp_student, true)?;
    show(session, "INSERT INTO student SELECT * FROM temp_student").await?;
    show(session, "SELECT * FROM student").await?;
    catalog.drop_table("student", false).await?;

    // the same rows, appended with the DataFrame API
    let df = session.read().csv(&csv, true, b',').await?;
    catalog.save_as_table("student", df, SaveMode::Append).await?;
    collect_and_show(session.table("student").await?).await?;
    catalog.drop_table("student", false).await?;
    catalog.drop_temp_view("temp_student")?;

    // a table over files that already exist; dropping it keeps the files
    let location = students_dir.join("existing_student");
    show(
        session,
        &formatdoc! {"
            CREATE EXTERNAL TABLE IF NOT EXISTS student (name VARCHAR, age INT)
            STORED AS CSV
            LOCATION '{}/'
            OPTIONS ('format.has_header' 'false', 'format.delimiter' ',')",
            location.display()
        },
    )
    .await?;
    let existing = show(session, "SELECT * FROM student ORDER BY name").await?;
    show_tables(session).await?;
    catalog.drop_table("student", false).await?;

    let left = catalog.list_tables(None).await?;
    info!("Tables left in {}: {:?}", DATABASE, left);
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagen::write_students;
    use crate::demos::num_rows;

    #[tokio::test]
    async fn tour_leaves_copy_and_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_students(dir.path())?;

        let session = Session::builder().build()?;
        let existing = run(&session, dir.path()).await?;
        assert_eq!(2, num_rows(&existing));

        let catalog = session.catalog();
        assert_eq!(DATABASE, catalog.current_database());
        let tables = catalog.list_tables(None).await?;
        assert_eq!(1, tables.len());
        assert_eq!("student_copy", tables[0].name);
        assert_eq!(1, session.table("student_copy").await?.count().await?);
        assert!(!catalog.table_exists("temp_student")?);
        assert!(dir.path().join("existing_student/part-0.csv").is_file());

        // a second run starts over
        run(&session, dir.path()).await?;
        assert_eq!(1, catalog.list_tables(None).await?.len());
        Ok(())
    }
}
