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

//! Converts a CSV file to parquet, CSV and JSON, then reads the parquet
//! copy back and queries it with SQL. [`inspect`] takes a first look at a
//! CSV file.

use crate::error::Result;
use crate::io::{DataFrameWriter, WriteFormat};
use crate::session::{collect_and_show, Session};
use datafusion::arrow::datatypes::Schema;
use datafusion::arrow::record_batch::RecordBatch;
use indoc::indoc;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const CITIES_SQL: &str = indoc! {"
    SELECT city, COUNT(*) AS people, AVG(age) AS avg_age
    FROM people_parquet
    GROUP BY city
    ORDER BY city
"};

fn output_path(out_dir: &Path, format: WriteFormat) -> String {
    let extension = match format {
        WriteFormat::Csv => "csv",
        WriteFormat::Parquet => "parquet",
        WriteFormat::Json => "json",
    };
    out_dir
        .join(format!("people.{}", extension))
        .to_string_lossy()
        .into_owned()
}

/// Writes `input_csv` in every format under `out_dir` and aggregates the
/// parquet copy per city.
pub async fn run<P: AsRef<Path>>(
    session: &Session,
    input_csv: &str,
    out_dir: P,
) -> Result<Vec<RecordBatch>> {
    let people = session.read().csv(input_csv, true, b',').await?;
    let rows = people.clone().count().await?;

    for format in [WriteFormat::Parquet, WriteFormat::Csv, WriteFormat::Json] {
        let path = output_path(out_dir.as_ref(), format);
        DataFrameWriter::new(people.clone()).save(format, &path).await?;

        let copy = session.read().load(format, &path).await?.count().await?;
        info!("{} holds {} of {} rows", path, copy, rows);
    }

    let parquet = output_path(out_dir.as_ref(), WriteFormat::Parquet);
    let people = session.read().parquet(&parquet).await?;
    session.register_dataframe("people_parquet", people)?;
    collect_and_show(session.sql(CITIES_SQL).await?).await
}

/// Renders a schema as a tree, one line per column.
pub fn schema_tree(schema: &Schema) -> String {
    let mut tree = String::from("root\n");
    for field in schema.fields() {
        tree.push_str(&format!(
            " |-- {}: {} (nullable = {})\n",
            field.name(),
            field.data_type(),
            field.is_nullable()
        ));
    }
    tree
}

/// Downloads `url` into `dir`, keeping the file name of the URL when it is
/// a `.csv` file. Returns the local path.
pub async fn download_csv(url: &str, dir: &Path) -> Result<PathBuf> {
    let parsed = Url::parse(url)?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| name.ends_with(".csv"))
        .unwrap_or("download.csv")
        .to_owned();

    let body = reqwest::get(parsed).await?.error_for_status()?.bytes().await?;
    let path = dir.join(name);
    fs::write(&path, &body)?;
    info!("Downloaded {} bytes from {} to {}", body.len(), url, path.display());
    Ok(path)
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Prints the schema of a CSV file and its first `limit` rows, which are
/// returned. An `http(s)://` location is downloaded to a scratch directory
/// first.
pub async fn inspect(
    session: &Session,
    path: &str,
    has_header: bool,
    limit: usize,
) -> Result<Vec<RecordBatch>> {
    // the scratch directory lives until the rows are collected
    let scratch = tempfile::tempdir()?;
    let local = if is_remote(path) {
        download_csv(path, scratch.path())
            .await?
            .to_string_lossy()
            .into_owned()
    } else {
        path.to_owned()
    };

    let df = session.read().csv(&local, has_header, b',').await?;
    print!("{}", schema_tree(df.schema().as_arrow()));
    collect_and_show(df.limit(0, Some(limit))?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagen::write_people_csv;
    use crate::demos::num_rows;
    use datafusion::arrow::array::{Array, Float64Array, Int64Array};
    use datafusion::arrow::compute::concat_batches;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn convert_and_query() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("people.csv");
        write_people_csv(&input)?;
        let out = dir.path().join("out");

        let session = Session::builder().build()?;
        let batches = run(&session, input.to_str().unwrap(), &out).await?;

        for name in ["people.parquet", "people.csv", "people.json"] {
            assert!(out.join(name).is_file(), "{} missing", name);
        }

        let batch = concat_batches(&batches[0].schema(), &batches)?;
        let people = batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        let avg_age = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        // Boston, Chicago, Denver
        assert_eq!(vec![2, 2, 2], people.values().to_vec());
        assert!((avg_age.value(0) - 39.5).abs() < 1e-9);
        assert_eq!(3, avg_age.len());

        let json = session
            .read()
            .json(out.join("people.json").to_str().unwrap())
            .await?;
        assert_eq!(6, json.count().await?);
        Ok(())
    }

    #[tokio::test]
    async fn inspect_with_and_without_header() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("people.csv");
        write_people_csv(&input)?;
        let session = Session::builder().build()?;

        let batches = inspect(&session, input.to_str().unwrap(), true, 5).await?;
        assert_eq!(5, num_rows(&batches));
        assert_eq!("name", batches[0].schema().field(0).name());

        // the header line becomes a row of its own
        let batches = inspect(&session, input.to_str().unwrap(), false, 10).await?;
        assert_eq!(7, num_rows(&batches));
        assert_eq!("column_1", batches[0].schema().field(0).name());

        let tree = schema_tree(batches[0].schema().as_ref());
        assert!(tree.starts_with("root\n |-- column_1: Utf8"));
        assert_eq!(4, tree.lines().count());
        Ok(())
    }

    /// Answers one HTTP request with `body` on a local port.
    async fn serve_once(body: &'static str) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = vec![0; 4096];
            let _ = stream.read(&mut request).await.unwrap();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        Ok(format!("http://{}/data/adult_data.csv", addr))
    }

    #[tokio::test]
    async fn inspect_remote_csv() -> Result<()> {
        let url = serve_once("age,workclass\n39,State-gov\n50,Private\n38,Private\n").await?;
        let session = Session::builder().build()?;

        let batches = inspect(&session, &url, true, 2).await?;
        assert_eq!(2, num_rows(&batches));
        assert_eq!("age", batches[0].schema().field(0).name());
        assert_eq!("workclass", batches[0].schema().field(1).name());
        Ok(())
    }

    #[tokio::test]
    async fn download_keeps_csv_name() -> Result<()> {
        let url = serve_once("a\n1\n").await?;
        let dir = tempfile::tempdir()?;
        let path = download_csv(&url, dir.path()).await?;
        assert_eq!(dir.path().join("adult_data.csv"), path);
        assert_eq!("a\n1\n", fs::read_to_string(&path)?);

        assert!(download_csv("not a url", dir.path()).await.is_err());
        Ok(())
    }
}
