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

//! Word count over a text file or a directory of text files.
//!
//! Lines are split at every single space, so the words keep their case and
//! punctuation, and a run of spaces yields empty words. The result has one
//! row per distinct word, most frequent first, ties in word order.

use crate::error::Result;
use crate::io::TEXT_COLUMN;
use crate::session::{collect_and_show, Session};
use crate::udf::split_words;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::count;
use datafusion::prelude::{col, lit};
use indoc::indoc;
use log::info;
use std::path::Path;

/// Name of the view holding the input lines.
pub const LINES_VIEW: &str = "lines";

const WORD_COUNT_SQL: &str = indoc! {"
    SELECT word, COUNT(*) AS count
    FROM (
        SELECT unnest(string_to_array(value, ' ')) AS word
        FROM lines
    ) AS words
    GROUP BY word
    ORDER BY count DESC, word ASC
"};

/// Counts words with SQL.
pub async fn run<P: AsRef<Path>>(session: &Session, path: P) -> Result<Vec<RecordBatch>> {
    let lines = session.read().text(path)?;
    session.register_dataframe(LINES_VIEW, lines)?;

    info!("Counting words with SQL");
    collect_and_show(session.sql(WORD_COUNT_SQL).await?).await
}

/// Counts words with the DataFrame API and the `split_words` function.
pub async fn run_dataframe<P: AsRef<Path>>(
    session: &Session,
    path: P,
) -> Result<Vec<RecordBatch>> {
    let df = session
        .read()
        .text(path)?
        .select(vec![split_words().call(vec![col(TEXT_COLUMN)]).alias("word")])?
        .unnest_columns(&["word"])?
        .aggregate(vec![col("word")], vec![count(lit(1)).alias("count")])?
        .sort(vec![
            col("count").sort(false, false),
            col("word").sort(true, false),
        ])?;

    info!("Counting words with the DataFrame API");
    collect_and_show(df).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{Array, Int64Array, StringArray};
    use datafusion::arrow::compute::cast;
    use datafusion::arrow::datatypes::DataType;
    use std::fs;

    fn word_counts(batches: &[RecordBatch]) -> Vec<(String, i64)> {
        let mut counts = vec![];
        for batch in batches {
            let words = cast(batch.column(0), &DataType::Utf8).unwrap();
            let words = words.as_any().downcast_ref::<StringArray>().unwrap();
            let occurrences = batch
                .column(1)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap();
            for i in 0..batch.num_rows() {
                counts.push((words.value(i).to_owned(), occurrences.value(i)));
            }
        }
        counts
    }

    fn expected() -> Vec<(String, i64)> {
        vec![("the", 3), ("cat", 2), ("", 1), ("The", 1), ("hat", 1), ("in", 1)]
            .into_iter()
            .map(|(w, c)| (w.to_owned(), c))
            .collect()
    }

    #[tokio::test]
    async fn sql_word_count() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("words.txt");
        fs::write(&path, "the cat  in the hat\nThe cat the\n")?;

        let session = Session::builder().build()?;
        let batches = run(&session, &path).await?;
        assert_eq!(expected(), word_counts(&batches));

        // the lines view is replaced on a second run
        let batches = run(&session, &path).await?;
        assert_eq!(expected(), word_counts(&batches));
        Ok(())
    }

    #[tokio::test]
    async fn dataframe_word_count_over_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("part-0.txt"), "the cat  in the hat\n")?;
        fs::write(dir.path().join("part-1.txt"), "The cat the\n")?;

        let session = Session::builder().build()?;
        let batches = run_dataframe(&session, dir.path()).await?;
        assert_eq!(expected(), word_counts(&batches));
        Ok(())
    }
}
