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

//! Time between consecutive trades of each stock symbol, computed with
//! window functions over a `symbol, ts, price` CSV file.

use crate::error::Result;
use crate::session::{collect_and_show, Session};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::DataFrame;
use indoc::indoc;
use log::info;

const INTERVALS_SQL: &str = indoc! {"
    SELECT
        symbol,
        ROW_NUMBER() OVER (PARTITION BY symbol ORDER BY ts) AS tick,
        ts,
        LAG(ts) OVER (PARTITION BY symbol ORDER BY ts) AS prev_ts,
        ts - LAG(ts) OVER (PARTITION BY symbol ORDER BY ts) AS interval_secs,
        price,
        price - LAG(price) OVER (PARTITION BY symbol ORDER BY ts) AS price_change,
        AVG(price) OVER (
            PARTITION BY symbol ORDER BY ts
            ROWS BETWEEN 2 PRECEDING AND CURRENT ROW
        ) AS moving_avg
    FROM ticks
"};

const SUMMARY_SQL: &str = indoc! {"
    SELECT
        symbol,
        COUNT(*) AS ticks,
        MIN(interval_secs) AS min_interval,
        MAX(interval_secs) AS max_interval,
        AVG(interval_secs) AS avg_interval
    FROM tick_intervals
    GROUP BY symbol
    ORDER BY symbol
"};

/// Registers the ticks of `path` as `ticks` and their intervals as
/// `tick_intervals`. Returns the intervals.
pub async fn intervals(session: &Session, path: &str) -> Result<DataFrame> {
    let ticks = session.read().csv(path, true, b',').await?;
    session.register_dataframe("ticks", ticks)?;

    let intervals = session.sql(INTERVALS_SQL).await?;
    session.register_dataframe("tick_intervals", intervals.clone())?;
    Ok(intervals)
}

/// Prints every tick with its interval, ordered by symbol and time.
pub async fn run(session: &Session, path: &str) -> Result<Vec<RecordBatch>> {
    intervals(session, path).await?;
    info!("Computing tick intervals of {}", path);
    collect_and_show(session.sql("SELECT * FROM tick_intervals ORDER BY symbol, ts").await?).await
}

/// Prints per symbol the number of ticks and the shortest, longest and
/// average interval. Expects [`intervals`] to have run.
pub async fn summary(session: &Session) -> Result<Vec<RecordBatch>> {
    collect_and_show(session.sql(SUMMARY_SQL).await?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagen::write_stock_csv;
    use datafusion::arrow::array::{Array, Float64Array, Int64Array, UInt64Array};
    use indoc::indoc;
    use std::fs;

    fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> &'a T {
        let index = batch.schema().index_of(name).unwrap();
        batch.column(index).as_any().downcast_ref::<T>().unwrap()
    }

    #[tokio::test]
    async fn intervals_per_symbol() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stocks.csv");
        fs::write(
            &path,
            indoc! {"
                symbol,ts,price
                AAA,130,11.0
                BBB,100,20.0
                AAA,100,10.0
                AAA,200,12.0
                BBB,110,23.0
                AAA,205,15.0
            "},
        )?;

        let session = Session::builder().target_partitions(1).build()?;
        let batches = run(&session, path.to_str().unwrap()).await?;
        let batch = datafusion::arrow::compute::concat_batches(&batches[0].schema(), &batches)?;
        assert_eq!(6, batch.num_rows());

        let tick = column::<UInt64Array>(&batch, "tick");
        let prev = column::<Int64Array>(&batch, "prev_ts");
        let interval = column::<Int64Array>(&batch, "interval_secs");
        let change = column::<Float64Array>(&batch, "price_change");
        let avg = column::<Float64Array>(&batch, "moving_avg");

        // AAA: 100, 130, 200, 205
        assert_eq!(1, tick.value(0));
        assert!(prev.is_null(0));
        assert!(interval.is_null(0));
        assert!(change.is_null(0));
        assert_eq!(100, prev.value(1));
        assert_eq!(30, interval.value(1));
        assert_eq!(70, interval.value(2));
        assert_eq!(5, interval.value(3));
        assert_eq!(4, tick.value(3));
        assert!((change.value(3) - 3.0).abs() < 1e-9);
        assert!((avg.value(2) - 11.0).abs() < 1e-9);
        assert!((avg.value(3) - 38.0 / 3.0).abs() < 1e-9);

        // BBB: 100, 110
        assert_eq!(1, tick.value(4));
        assert!(interval.is_null(4));
        assert_eq!(10, interval.value(5));

        let batches = summary(&session).await?;
        let batch = datafusion::arrow::compute::concat_batches(&batches[0].schema(), &batches)?;
        assert_eq!(2, batch.num_rows());
        let ticks = column::<Int64Array>(&batch, "ticks");
        let min = column::<Int64Array>(&batch, "min_interval");
        let max = column::<Int64Array>(&batch, "max_interval");
        assert_eq!(4, ticks.value(0));
        assert_eq!(5, min.value(0));
        assert_eq!(70, max.value(0));
        assert_eq!(2, ticks.value(1));
        assert_eq!(10, min.value(1));
        Ok(())
    }

    #[tokio::test]
    async fn generated_ticks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stocks.csv");
        write_stock_csv(&path, &["AAPL", "GOOG", "MSFT"], 50, 42)?;

        let session = Session::builder().build()?;
        let df = intervals(&session, path.to_str().unwrap()).await?;
        assert_eq!(150, df.count().await?);

        let batches = session
            .sql_collect(
                "SELECT COUNT(prev_ts) AS gaps, MIN(interval_secs) AS lo, MAX(interval_secs) AS hi \
                 FROM tick_intervals",
            )
            .await?;
        assert_eq!(147, column::<Int64Array>(&batches[0], "gaps").value(0));
        assert!(column::<Int64Array>(&batches[0], "lo").value(0) >= 1);
        assert!(column::<Int64Array>(&batches[0], "hi").value(0) <= 90);

        let batches = summary(&session).await?;
        assert_eq!(3, batches.iter().map(|b| b.num_rows()).sum::<usize>());
        Ok(())
    }
}
