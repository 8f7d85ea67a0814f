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

//! Intervals of unchanged stock.
//!
//! The input has one row per store, product and day with the units in
//! stock. The output has one row per run of consecutive days in which a
//! product's stock stayed the same, with the first and last day of the run.
//!
//! Within one store, product and quantity, numbering the days in date order
//! and subtracting that number from the date gives the same value for every
//! day of a run, and a different value once a day is missing or the
//! quantity changed in between. Grouping by that value yields the runs.

use crate::error::Result;
use crate::session::{collect_and_show, Session};
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::{max, min};
use datafusion::functions_window::expr_fn::row_number;
use datafusion::logical_expr::ExprFunctionExt;
use datafusion::prelude::{cast, col, DataFrame};
use indoc::indoc;

/// Name of the view holding the daily stock.
pub const DAILY_STOCK_VIEW: &str = "daily_stock";

const INTERVALS_SQL: &str = indoc! {"
    WITH numbered AS (
        SELECT store_id, product_id, date, quantity,
            CAST(CAST(date AS INT) AS BIGINT) - CAST(ROW_NUMBER() OVER (
                PARTITION BY store_id, product_id, quantity
                ORDER BY date) AS BIGINT) AS island
        FROM daily_stock
    )
    SELECT store_id, product_id, MIN(date) AS start_date, MAX(date) AS end_date, quantity
    FROM numbered
    GROUP BY store_id, product_id, island, quantity
    ORDER BY store_id, product_id, start_date
"};

/// Reads the daily stock, a parquet file or directory with `store_id`,
/// `product_id`, `date` and `quantity` columns, and registers it.
pub async fn load(session: &Session, path: &str) -> Result<DataFrame> {
    let df = session.read().parquet(path).await?;
    session.register_dataframe(DAILY_STOCK_VIEW, df.clone())?;
    Ok(df)
}

/// Computes the intervals with the DataFrame API.
pub async fn run_dataframe(session: &Session, path: &str) -> Result<Vec<RecordBatch>> {
    let day_number = row_number()
        .partition_by(vec![col("store_id"), col("product_id"), col("quantity")])
        .order_by(vec![col("date").sort(true, false)])
        .build()?
        .alias("day_number");

    let df = load(session, path)
        .await?
        .window(vec![day_number])?
        .with_column(
            "island",
            cast(cast(col("date"), DataType::Int32), DataType::Int64)
                - cast(col("day_number"), DataType::Int64),
        )?
        .aggregate(
            vec![col("store_id"), col("product_id"), col("island"), col("quantity")],
            vec![
                min(col("date")).alias("start_date"),
                max(col("date")).alias("end_date"),
            ],
        )?
        .select_columns(&["store_id", "product_id", "start_date", "end_date", "quantity"])?
        .sort(vec![
            col("store_id").sort(true, false),
            col("product_id").sort(true, false),
            col("start_date").sort(true, false),
        ])?;
    collect_and_show(df).await
}

/// Computes the intervals with SQL.
pub async fn run(session: &Session, path: &str) -> Result<Vec<RecordBatch>> {
    load(session, path).await?;
    collect_and_show(session.sql(INTERVALS_SQL).await?).await
}
