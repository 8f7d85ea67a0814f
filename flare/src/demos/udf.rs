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

//! Registers the user-defined functions and calls them from SQL and from
//! DataFrame expressions.

use crate::error::Result;
use crate::session::{collect_and_show, Session};
use crate::udf::{register_all, snake_case, str_len, to_upper};
use datafusion::arrow::array::StringArray;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::col;
use indoc::indoc;
use std::sync::Arc;

const PEOPLE_SQL: &str = indoc! {"
    SELECT name, str_len(name) AS name_len, to_upper(city) AS city
    FROM people
    ORDER BY name
"};

const PRICE_CHANGE_SQL: &str = indoc! {"
    SELECT symbol, ts, price,
        pct_change(price, LAG(price) OVER (PARTITION BY symbol ORDER BY ts)) AS pct
    FROM ticks
    ORDER BY symbol, ts
"};

/// The phrases `snake_case` is applied to.
pub const PHRASES: [&str; 2] = ["Hello Word", "Hello NetCoreConf"];

/// Applies `snake_case` to [`PHRASES`] from a DataFrame expression, then
/// registers it and calls it from SQL. Returns the SQL result.
pub async fn run(session: &Session) -> Result<Vec<RecordBatch>> {
    let schema = Arc::new(Schema::new(vec![Field::new("phrase", DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(PHRASES.to_vec()))])?;
    let phrases = session.context().read_batch(batch)?;

    collect_and_show(
        phrases
            .clone()
            .select(vec![snake_case().call(vec![col("phrase")]).alias("snake_case_phrase")])?,
    )
    .await?;

    session.register_udf(snake_case());
    session.register_dataframe("phrases", phrases)?;
    collect_and_show(
        session
            .sql("SELECT snake_case(phrase) AS snake_case_phrase FROM phrases")
            .await?,
    )
    .await
}

/// Applies the string functions to a `name, age, city` CSV file with SQL.
pub async fn people(session: &Session, people: &str) -> Result<Vec<RecordBatch>> {
    register_all(session);
    let df = session.read().csv(people, true, b',').await?;
    session.register_dataframe("people", df)?;
    collect_and_show(session.sql(PEOPLE_SQL).await?).await
}

/// The same as [`people`] through the DataFrame API.
pub async fn people_dataframe(session: &Session, people: &str) -> Result<Vec<RecordBatch>> {
    let df = session
        .read()
        .csv(people, true, b',')
        .await?
        .select(vec![
            col("name"),
            str_len().call(vec![col("name")]).alias("name_len"),
            to_upper().call(vec![col("city")]).alias("city"),
        ])?
        .sort(vec![col("name").sort(true, false)])?;
    collect_and_show(df).await
}

/// Percent change of each tick's price over the previous tick of the same
/// symbol, from a `symbol, ts, price` CSV file.
pub async fn price_changes(session: &Session, stocks: &str) -> Result<Vec<RecordBatch>> {
    register_all(session);
    let df = session.read().csv(stocks, true, b',').await?;
    session.register_dataframe("ticks", df)?;
    collect_and_show(session.sql(PRICE_CHANGE_SQL).await?).await
}
