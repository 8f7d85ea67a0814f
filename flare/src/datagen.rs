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

//! Sample datasets for the demos.

use crate::error::Result;
use datafusion::arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use datafusion::arrow::csv::Writer;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use indoc::indoc;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

/// Time of the first tick, 2021-06-01 09:30:00 UTC, in seconds.
pub const FIRST_TICK_TS: i64 = 1_622_539_800;

/// First day of the daily stock, 2021-01-01, in days since the epoch.
pub const FIRST_STOCK_DAY: i32 = 18_628;

const SAMPLE_TEXT: &str = indoc! {"
    The quick brown fox jumps over the lazy dog.
    A dog is a man's best friend, and the fox knows it.
    To be, or not to be: that is the question.
    Whether 'tis nobler in the mind to suffer the slings and arrows.
    The fox and the dog became friends after all.
"};

/// One trade of a stock.
#[derive(Debug, Clone, PartialEq)]
pub struct StockTick {
    /// Ticker symbol.
    pub symbol: String,
    /// Seconds since the epoch.
    pub ts:     i64,
    /// Trade price.
    pub price:  f64,
}

/// Generates `ticks_per_symbol` ticks per symbol, 1 to 90 seconds apart,
/// with a random walk over the price. The same seed gives the same ticks.
pub fn stock_ticks(symbols: &[&str], ticks_per_symbol: usize, seed: u64) -> Vec<StockTick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ticks = Vec::with_capacity(symbols.len() * ticks_per_symbol);
    for symbol in symbols {
        let mut ts = FIRST_TICK_TS;
        let mut price: f64 = rng.gen_range(20.0..500.0);
        for _ in 0..ticks_per_symbol {
            ts += rng.gen_range(1..=90);
            price = (price * (1.0 + rng.gen_range(-0.02..0.02)) * 100.0).round() / 100.0;
            ticks.push(StockTick {
                symbol: symbol.to_string(),
                ts,
                price,
            });
        }
    }
    ticks
}

/// Converts ticks into a `symbol, ts, price` record batch.
pub fn stock_batch(ticks: &[StockTick]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("symbol", DataType::Utf8, false),
        Field::new("ts", DataType::Int64, false),
        Field::new("price", DataType::Float64, false),
    ]));
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from_iter_values(ticks.iter().map(|t| t.symbol.as_str()))),
            Arc::new(Int64Array::from_iter_values(ticks.iter().map(|t| t.ts))),
            Arc::new(Float64Array::from_iter_values(ticks.iter().map(|t| t.price))),
        ],
    )?)
}

/// Units of one product in one store at the end of a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStock {
    /// Store identifier.
    pub store_id:   i64,
    /// Product identifier.
    pub product_id: i64,
    /// Days since the epoch.
    pub date:       i32,
    /// Units in stock.
    pub quantity:   i64,
}

/// Generates `days` days of stock for every store and product. Quantities
/// stay the same for a few days before they change, and about one day in ten
/// has no record, so both breaks end an interval of equal stock.
pub fn daily_stock(stores: i64, products: i64, days: usize, seed: u64) -> Vec<DailyStock> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stock = vec![];
    for store_id in 1..=stores {
        for product_id in 1..=products {
            let mut quantity = rng.gen_range(0..=5);
            for day in 0..days {
                if rng.gen_bool(0.3) {
                    quantity = rng.gen_range(0..=5);
                }
                if rng.gen_bool(0.1) {
                    continue;
                }
                stock.push(DailyStock {
                    store_id,
                    product_id,
                    date: FIRST_STOCK_DAY + day as i32,
                    quantity,
                });
            }
        }
    }
    stock
}

/// Converts daily stock into a `store_id, product_id, date, quantity`
/// record batch.
pub fn daily_stock_batch(stock: &[DailyStock]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("store_id", DataType::Int64, false),
        Field::new("product_id", DataType::Int64, false),
        Field::new("date", DataType::Date32, false),
        Field::new("quantity", DataType::Int64, false),
    ]));
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from_iter_values(stock.iter().map(|s| s.store_id))),
            Arc::new(Int64Array::from_iter_values(stock.iter().map(|s| s.product_id))),
            Arc::new(Date32Array::from_iter_values(stock.iter().map(|s| s.date))),
            Arc::new(Int64Array::from_iter_values(stock.iter().map(|s| s.quantity))),
        ],
    )?)
}

/// Writes daily stock as `part-00000.parquet` into the directory `dir`.
pub fn write_daily_stock_parquet<P: AsRef<Path>>(dir: P, stock: &[DailyStock]) -> Result<()> {
    let batch = daily_stock_batch(stock)?;
    fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join("part-00000.parquet");
    let mut writer = ArrowWriter::try_new(File::create(&path)?, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!("Wrote {} days of stock to {}", batch.num_rows(), path.display());
    Ok(())
}

fn create_parent<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes ticks of the given symbols to a CSV file with a header row.
pub fn write_stock_csv<P: AsRef<Path>>(
    path: P,
    symbols: &[&str],
    ticks_per_symbol: usize,
    seed: u64,
) -> Result<()> {
    let batch = stock_batch(&stock_ticks(symbols, ticks_per_symbol, seed))?;
    create_parent(&path)?;
    let mut writer = Writer::new(File::create(&path)?);
    writer.write(&batch)?;
    info!(
        "Wrote {} stock ticks to {}",
        batch.num_rows(),
        path.as_ref().display()
    );
    Ok(())
}

/// Writes `lines` lines of sample prose, cycling through the sample text.
pub fn write_words<P: AsRef<Path>>(path: P, lines: usize) -> Result<()> {
    let mut text = SAMPLE_TEXT.lines().cycle().take(lines).collect::<Vec<_>>().join("\n");
    text.push('\n');
    create_parent(&path)?;
    fs::write(&path, text)?;
    info!("Wrote {} lines of text to {}", lines, path.as_ref().display());
    Ok(())
}

/// Writes a small fixed `name, age, city` dataset.
pub fn write_people_csv<P: AsRef<Path>>(path: P) -> Result<()> {
    let people = indoc! {"
        name,age,city
        Alice,34,Boston
        Bob,27,Chicago
        Carol,45,Boston
        Dave,19,Denver
        Eve,31,Chicago
        Frank,52,Denver
    "};
    create_parent(&path)?;
    fs::write(&path, people)?;
    info!("Wrote people to {}", path.as_ref().display());
    Ok(())
}

/// Writes the student files of the catalog demo into `dir`: `student.csv`
/// with a header line, and `existing_student/`, a directory with one CSV
/// file without header that backs an external table.
pub fn write_students<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    let existing = dir.join("existing_student");
    fs::create_dir_all(&existing)?;
    fs::write(
        dir.join("student.csv"),
        indoc! {"
            name,age
            Ana,21
            Luis,23
            Marta,22
        "},
    )?;
    fs::write(
        existing.join("part-0.csv"),
        indoc! {"
            Pedro,30
            Lucia,28
        "},
    )?;
    info!("Wrote student files to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_deterministic() {
        let a = stock_ticks(&["AAPL", "MSFT"], 10, 7);
        let b = stock_ticks(&["AAPL", "MSFT"], 10, 7);
        assert_eq!(a, b);
        assert_eq!(20, a.len());

        for symbol in a.chunks(10) {
            assert!(symbol.windows(2).all(|w| {
                let gap = w[1].ts - w[0].ts;
                w[0].symbol == w[1].symbol && (1..=90).contains(&gap)
            }));
            assert!(symbol[0].ts > FIRST_TICK_TS);
        }
        assert_ne!(a, stock_ticks(&["AAPL", "MSFT"], 10, 8));
    }

    #[test]
    fn daily_stock_has_gaps() {
        let stock = daily_stock(2, 3, 60, 11);
        assert_eq!(stock, daily_stock(2, 3, 60, 11));
        assert!(stock.len() < 2 * 3 * 60);
        assert!(stock.iter().all(|s| (0..=5).contains(&s.quantity)));
        assert!(stock
            .iter()
            .all(|s| s.date >= FIRST_STOCK_DAY && s.date < FIRST_STOCK_DAY + 60));
    }

    #[test]
    fn sample_files() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let words = dir.path().join("text/words.txt");
        write_words(&words, 7)?;
        let text = fs::read_to_string(&words)?;
        assert_eq!(7, text.lines().count());
        assert!(text.starts_with("The quick brown fox"));

        let stocks = dir.path().join("stocks.csv");
        write_stock_csv(&stocks, &["IBM"], 5, 1)?;
        let csv = fs::read_to_string(&stocks)?;
        assert_eq!(Some("symbol,ts,price"), csv.lines().next());
        assert_eq!(6, csv.lines().count());

        let people = dir.path().join("people.csv");
        write_people_csv(&people)?;
        assert_eq!(7, fs::read_to_string(&people)?.lines().count());

        let students = dir.path().join("students");
        write_students(&students)?;
        assert!(students.join("student.csv").is_file());
        assert!(students.join("existing_student").is_dir());

        let daily = dir.path().join("daily_stocks");
        write_daily_stock_parquet(&daily, &daily_stock(1, 1, 10, 3))?;
        assert!(daily.join("part-00000.parquet").is_file());
        Ok(())
    }
}
