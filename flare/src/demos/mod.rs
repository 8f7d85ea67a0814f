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

//! The demonstrations. Each one prints what it computes and returns the
//! final result so callers and tests can inspect it.

pub mod catalog;
pub mod formats;
pub mod jdbc;
pub mod server;
pub mod stock;
pub mod ticks;
pub mod udf;
pub mod wordcount;

use datafusion::arrow::record_batch::RecordBatch;

/// Total number of rows of a result.
pub fn num_rows(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}
