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

#![warn(missing_docs, clippy::needless_borrow)]
// Clippy lints, some should be disabled incrementally
#![allow(
    clippy::float_cmp,
    clippy::module_inception,
    clippy::new_without_default,
    clippy::type_complexity,
    clippy::upper_case_acronyms
)]

//! Flare is a collection of runnable demonstrations of a query engine's
//! session, DataFrame, SQL, user-defined function and catalog APIs, together
//! with a connector that moves tables between the engine and a relational
//! database.
//!
//! Every demo in [`demos`] is a short, linear sequence of calls into
//! [DataFusion](https://github.com/apache/datafusion). The rest of the crate
//! holds the small amount of glue those demos share.

pub mod catalog;
pub mod configs;
pub mod datagen;
pub mod demos;
pub mod error;
pub mod io;
pub mod jdbc;
pub mod prelude;
pub mod server;
pub mod session;
pub mod udf;
