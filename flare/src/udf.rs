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

//! User-defined scalar functions.
//!
//! [`closure_udf`] turns a plain Rust closure over Arrow arrays into a
//! function the engine can call from SQL and from DataFrame expressions. The
//! functions below are the ones the demos register.

use crate::session::Session;
use datafusion::arrow::array::{ArrayRef, Float64Array, Int64Array, ListBuilder, StringArray, StringBuilder};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field};
use datafusion::common::cast::{as_float64_array, as_string_array};
use datafusion::error::Result;
use datafusion::logical_expr::{ColumnarValue, ScalarUDF, ScalarUDFImpl, Signature, Volatility};
use itertools::Itertools;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// The body of a closure-backed function. Arguments arrive as arrays of the
/// same length, scalars already expanded.
pub type UdfBody = Arc<dyn Fn(&[ArrayRef]) -> Result<ArrayRef> + Send + Sync>;

struct ClosureUdf {
    name:        String,
    signature:   Signature,
    return_type: DataType,
    body:        UdfBody,
}

impl Debug for ClosureUdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureUdf")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl ScalarUDFImpl for ClosureUdf {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(self.return_type.clone())
    }

    fn invoke(&self, args: &[ColumnarValue]) -> Result<ColumnarValue> {
        let arrays = ColumnarValue::values_to_arrays(args)?;
        (self.body)(&arrays).map(ColumnarValue::Array)
    }
}

/// Wraps a closure into a scalar function.
///
/// # Arguments
/// * `name` - the name the function is called by in SQL.
/// * `signature` - the accepted argument types.
/// * `return_type` - the type of the array `body` returns.
/// * `body` - computes one output value per input row.
pub fn closure_udf<F>(name: &str, signature: Signature, return_type: DataType, body: F) -> ScalarUDF
where
    F: Fn(&[ArrayRef]) -> Result<ArrayRef> + Send + Sync + 'static,
{
    ScalarUDF::new_from_impl(ClosureUdf {
        name: name.to_owned(),
        signature,
        return_type,
        body: Arc::new(body),
    })
}

fn string_signature(arity: usize) -> Signature {
    Signature::uniform(
        arity,
        vec![DataType::Utf8, DataType::LargeUtf8, DataType::Utf8View],
        Volatility::Immutable,
    )
}

fn utf8(array: &ArrayRef) -> Result<ArrayRef> {
    Ok(cast(array, &DataType::Utf8)?)
}

/// `str_len(s)`: number of characters in `s`.
pub fn str_len() -> ScalarUDF {
    closure_udf("str_len", string_signature(1), DataType::Int64, |args| {
        let input = utf8(&args[0])?;
        let lengths: Int64Array = as_string_array(&input)?
            .iter()
            .map(|s| s.map(|s| s.chars().count() as i64))
            .collect();
        Ok(Arc::new(lengths) as ArrayRef)
    })
}

/// `to_upper(s)`: `s` in upper case.
pub fn to_upper() -> ScalarUDF {
    closure_udf("to_upper", string_signature(1), DataType::Utf8, |args| {
        let input = utf8(&args[0])?;
        let upper: StringArray = as_string_array(&input)?
            .iter()
            .map(|s| s.map(|s| s.to_uppercase()))
            .collect();
        Ok(Arc::new(upper) as ArrayRef)
    })
}

/// `pct_change(current, previous)`: relative change in percent. Null when
/// either side is null or `previous` is zero.
pub fn pct_change() -> ScalarUDF {
    closure_udf(
        "pct_change",
        Signature::exact(vec![DataType::Float64, DataType::Float64], Volatility::Immutable),
        DataType::Float64,
        |args| {
            let current = as_float64_array(&args[0])?;
            let previous = as_float64_array(&args[1])?;
            let change: Float64Array = current
                .iter()
                .zip(previous.iter())
                .map(|pair| match pair {
                    (Some(c), Some(p)) if p != 0.0 => Some((c - p) / p * 100.0),
                    _ => None,
                })
                .collect();
            Ok(Arc::new(change) as ArrayRef)
        },
    )
}

/// `snake_case(s)`: the words of `s` joined by underscores, each with its
/// first character in lower case. `"Hello Word"` becomes `"hello_word"`.
pub fn snake_case() -> ScalarUDF {
    closure_udf("snake_case", string_signature(1), DataType::Utf8, |args| {
        let input = utf8(&args[0])?;
        let snake: StringArray = as_string_array(&input)?
            .iter()
            .map(|s| {
                s.map(|s| {
                    s.split(' ')
                        .map(|word| {
                            let mut chars = word.chars();
                            match chars.next() {
                                Some(first) => first.to_lowercase().chain(chars).collect(),
                                None => String::new(),
                            }
                        })
                        .join("_")
                })
            })
            .collect();
        Ok(Arc::new(snake) as ArrayRef)
    })
}

/// Return type of [`split_words`].
pub fn word_list_type() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

/// `split_words(s)`: `s` split at every single space. Consecutive spaces
/// give empty words.
pub fn split_words() -> ScalarUDF {
    closure_udf("split_words", string_signature(1), word_list_type(), |args| {
        let input = utf8(&args[0])?;
        let mut builder = ListBuilder::new(StringBuilder::new());
        for line in as_string_array(&input)?.iter() {
            match line {
                Some(line) => {
                    line.split(' ').for_each(|w| builder.values().append_value(w));
                    builder.append(true);
                }
                None => builder.append(false),
            }
        }
        Ok(Arc::new(builder.finish()) as ArrayRef)
    })
}

/// Registers every function of this module in the session.
pub fn register_all(session: &Session) {
    session.register_udf(str_len());
    session.register_udf(to_upper());
    session.register_udf(pct_change());
    session.register_udf(snake_case());
    session.register_udf(split_words());
}
