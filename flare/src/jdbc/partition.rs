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

//! Splitting a table read into partitions over a numeric column.

use crate::error::{FlareError, Result};

/// Reads a table as `num_partitions` range queries over `column`.
///
/// The bounds only decide the stride, they do not filter rows: the first
/// partition also takes every value below `lower_bound` and NULLs, the last
/// one every value from its start upwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdbcPartitioning {
    /// A numeric column of the table.
    pub column:         String,
    /// Lower bound of the stride computation.
    pub lower_bound:    i64,
    /// Upper bound of the stride computation.
    pub upper_bound:    i64,
    /// Requested number of partitions.
    pub num_partitions: usize,
}

impl JdbcPartitioning {
    /// Creates a partitioning.
    pub fn new<T: Into<String>>(
        column: T,
        lower_bound: i64,
        upper_bound: i64,
        num_partitions: usize,
    ) -> Self {
        Self {
            column: column.into(),
            lower_bound,
            upper_bound,
            num_partitions,
        }
    }

    /// Returns one WHERE predicate per partition. A single partition reads
    /// the whole table and has no predicate.
    pub fn predicates(&self) -> Result<Vec<Option<String>>> {
        if self.num_partitions == 0 {
            return Err(FlareError::Config(
                "the number of partitions must be positive".to_owned(),
            ));
        }
        if self.num_partitions == 1 {
            return Ok(vec![None]);
        }
        if self.lower_bound >= self.upper_bound {
            return Err(FlareError::Config(format!(
                "lower bound {} must be smaller than upper bound {}",
                self.lower_bound, self.upper_bound
            )));
        }

        // never more partitions than values in the range
        let range = (self.upper_bound as i128 - self.lower_bound as i128) as u128;
        let partitions = (self.num_partitions as u128).min(range) as i64;
        let stride = self.upper_bound / partitions - self.lower_bound / partitions;

        let column = &self.column;
        let mut current = self.lower_bound;
        let mut predicates = Vec::with_capacity(partitions as usize);
        for i in 0..partitions {
            let lower = if i != 0 {
                Some(format!("{} >= {}", column, current))
            } else {
                None
            };
            let upper = if i != partitions - 1 {
                current += stride;
                Some(format!("{} < {}", column, current))
            } else {
                None
            };
            let predicate = match (lower, upper) {
                (None, Some(upper)) => format!("{} OR {} IS NULL", upper, column),
                (Some(lower), None) => lower,
                (Some(lower), Some(upper)) => format!("{} AND {}", lower, upper),
                (None, None) => unreachable!(),
            };
            predicates.push(Some(predicate));
        }
        Ok(predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_partitions() -> Result<()> {
        let partitioning = JdbcPartitioning::new("id", 0, 100, 4);
        assert_eq!(
            vec![
                Some("id < 25 OR id IS NULL".to_owned()),
                Some("id >= 25 AND id < 50".to_owned()),
                Some("id >= 50 AND id < 75".to_owned()),
                Some("id >= 75".to_owned()),
            ],
            partitioning.predicates()?
        );
        Ok(())
    }

    #[test]
    fn fewer_values_than_partitions() -> Result<()> {
        let partitioning = JdbcPartitioning::new("id", 10, 13, 8);
        let predicates = partitioning.predicates()?;
        assert_eq!(3, predicates.len());
        assert_eq!(Some("id >= 12".to_owned()), predicates[2]);
        Ok(())
    }

    #[test]
    fn bounds_near_the_integer_limits() -> Result<()> {
        let predicates = JdbcPartitioning::new("id", 2, i64::MAX, 3).predicates()?;
        assert_eq!(3, predicates.len());
        let stride = i64::MAX / 3 - 2 / 3;
        assert_eq!(Some(format!("id >= {}", 2 + 2 * stride)), predicates[2]);

        let predicates = JdbcPartitioning::new("id", i64::MIN, i64::MAX, 2).predicates()?;
        assert_eq!(2, predicates.len());
        Ok(())
    }

    #[test]
    fn single_and_invalid() -> Result<()> {
        assert_eq!(vec![None], JdbcPartitioning::new("id", 0, 0, 1).predicates()?);
        assert!(JdbcPartitioning::new("id", 5, 5, 2).predicates().is_err());
        assert!(JdbcPartitioning::new("id", 0, 10, 0).predicates().is_err());
        Ok(())
    }
}
