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

//! fsql is a terminal-based SQL front-end to a Flare session.

use crate::rainbow::rainbow_println;
use anyhow::{anyhow, Result};
use flare::demos::server::register_views;
use flare::server::is_exit_command;
use flare::session::{collect_and_show, Session};
use rustyline::Editor;
use std::time::Instant;

/// The main entry point for fsql.
pub async fn fsql(session: Session) -> Result<()> {
    flare::udf::register_all(&session);
    register_views(&session)?;
    rainbow_println("Statements end with ';'. Try: SELECT * FROM ticks LIMIT 5;");

    let mut rl = Editor::<()>::new();
    rl.load_history(".history").ok();

    let mut query = "".to_owned();
    loop {
        let readline = rl.readline(if query.is_empty() { "> " } else { "| " });
        match readline {
            Ok(ref line) if is_exit_command(line) && query.is_empty() => {
                break;
            }
            Ok(ref line) if line.trim_end().ends_with(';') => {
                query.push_str(line.trim_end());
                rl.add_history_entry(query.clone());
                match exec_and_print(&session, &query).await {
                    Ok(_) => {}
                    Err(err) => println!("{}", err),
                }
                query = "".to_owned();
            }
            Ok(ref line) => {
                query.push_str(line);
                query.push(' ');
            }
            Err(_) => {
                break;
            }
        }
    }

    rl.save_history(".history").map_err(|err| anyhow!(err))
}

async fn exec_and_print(session: &Session, query: &str) -> Result<()> {
    let now = Instant::now();
    let sql = query.trim_end_matches(';');
    let batches = collect_and_show(session.sql(sql).await?).await?;
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    println!(
        "{} row(s) in set. Query took {:.3} seconds.",
        rows,
        now.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn executes_statements() -> Result<()> {
        let session = Session::builder().build()?;
        register_views(&session)?;
        exec_and_print(&session, "SELECT COUNT(*) FROM ticks;").await?;
        assert!(exec_and_print(&session, "SELEC 1;").await.is_err());
        Ok(())
    }
}
