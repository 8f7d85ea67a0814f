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

//! Serves a session with sample views to remote SQL clients until a stop
//! flag is set, for example from a Ctrl-C handler.

use crate::datagen::{stock_batch, stock_ticks};
use crate::error::{FlareError, Result};
use crate::server::{keep_alive, SqlServer};
use crate::session::Session;
use log::info;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Registers the `ticks` view of generated stock ticks.
pub fn register_views(session: &Session) -> Result<()> {
    let ticks = stock_ticks(&["AAPL", "AMZN", "MSFT"], 100, 2021);
    let df = session.context().read_batch(stock_batch(&ticks)?)?;
    session.register_dataframe("ticks", df)
}

/// Serves `session` on `addr` until `stop` is set, checking it every
/// `interval`.
pub async fn run(
    session: Session,
    addr: &str,
    stop: Arc<AtomicBool>,
    interval: Duration,
) -> Result<()> {
    register_views(&session)?;
    let server = SqlServer::bind(session, addr).await?;
    info!("Try: echo 'SELECT symbol, COUNT(*) FROM ticks GROUP BY symbol;' | nc {}", server.local_addr()?);

    let handle = tokio::spawn(server.serve());
    tokio::task::spawn_blocking(move || keep_alive(&stop, interval))
        .await
        .map_err(|e| FlareError::Internal(e.to_string()))?;
    handle.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::num_rows;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn ticks_view() -> Result<()> {
        let session = Session::builder().build()?;
        register_views(&session)?;
        let batches = session
            .sql_collect("SELECT symbol, COUNT(*) AS n FROM ticks GROUP BY symbol")
            .await?;
        assert_eq!(3, num_rows(&batches));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stops_when_flag_is_set() -> Result<()> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let session = Session::builder().build()?;
        run(session, "127.0.0.1:0", stop.clone(), Duration::from_millis(5)).await?;
        assert!(stop.load(Ordering::SeqCst));
        Ok(())
    }
}
