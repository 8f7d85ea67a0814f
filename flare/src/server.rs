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

//! Exposes a session to remote SQL clients over a line-based TCP protocol.
//!
//! A client sends SQL text; a statement ends at a `;` outside a quoted
//! string. It may span several lines, and a line may hold several
//! statements. Each statement is answered with its result as a text table and an
//! empty line, or with a single `ERROR: ...` line. `quit` or `exit` closes
//! the connection. All clients share the session, so views one client
//! registers are visible to the others.

use crate::error::Result;
use crate::session::Session;
use datafusion::arrow::util::pretty::pretty_format_batches;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Returns true if the line asks to end the session.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim().trim_end_matches(';').to_lowercase();
    line == "quit" || line == "exit"
}

/// A SQL endpoint bound to a local address.
pub struct SqlServer {
    session:  Session,
    listener: TcpListener,
}

impl SqlServer {
    /// Binds the endpoint; `127.0.0.1:0` picks a free port.
    pub async fn bind(session: Session, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("SQL server listening on {}", listener.local_addr()?);
        Ok(Self { session, listener })
    }

    /// The address clients connect to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts clients until the task is dropped. Each client is served on
    /// its own task.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("Client {} connected", peer);
            let session = self.session.clone();
            tokio::spawn(async move {
                match handle_client(session, stream).await {
                    Ok(()) => info!("Client {} disconnected", peer),
                    Err(e) => warn!("Client {} failed: {}", peer, e),
                }
            });
        }
    }
}

/// Splits `buffer` into the statements it completes and the unfinished
/// text after the last one. Empty statements are dropped.
pub fn split_statements(buffer: &str) -> (Vec<String>, String) {
    let mut statements = vec![];
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in buffer.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ';' if !quoted => {
                let statement = buffer[start..i].trim();
                if !statement.is_empty() {
                    statements.push(statement.to_owned());
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    (statements, buffer[start..].to_owned())
}

async fn handle_client(session: Session, stream: TcpStream) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut pending = String::new();

    while let Some(line) = lines.next_line().await? {
        if pending.trim().is_empty() && is_exit_command(&line) {
            break;
        }
        pending.push_str(&line);
        pending.push('\n');

        let (statements, rest) = split_statements(&pending);
        pending = rest;
        for sql in statements {
            debug!("Executing {}", sql);
            let reply = match execute(&session, &sql).await {
                Ok(table) => format!("{}\n\n", table),
                Err(e) => format!("ERROR: {}\n", e),
            };
            writer.write_all(reply.as_bytes()).await?;
        }
        writer.flush().await?;
    }
    Ok(())
}

async fn execute(session: &Session, sql: &str) -> Result<String> {
    let batches = session.sql_collect(sql).await?;
    Ok(pretty_format_batches(&batches)?.to_string())
}

/// Blocks the calling thread until `stop` is set, checking every `interval`.
pub fn keep_alive(stop: &AtomicBool, interval: Duration) {
    info!("Keeping the process alive, press Ctrl-C to stop");
    while !stop.load(Ordering::SeqCst) {
        thread::sleep(interval);
    }
    info!("Stop requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command(" EXIT; "));
        assert!(!is_exit_command("SELECT 'quit';"));
    }

    #[test]
    fn statements_of_a_buffer() {
        let (statements, rest) = split_statements("SELECT 1; SELECT 2;\nSELECT 'a;b'; ; SELECT\n 3");
        assert_eq!(vec!["SELECT 1", "SELECT 2", "SELECT 'a;b'"], statements);
        assert_eq!(" SELECT\n 3", rest);

        let (statements, rest) = split_statements("SELECT 'it''s';");
        assert_eq!(vec!["SELECT 'it''s'"], statements);
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn answers_queries_and_errors() -> Result<()> {
        let session = Session::builder().build()?;
        let server = SqlServer::bind(session, "127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        let handle = tokio::spawn(server.serve());

        let mut client = TcpStream::connect(addr).await?;
        client
            .write_all(b"SELECT 1\n AS one;\nSELECT * FROM nowhere; SELECT 2 AS two;\nquit\n")
            .await?;

        let mut reply = String::new();
        client.read_to_string(&mut reply).await?;
        assert!(reply.contains("| one |"));
        assert!(reply.contains("| 1   |"));
        assert!(reply.contains("ERROR:"));
        assert!(reply.contains("nowhere"));
        assert!(reply.contains("| two |"));

        handle.abort();
        Ok(())
    }

    #[test]
    fn keep_alive_returns_once_stopped() {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            flag.store(true, Ordering::SeqCst);
        });
        keep_alive(&stop, Duration::from_millis(5));
        assert!(stop.load(Ordering::SeqCst));
        setter.join().unwrap();
    }
}
