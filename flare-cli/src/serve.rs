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

//! `serve`: exposes a session to remote SQL clients until Ctrl-C.

use anyhow::{anyhow, Context as _, Result};
use clap::{Arg, ArgMatches, Command};
use flare::configs::FlareConfig;
use flare::demos;
use flare::session::{Session, SessionBuilder};
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

lazy_static! {
    static ref CTC_BOOL: Arc<AtomicBool> = {
        let b = Arc::new(AtomicBool::new(false));
        let r = b.clone();
        ctrlc::set_handler(move || {
            r.store(true, Ordering::SeqCst);
        })
        .expect("Error setting Ctrl-C handler");
        b
    };
}

/// The `--host` and `--port` arguments read by [`address`].
pub fn listen_args() -> [Arg<'static>; 2] {
    [
        Arg::new("host")
            .long("host")
            .help("Address to listen on [default: [server] host]")
            .takes_value(true),
        Arg::new("port")
            .short('p')
            .long("port")
            .help("Port to listen on [default: [server] port]")
            .takes_value(true),
    ]
}

pub fn command_args() -> Command<'static> {
    Command::new("serve")
        .about("Serves SQL over TCP until Ctrl-C")
        .args(listen_args())
}

/// The `host:port` to listen on.
pub fn address(matches: &ArgMatches, conf: &FlareConfig) -> Result<String> {
    let host = match matches.value_of("host") {
        Some(host) => host.to_owned(),
        None => conf.get_str("server", "host")?,
    };
    let port: u16 = match matches.value_of("port") {
        Some(port) => port.parse().with_context(|| anyhow!("Invalid port"))?,
        None => conf.get_parsed("server", "port")?,
    };
    Ok(format!("{}:{}", host, port))
}

/// Serves `session` on the address of `matches` until Ctrl-C.
pub async fn serve_session(session: Session, matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let addr = address(matches, conf)?;
    let interval = conf.get_duration("server", "poll_interval")?;
    flare::udf::register_all(&session);

    demos::server::run(session, &addr, CTC_BOOL.clone(), interval)
        .await
        .with_context(|| anyhow!("serve command failed"))
}

pub async fn command(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let session = SessionBuilder::from_conf(conf)?.build()?;
    serve_session(session, matches, conf).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_address() -> Result<()> {
        let conf = FlareConfig::builtin();
        let matches = Command::new("test")
            .subcommand(command_args())
            .get_matches_from(["test", "serve", "-p", "4000"]);
        let (_, serve) = matches.subcommand().unwrap();
        assert_eq!("127.0.0.1:4000", address(serve, &conf)?);

        let matches = Command::new("test")
            .subcommand(command_args())
            .get_matches_from(["test", "serve", "-p", "http"]);
        let (_, serve) = matches.subcommand().unwrap();
        assert!(address(serve, &conf).is_err());
        Ok(())
    }
}
