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

use crate::args::{get_args, get_config, get_logging};
use crate::demo;
use crate::fsql::fsql;
use crate::rainbow::{rainbow_println, BANNER};
use crate::serve;
use anyhow::Result;
use clap::{crate_version, Command};
use flare::session::SessionBuilder;

fn app() -> Command<'static> {
    Command::new("Flare")
        .version(crate_version!())
        .about("Command Line Interactive Controller for Flare")
        .author("UMD Database Group")
        .args(get_args())
        .subcommands(demo::command_args())
        .subcommand(serve::command_args())
        .subcommand(Command::new("fsql").about("The terminal-based SQL front-end to Flare"))
}

#[tokio::main]
pub async fn main() -> Result<()> {
    let mut app = app();
    let matches = app.get_matches_mut();

    let (name, sub_matches) = match matches.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            rainbow_println(BANNER);
            app.print_help()?;
            return Ok(());
        }
    };

    get_logging(&matches, sub_matches)?.init();
    let conf = get_config(sub_matches)?;
    if !sub_matches.is_present("silent") {
        rainbow_println(BANNER);
    }

    match name {
        "serve" => serve::command(sub_matches, &conf).await,
        "fsql" => fsql(SessionBuilder::from_conf(&conf)?.build()?).await,
        _ => demo::command(name, sub_matches, &conf).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rainbow_print() {
        rainbow_println(BANNER);
    }

    #[test]
    fn parses_subcommands() {
        app().debug_assert();

        let matches = app().get_matches_from(["flare-cli", "-L", "warn", "wordcount", "-d"]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!("wordcount", name);
        assert!(sub.is_present("dataframe"));
        assert_eq!(Some("warn"), sub.value_of("log-level"));

        assert!(app().try_get_matches_from(["flare-cli", "deploy"]).is_err());
    }
}
