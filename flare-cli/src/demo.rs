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

//! Subcommands that run one demo each, plus `gen` to write the sample
//! datasets the demos read.

use crate::serve;
use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Arg, ArgMatches, Command};
use flare::configs::FlareConfig;
use flare::datagen::{
    daily_stock, write_daily_stock_parquet, write_people_csv, write_stock_csv, write_students,
    write_words,
};
use flare::demos;
use flare::jdbc::{JdbcOptions, JdbcPartitioning};
use flare::session::{Session, SessionBuilder};
use log::info;
use std::path::PathBuf;

/// Names of the subcommands handled by [`command`].
pub const DEMOS: [&str; 9] = [
    "wordcount",
    "stock",
    "ticks",
    "udf",
    "catalog",
    "jdbc",
    "formats",
    "inspect",
    "gen",
];

fn input_arg(help: &'static str) -> Arg<'static> {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("PATH")
        .help(help)
        .takes_value(true)
}

fn output_arg(help: &'static str) -> Arg<'static> {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("DIR")
        .help(help)
        .takes_value(true)
}

pub fn command_args() -> Vec<Command<'static>> {
    vec![
        Command::new("wordcount")
            .about("Counts the words of a text file or directory")
            .arg(input_arg("Text file or directory [default: [datasets] words]"))
            .arg(
                Arg::new("dataframe")
                    .short('d')
                    .long("dataframe")
                    .help("Uses the DataFrame API instead of SQL"),
            ),
        Command::new("stock")
            .about("Finds the date ranges of unchanged stock per store and product")
            .arg(input_arg("Daily stock parquet directory [default: [datasets] daily_stocks]"))
            .arg(
                Arg::new("dataframe")
                    .short('d')
                    .long("dataframe")
                    .help("Uses the DataFrame API instead of SQL"),
            ),
        Command::new("ticks")
            .about("Computes the intervals between stock ticks with window functions")
            .arg(input_arg("Stock tick CSV file [default: [datasets] stocks]")),
        Command::new("udf")
            .about("Registers user-defined functions and calls them")
            .arg(input_arg("People CSV file [default: [datasets] people]"))
            .arg(
                Arg::new("stocks")
                    .long("stocks")
                    .value_name("FILE")
                    .help("Stock tick CSV file [default: [datasets] stocks]")
                    .takes_value(true),
            ),
        Command::new("catalog")
            .about("Creates, lists, fills and drops databases and tables")
            .arg(input_arg("Student files directory [default: [datasets] students]"))
            .arg(
                Arg::new("serve")
                    .long("serve")
                    .help("Serves the session over TCP after the tour until Ctrl-C"),
            )
            .args(serve::listen_args()),
        jdbc_args(),
        Command::new("formats")
            .about("Converts a CSV file to parquet, CSV and JSON and queries the copy")
            .arg(input_arg("People CSV file [default: [datasets] people]"))
            .arg(output_arg("Output directory [default: [datasets] output]")),
        Command::new("inspect")
            .about("Prints the schema and the first rows of a local or remote CSV file")
            .arg(input_arg("CSV file or http(s) URL [default: [datasets] people]"))
            .arg(
                Arg::new("no-header")
                    .long("no-header")
                    .help("The first line is data, not column names"),
            )
            .arg(
                Arg::new("limit")
                    .short('n')
                    .long("limit")
                    .help("Rows to show")
                    .takes_value(true)
                    .default_value("5"),
            ),
        Command::new("gen")
            .about("Writes the sample datasets to the configured paths")
            .arg(
                Arg::new("lines")
                    .long("lines")
                    .help("Lines of sample text")
                    .takes_value(true)
                    .default_value("1000"),
            )
            .arg(
                Arg::new("ticks")
                    .long("ticks")
                    .help("Ticks per stock symbol")
                    .takes_value(true)
                    .default_value("100"),
            )
            .arg(
                Arg::new("days")
                    .long("days")
                    .help("Days of stock per store and product")
                    .takes_value(true)
                    .default_value("90"),
            )
            .arg(
                Arg::new("seed")
                    .long("seed")
                    .help("Seed of the random generators")
                    .takes_value(true)
                    .default_value("2021"),
            ),
    ]
}

fn jdbc_args() -> Command<'static> {
    let value = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).help(help).takes_value(true)
    };
    Command::new("jdbc")
        .about("Copies a database table to another table through the engine")
        .arg(value("url", "Database URL [default: [jdbc] url]"))
        .arg(value("dbtable", "Source table or subquery [default: [jdbc] dbtable]"))
        .arg(value("target", "Target table [default: [jdbc] target_table]"))
        .arg(value("user", "Database user [default: [jdbc] user]"))
        .arg(value("password", "Database password [default: [jdbc] password]"))
        .arg(value("partition-column", "Numeric column to split the read on"))
        .arg(value("lower-bound", "Lower bound of the partition stride").default_value("0"))
        .arg(value("upper-bound", "Upper bound of the partition stride").default_value("1000"))
        .arg(value("num-partitions", "Number of concurrent range queries").default_value("4"))
}

fn path_or_dataset(matches: &ArgMatches, arg: &str, conf: &FlareConfig, dataset: &str) -> Result<String> {
    let path = match matches.value_of(arg) {
        Some(path) => PathBuf::from(path),
        None => conf.dataset(dataset)?,
    };
    Ok(path.to_string_lossy().into_owned())
}

fn parse<T>(matches: &ArgMatches, arg: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(arg)
        .ok_or_else(|| anyhow!("missing value for --{}", arg))?
        .parse::<T>()
        .with_context(|| anyhow!("Invalid {}", arg))
}

fn session(conf: &FlareConfig) -> Result<Session> {
    Ok(SessionBuilder::from_conf(conf)?.build()?)
}

/// Runs the demo named `name`.
pub async fn command(name: &str, matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    match name {
        "wordcount" => wordcount(matches, conf).await,
        "stock" => stock(matches, conf).await,
        "ticks" => ticks(matches, conf).await,
        "udf" => udf(matches, conf).await,
        "catalog" => catalog(matches, conf).await,
        "jdbc" => jdbc(matches, conf).await,
        "formats" => formats(matches, conf).await,
        "inspect" => inspect(matches, conf).await,
        "gen" => gen(matches, conf),
        _ => bail!("unknown demo {}", name),
    }
    .with_context(|| anyhow!("{} command failed", name))
}

async fn wordcount(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let input = path_or_dataset(matches, "input", conf, "words")?;
    let session = session(conf)?;
    if matches.is_present("dataframe") {
        demos::wordcount::run_dataframe(&session, &input).await?;
    } else {
        demos::wordcount::run(&session, &input).await?;
    }
    Ok(())
}

async fn stock(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let input = path_or_dataset(matches, "input", conf, "daily_stocks")?;
    let session = session(conf)?;
    if matches.is_present("dataframe") {
        demos::stock::run_dataframe(&session, &input).await?;
    } else {
        demos::stock::run(&session, &input).await?;
    }
    Ok(())
}

async fn ticks(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let input = path_or_dataset(matches, "input", conf, "stocks")?;
    let session = session(conf)?;
    demos::ticks::run(&session, &input).await?;
    demos::ticks::summary(&session).await?;
    Ok(())
}

async fn udf(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let people = path_or_dataset(matches, "input", conf, "people")?;
    let stocks = path_or_dataset(matches, "stocks", conf, "stocks")?;
    let session = session(conf)?;
    demos::udf::run(&session).await?;
    demos::udf::people(&session, &people).await?;
    demos::udf::people_dataframe(&session, &people).await?;
    demos::udf::price_changes(&session, &stocks).await?;
    Ok(())
}

async fn catalog(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let students = path_or_dataset(matches, "input", conf, "students")?;
    let session = session(conf)?;
    demos::catalog::run(&session, &students).await?;
    if matches.is_present("serve") {
        serve::serve_session(session, matches, conf).await?;
    }
    Ok(())
}

fn jdbc_options(matches: &ArgMatches, conf: &FlareConfig) -> Result<JdbcOptions> {
    let mut options = JdbcOptions::from_conf(conf)?;
    if let Some(url) = matches.value_of("url") {
        options.url = url.to_owned();
    }
    if let Some(dbtable) = matches.value_of("dbtable") {
        options.dbtable = dbtable.to_owned();
    }
    if let Some(user) = matches.value_of("user") {
        options.user = Some(user.to_owned());
    }
    if let Some(password) = matches.value_of("password") {
        options.password = Some(password.to_owned());
    }
    if let Some(column) = matches.value_of("partition-column") {
        options = options.with_partitioning(JdbcPartitioning::new(
            column,
            parse(matches, "lower-bound")?,
            parse(matches, "upper-bound")?,
            parse(matches, "num-partitions")?,
        ));
    }
    Ok(options)
}

async fn jdbc(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let options = jdbc_options(matches, conf)?;
    let target = match matches.value_of("target") {
        Some(target) => target.to_owned(),
        None => conf.get_str("jdbc", "target_table")?,
    };
    demos::jdbc::run(&session(conf)?, &options, &target).await?;
    Ok(())
}

async fn formats(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let input = path_or_dataset(matches, "input", conf, "people")?;
    let output = path_or_dataset(matches, "output", conf, "output")?;
    demos::formats::run(&session(conf)?, &input, &output).await?;
    Ok(())
}

async fn inspect(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let input = path_or_dataset(matches, "input", conf, "people")?;
    let limit: usize = parse(matches, "limit")?;
    let has_header = !matches.is_present("no-header");
    demos::formats::inspect(&session(conf)?, &input, has_header, limit).await?;
    Ok(())
}

fn gen(matches: &ArgMatches, conf: &FlareConfig) -> Result<()> {
    let lines: usize = parse(matches, "lines")?;
    let ticks: usize = parse(matches, "ticks")?;
    let days: usize = parse(matches, "days")?;
    let seed: u64 = parse(matches, "seed")?;

    write_words(conf.dataset("words")?, lines)?;
    write_stock_csv(conf.dataset("stocks")?, &["AAPL", "AMZN", "GOOG", "MSFT"], ticks, seed)?;
    write_daily_stock_parquet(conf.dataset("daily_stocks")?, &daily_stock(3, 4, days, seed))?;
    write_people_csv(conf.dataset("people")?)?;
    write_students(conf.dataset("students")?)?;
    info!("Sample datasets written");
    Ok(())
}
