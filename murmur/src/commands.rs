use clap::{arg, value_parser};
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("murmur")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("murmur")
        .about("Depth-bounded crawler with content clustering and propagation scoring")
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help("Path to the crawl job config (JSON)")
                .value_parser(value_parser!(PathBuf))
                .default_value("crawler_config.json"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Where to write the result artifact")
                .value_parser(value_parser!(PathBuf))
                .default_value("crawler_results.json"),
        )
        .arg(
            arg!(-b --"base-dir" <PATH>)
                .required(false)
                .help("Directory that receives per-run content directories")
                .value_parser(value_parser!(PathBuf))
                .default_value("./crawled_data"),
        )
        .arg(
            arg!(-d --"depth" <N>)
                .required(false)
                .help("Override the crawl depth from the config")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-s --"score")
                .required(false)
                .help("Enable anomaly scoring even if the config leaves it off"),
        )
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
}
