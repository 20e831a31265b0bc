use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("snapsite")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("snapsite")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("mirror")
                .about(
                    "Download a complete static copy of a website: every in-domain page and \
                asset, with links rewritten to relative local paths.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to mirror (https:// is assumed if no scheme is given)"),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Output directory (default: derived from the seed host)"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async fetch workers in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"delay" <MILLIS>)
                        .required(false)
                        .help("Politeness delay between requests, per worker")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"max-pages" <NUM>)
                        .required(false)
                        .help("Stop after this many URLs (bounds crawls of pathological sites)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"include-subdomains")
                        .required(false)
                        .help(
                            "Treat subdomains of the seed host (and the www. prefix) as \
                        in-domain (default: exact host only)",
                        )
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"user-agent" <STRING>)
                        .required(false)
                        .help("Override the User-Agent header sent with every request"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"report" <PATH>)
                        .required(false)
                        .help("Save the run report to a file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
