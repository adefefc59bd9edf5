use crate::CLAP_STYLING;
use clap::{Arg, ArgAction, arg, command};
use dejavu_engine::Toggle;
use std::path::PathBuf;

fn toggle_names() -> String {
    Toggle::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn db_arg() -> Arg {
    arg!(-d --"db" <PATH>)
        .required(false)
        .help("Path to the history database (default: ~/.config/dejavu/dejavu.db)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn settings_args() -> [Arg; 3] {
    [
        arg!(-s --"settings" <PATH>)
            .required(false)
            .help("Settings file to load (default: ~/.config/dejavu/settings.json)")
            .value_parser(clap::value_parser!(PathBuf)),
        arg!(-e --"enable" <TOGGLE>)
            .required(false)
            .help(format!("Turn a comparison toggle on. One of: {}", toggle_names()))
            .value_parser(clap::value_parser!(Toggle))
            .action(ArgAction::Append),
        arg!(-x --"disable" <TOGGLE>)
            .required(false)
            .help("Turn a comparison toggle off. Applied after --enable")
            .value_parser(clap::value_parser!(Toggle))
            .action(ArgAction::Append),
    ]
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("dejavu")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("dejavu")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log each classification decision").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the dejavu database and settings on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the dejavu database and settings")
                        .default_value("~/.config/dejavu/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help(
                            "Forces the overwriting of any existing database and settings at the \
                        specified location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("import")
                .about("Appends a JSON-lines capture file to the stored history")
                .arg(
                    arg!(<FILE>)
                        .help("Capture file, one request per line")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(db_arg()),
        )
        .subcommand(
            command!("classify")
                .about(
                    "Classifies a capture file in order, as if the requests were arriving live, \
                and prints each one highlighted",
                )
                .arg(
                    arg!(<FILE>)
                        .help("Capture file, one request per line")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .args(settings_args()),
        )
        .subcommand(
            command!("replay")
                .about("Re-highlights every stored request from scratch with the current settings")
                .arg(db_arg())
                .args(settings_args()),
        )
        .subcommand(
            command!("reset")
                .about("Forgets every stored highlight. The request history itself is kept")
                .arg(db_arg()),
        )
        .subcommand(
            command!("config")
                .about("Shows the effective comparison settings")
                .args(settings_args())
                .arg(
                    arg!(-w --"write")
                        .required(false)
                        .help("Persist the effective settings to the settings file")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("report")
                .about("Summarizes the stored highlights")
                .arg(db_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}
