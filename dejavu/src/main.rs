use colored::Colorize;
use commands::command_argument_builder;
use dejavu::handlers::{
    handle_classify, handle_config, handle_import, handle_init, handle_replay, handle_report,
    handle_reset, init_logging, print_banner,
};

mod commands;

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_logging(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("import", primary_command)) => handle_import(primary_command),
        Some(("classify", primary_command)) => handle_classify(primary_command),
        Some(("replay", primary_command)) => handle_replay(primary_command),
        Some(("reset", primary_command)) => handle_reset(primary_command),
        Some(("config", primary_command)) => handle_config(primary_command),
        Some(("report", primary_command)) => handle_report(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
