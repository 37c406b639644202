use clap::{Arg, ArgAction, Command};

mod commands;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("TOML configuration file (default: ./jira-relay.toml when present)")
}

fn debug_arg() -> Arg {
    Arg::new("debug")
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("Emit diagnostics for ignored and unknown events")
}

#[tokio::main]
async fn main() {
    let matches = Command::new("jira-relay")
        .version(VERSION)
        .about("Turn JIRA webhook events into chat messages")
        .subcommand(
            Command::new("transform")
                .about("Transform one JIRA webhook body and print the host response")
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .value_name("FILE")
                        .help("JSON body to read (default: stdin)"),
                )
                .arg(
                    Arg::new("channel")
                        .long("channel")
                        .value_name("CHANNEL")
                        .help("Post to this channel instead of the integration default"),
                )
                .arg(
                    Arg::new("envelope")
                        .long("envelope")
                        .action(ArgAction::SetTrue)
                        .help("Input is a host request {content, url: {query}} rather than a bare JIRA body"),
                )
                .arg(config_arg())
                .arg(debug_arg())
                .arg(
                    Arg::new("log-file")
                        .long("log-file")
                        .value_name("FILE")
                        .help("Append a JSON outcome line per request to this file"),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Pretty-print the response"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load, validate and print the effective configuration")
                .arg(config_arg())
                .arg(debug_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("transform", sub_matches)) => commands::transform::run(sub_matches).await,
        Some(("check-config", sub_matches)) => commands::check_config::run(sub_matches),
        _ => {
            println!("jira-relay v{}", VERSION);
            println!("Use --help for available commands");
        }
    }
}
