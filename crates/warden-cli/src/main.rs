use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use warden_cli::{commands, logging, LogFormat, WardenConfig};

fn cli() -> Command {
    Command::new("warden")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify and inspect Warden evidence bundles")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a warden.toml configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter directive (overrides the config file)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify an exported evidence bundle")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Bundle file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a bundle and its hash chain")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Bundle file"),
                ),
        )
        .subcommand(
            Command::new("hash")
                .about("Canonical SHA-256 of a JSON document")
                .arg(
                    Arg::new("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file (stdin when omitted)"),
                )
                .arg(
                    Arg::new("canonical")
                        .long("canonical")
                        .action(ArgAction::SetTrue)
                        .help("Also print the canonical encoding"),
                ),
        )
}

fn run() -> anyhow::Result<bool> {
    let matches = cli().get_matches();

    let mut config = WardenConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log.level.clone_from(level);
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.log.format = format.parse::<LogFormat>().map_err(anyhow::Error::msg)?;
    }
    logging::init(&config.log);

    let mut stdout = std::io::stdout().lock();
    match matches.subcommand() {
        Some(("verify", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .ok_or_else(|| anyhow::anyhow!("missing bundle path"))?;
            commands::verify(path, args.get_flag("json"), &mut stdout)
        }
        Some(("inspect", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .ok_or_else(|| anyhow::anyhow!("missing bundle path"))?;
            commands::inspect(path, &config.evidence, &mut stdout)
        }
        Some(("hash", args)) => commands::hash(
            args.get_one::<PathBuf>("path").map(PathBuf::as_path),
            args.get_flag("canonical"),
            &mut stdout,
        ),
        _ => Err(anyhow::anyhow!("no subcommand given")),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["warden", "verify", "b.json", "--json", "--log-level", "debug"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("log-level").map(String::as_str), Some("debug"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "verify");
        assert!(args.get_flag("json"));
    }
}
