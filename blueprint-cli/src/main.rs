use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod arguments;
mod command;
mod views;

use arguments::AddFlags;
use command::AddCommand;
use views::View;

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Generate resource configuration from provider schemas", long_about = None)]
struct Cli {
    /// Switch to this directory before running the command
    #[arg(long, global = true, value_name = "DIR")]
    chdir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a configuration template for a resource instance
    Add(AddFlags),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!(
                "{} Failed to parse command-line flags\n\n{}",
                "Error:".red().bold(),
                e.to_string().trim_end()
            );
            std::process::exit(1);
        }
    };

    if cli.no_color {
        colored::control::set_override(false);
    }

    let working_dir = match cli.chdir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{} Error determining current working directory: {}",
                    "Error:".red().bold(),
                    e
                );
                std::process::exit(1);
            }
        },
    };
    log::debug!("Working directory: {}", working_dir.display());

    let code = match cli.command {
        Commands::Add(flags) => AddCommand {
            view: View::stdio(cli.no_color),
            working_dir,
        }
        .run(&flags),
    };
    std::process::exit(code);
}

/// Rewrite single-dash long flags (`-optional`) to the double-dash form
///
/// Single-character flags like `-h` and everything after `--` are kept.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut after_separator = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || after_separator {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                after_separator = true;
                return arg;
            }
            let is_single_dash_long = text.starts_with('-')
                && !text.starts_with("--")
                && text[1..].split('=').next().is_some_and(|name| name.len() > 1);
            if is_single_dash_long {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().map(OsString::from))
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_normalize_single_dash_flags() {
        assert_eq!(
            normalize(&["blueprint", "add", "-optional", "-provider=happycorp/test", "test_instance.new"]),
            vec!["blueprint", "add", "--optional", "--provider=happycorp/test", "test_instance.new"]
        );
    }

    #[test]
    fn test_normalize_keeps_short_and_double_dash() {
        assert_eq!(
            normalize(&["blueprint", "add", "-h", "--defaults", "-"]),
            vec!["blueprint", "add", "-h", "--defaults", "-"]
        );
    }

    #[test]
    fn test_normalize_stops_at_separator() {
        assert_eq!(
            normalize(&["blueprint", "add", "--", "-weird"]),
            vec!["blueprint", "add", "--", "-weird"]
        );
    }

    #[test]
    fn test_cli_parses_add_flags() {
        let cli = Cli::try_parse_from(normalize(&[
            "blueprint",
            "-chdir=infra",
            "add",
            "-optional",
            "-defaults=false",
            "-out=new.tf",
            "test_instance.new",
        ]))
        .unwrap();

        assert_eq!(cli.chdir, Some(PathBuf::from("infra")));
        let Commands::Add(flags) = cli.command;
        assert!(flags.optional);
        assert!(!flags.defaults);
        assert_eq!(flags.out, Some(PathBuf::from("new.tf")));
        assert_eq!(flags.addresses, vec!["test_instance.new".to_string()]);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(normalize(&["blueprint", "add", "-bogus", "a.b"])).is_err());
    }
}
