mod cmd;
mod exit;
mod link;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

/// Send a payload at a fixed interval on a SocketCAN interface while
/// printing everything received, until Ctrl-C.
///
/// `raw` splits the payload into 8-byte frames on one 11-bit identifier.
/// `isotp` hands it to the kernel ISO-TP stack as one message between a
/// transmit and a receive identifier.
#[derive(Parser, Debug)]
#[command(name = "canlink", version)]
struct Cli {
    /// Output format for received frames and the session summary
    /// (table on a terminal, JSON otherwise).
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Format of transmit and receive task logs on stderr.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level; `debug` shows every frame sent and received.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_describes_both_modes() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("SocketCAN"));
        assert!(help.contains("ISO-TP"));
        assert!(help.contains("8-byte frames"));
    }

    #[test]
    fn parses_raw_subcommand_with_defaults() {
        let cli = Cli::try_parse_from(["canlink", "raw", "--interface", "vcan0"])
            .expect("raw args should parse");

        let Command::Raw(args) = cli.command else {
            panic!("expected raw command");
        };
        assert_eq!(args.link.interface, "vcan0");
        assert_eq!(args.id, 0x123);
        assert_eq!(args.filter, None);
        assert!(!args.no_filter);
        assert_eq!(args.session.interval, "1s");
    }

    #[test]
    fn parses_isotp_subcommand() {
        let cli = Cli::try_parse_from([
            "canlink",
            "isotp",
            "--tx-id",
            "0x7E8",
            "--rx-id",
            "0x7E0",
            "--block-size",
            "0",
            "--strategy",
            "blocking",
        ])
        .expect("isotp args should parse");

        let Command::IsoTp(args) = cli.command else {
            panic!("expected isotp command");
        };
        assert_eq!((args.tx_id, args.rx_id), (0x7E8, 0x7E0));
        assert_eq!((args.block_size, args.stmin, args.wft_max), (0, 5, 0));
        assert!(matches!(args.session.strategy, cmd::StrategyArg::Blocking));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from(["canlink", "raw", "--data", "hello", "--hex", "0102"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_filter_with_no_filter() {
        let err = Cli::try_parse_from(["canlink", "raw", "--filter", "0x456", "--no-filter"])
            .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn sudo_requires_bitrate() {
        let err = Cli::try_parse_from(["canlink", "raw", "--sudo"])
            .expect_err("--sudo alone should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
