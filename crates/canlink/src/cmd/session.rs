use std::time::Duration;

use canlink_session::{Outgoing, SessionConfig};
use canlink_transport::ChannelConfig;

use crate::cmd::{LinkArgs, SessionArgs};
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

/// Open the channel, run both tasks until SIGINT/SIGTERM (or `--count`
/// deliveries), then print the summary.
#[cfg(target_os = "linux")]
pub fn run_session(
    link: &LinkArgs,
    args: &SessionArgs,
    channel: ChannelConfig,
    outgoing: Outgoing,
    format: OutputFormat,
) -> CliResult<i32> {
    use canlink_session::{LinkGuard, Session};

    use crate::exit::{session_error, SUCCESS};
    use crate::link::IpLink;
    use crate::output::{print_delivery, print_report};

    let config = session_config(args)?;

    // Dropped last, so the interface goes down after the channel is closed.
    let _link = link
        .bitrate
        .map(|bitrate| LinkGuard::up(IpLink::new(link.sudo), &link.interface, bitrate));

    let session = Session::open(&link.interface, channel, outgoing, config)
        .map_err(|err| session_error("channel setup failed", err))?;
    let running = session.running();
    install_ctrlc_handler(running.clone())?;

    let limit = args.count;
    let mut received = 0u64;
    let report = session
        .run(Box::new(move |delivery| {
            print_delivery(&delivery, format);
            received = received.saturating_add(1);
            if limit.is_some_and(|limit| received >= limit) {
                running.stop();
            }
        }))
        .map_err(|err| session_error("session failed", err))?;

    print_report(&report, format);
    Ok(SUCCESS)
}

#[cfg(not(target_os = "linux"))]
pub fn run_session(
    _link: &LinkArgs,
    args: &SessionArgs,
    _channel: ChannelConfig,
    _outgoing: Outgoing,
    _format: OutputFormat,
) -> CliResult<i32> {
    session_config(args)?;
    Err(CliError::new(
        crate::exit::TRANSPORT_ERROR,
        "SocketCAN is only available on Linux",
    ))
}

fn session_config(args: &SessionArgs) -> CliResult<SessionConfig> {
    Ok(SessionConfig::default()
        .with_strategy(args.strategy.into())
        .with_message_interval(parse_duration(&args.interval)?))
}

#[cfg(target_os = "linux")]
fn install_ctrlc_handler(running: canlink_session::RunningFlag) -> CliResult<()> {
    ctrlc::set_handler(move || running.stop()).map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
