use canlink_session::{Outgoing, DEFAULT_RAW_PAYLOAD};
use canlink_transport::{ChannelConfig, FilterMode, FilterRule};

use crate::cmd::session::run_session;
use crate::cmd::RawArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: RawArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = args
        .session
        .payload()?
        .unwrap_or_else(|| DEFAULT_RAW_PAYLOAD.to_vec());

    let channel = ChannelConfig::raw(filter_mode(&args)).with_loopback(args.loopback);
    let outgoing = Outgoing::raw(args.id, payload);

    run_session(&args.link, &args.session, channel, outgoing, format)
}

fn filter_mode(args: &RawArgs) -> FilterMode {
    if args.no_filter {
        FilterMode::AcceptAll
    } else {
        FilterMode::Only(FilterRule::standard(args.filter.unwrap_or(args.id)))
    }
}
