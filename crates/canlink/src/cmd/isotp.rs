use canlink_session::{default_isotp_payload, Outgoing};
use canlink_transport::{ChannelConfig, FlowControl};

use crate::cmd::session::run_session;
use crate::cmd::IsoTpArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: IsoTpArgs, format: OutputFormat) -> CliResult<i32> {
    let outgoing = match args.session.payload()? {
        Some(payload) => Outgoing::isotp(payload),
        None => Outgoing::isotp(default_isotp_payload()),
    };

    let channel = ChannelConfig::isotp(args.tx_id, args.rx_id).with_flow_control(FlowControl {
        block_size: args.block_size,
        st_min: args.stmin,
        wft_max: args.wft_max,
    });

    run_session(&args.link, &args.session, channel, outgoing, format)
}
