use clap::{Args, Subcommand, ValueEnum};

use canlink_session::ReceiveStrategy;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod isotp;
pub mod raw;
mod session;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange raw 8-byte CAN frames.
    Raw(RawArgs),
    /// Exchange kernel-segmented ISO-TP messages.
    #[command(name = "isotp")]
    IsoTp(IsoTpArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Raw(args) => raw::run(args, format),
        Command::IsoTp(args) => isotp::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Interface selection and optional bring-up.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// CAN interface name.
    #[arg(long, short = 'i', default_value = "can0", env = "CANLINK_INTERFACE")]
    pub interface: String,
    /// Bring the interface up at this bitrate before opening it, and down
    /// again on exit.
    #[arg(long)]
    pub bitrate: Option<u32>,
    /// Run interface bring-up through sudo.
    #[arg(long, requires = "bitrate")]
    pub sudo: bool,
}

/// Options shared by both session kinds.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// How the receiver waits for inbound traffic.
    #[arg(long, value_enum, default_value = "multiplexed")]
    pub strategy: StrategyArg,
    /// Pause between outgoing messages (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Text payload to send.
    #[arg(long, conflicts_with = "hex")]
    pub data: Option<String>,
    /// Hex payload to send (e.g. "01 02 0A" or 01020A).
    #[arg(long, conflicts_with = "data")]
    pub hex: Option<String>,
    /// Exit after receiving N frames or messages.
    #[arg(long)]
    pub count: Option<u64>,
}

impl SessionArgs {
    /// Payload from `--data`/`--hex`, if either was given.
    pub fn payload(&self) -> CliResult<Option<Vec<u8>>> {
        match (&self.data, &self.hex) {
            (Some(text), _) => Ok(Some(text.clone().into_bytes())),
            (None, Some(hex)) => parse_hex(hex).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Args, Debug)]
pub struct RawArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub session: SessionArgs,
    /// Identifier for outgoing frames.
    #[arg(long, default_value = "0x123", value_parser = parse_id)]
    pub id: u32,
    /// Only receive frames with this identifier. Default: the --id value.
    #[arg(long, value_parser = parse_id, conflicts_with = "no_filter")]
    pub filter: Option<u32>,
    /// Receive every frame on the bus.
    #[arg(long)]
    pub no_filter: bool,
    /// Let frames sent by this host reach local sockets.
    #[arg(long)]
    pub loopback: bool,
}

#[derive(Args, Debug)]
pub struct IsoTpArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub session: SessionArgs,
    /// Identifier this node transmits on.
    #[arg(long, default_value = "0x7E0", value_parser = parse_id)]
    pub tx_id: u32,
    /// Identifier this node receives on.
    #[arg(long, default_value = "0x7E8", value_parser = parse_id)]
    pub rx_id: u32,
    /// Flow-control block size (0 = unlimited).
    #[arg(long, default_value = "8")]
    pub block_size: u8,
    /// Flow-control minimum separation time (raw STmin byte).
    #[arg(long, default_value = "5")]
    pub stmin: u8,
    /// Maximum number of flow-control wait frames.
    #[arg(long, default_value = "0")]
    pub wft_max: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StrategyArg {
    Blocking,
    Multiplexed,
}

impl From<StrategyArg> for ReceiveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Blocking => ReceiveStrategy::Blocking,
            StrategyArg::Multiplexed => ReceiveStrategy::Multiplexed,
        }
    }
}

/// Parse a CAN identifier given as `0x7E0` or decimal.
fn parse_id(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid identifier: {input}"))
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("hex payload has an odd number of digits: {input}"),
        ));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex payload: {input}")))
        })
        .collect()
}
