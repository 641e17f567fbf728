use std::ffi::CString;
use std::io::{self, Read};
use std::mem::size_of;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use socketcan::{CanAddr, StandardId};
use tracing::{debug, info};

use crate::config::{ChannelConfig, ChannelMode, FilterMode, FlowControl};
use crate::error::{Result, SetupStage, TransportError};
use crate::traits::CanIo;

/// An open, bound SocketCAN endpoint.
///
/// Created fully configured by [`CanSocket::open`]; the configuration is never
/// touched again. `send`/`recv` take `&self` so a transmitter and a receiver
/// can share one socket behind an `Arc`. The descriptor is closed when the
/// last owner drops it.
pub struct CanSocket {
    socket: Socket,
    interface: String,
    index: u32,
    mode: ChannelMode,
}

impl CanSocket {
    /// Open and configure a channel on `interface`.
    ///
    /// Steps run in order and the first failure aborts setup, closing the
    /// socket: allocate, size the receive buffer, install the raw filter and
    /// disable loopback (raw) or install flow control (ISO-TP), apply the read
    /// timeout, resolve the interface index, bind.
    pub fn open(interface: &str, config: &ChannelConfig) -> Result<Self> {
        let c_name = interface_cstring(interface)?;
        config.validate()?;

        let (kind, protocol) = match config.mode {
            ChannelMode::Raw { .. } => (Type::from(libc::SOCK_RAW), libc::CAN_RAW),
            ChannelMode::IsoTp { .. } => (Type::DGRAM, libc::CAN_ISOTP),
        };
        let socket = Socket::new(
            Domain::from(libc::AF_CAN),
            kind,
            Some(Protocol::from(protocol)),
        )
        .map_err(|err| setup_error(SetupStage::Socket, interface, err))?;

        socket
            .set_recv_buffer_size(config.receive_buffer_size)
            .map_err(|err| setup_error(SetupStage::ReceiveBuffer, interface, err))?;
        debug!(interface, size = config.receive_buffer_size, "receive buffer sized");

        match config.mode {
            ChannelMode::Raw { filter } => {
                apply_filter(&socket, filter)
                    .map_err(|err| setup_error(SetupStage::Filter, interface, err))?;
                let loopback = libc::c_int::from(!config.suppress_loopback);
                set_option(&socket, libc::SOL_CAN_RAW, libc::CAN_RAW_LOOPBACK, &loopback)
                    .map_err(|err| setup_error(SetupStage::Loopback, interface, err))?;
                debug!(interface, ?filter, loopback, "raw filter and loopback configured");
            }
            ChannelMode::IsoTp { flow_control, .. } => {
                let opts = can_isotp_fc_options::from(flow_control);
                set_option(&socket, SOL_CAN_ISOTP, CAN_ISOTP_RECV_FC, &opts)
                    .map_err(|err| setup_error(SetupStage::FlowControl, interface, err))?;
                debug!(interface, ?flow_control, "iso-tp flow control installed");
            }
        }

        if let Some(timeout) = config.read_timeout {
            socket
                .set_read_timeout(Some(timeout))
                .map_err(|err| setup_error(SetupStage::ReadTimeout, interface, err))?;
        }

        // SAFETY: `c_name` is a valid NUL-terminated string.
        let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if index == 0 {
            return Err(setup_error(
                SetupStage::InterfaceIndex,
                interface,
                io::Error::last_os_error(),
            ));
        }

        let addr = match config.mode {
            ChannelMode::Raw { .. } => CanAddr::new(index),
            ChannelMode::IsoTp { tx_id, rx_id, .. } => {
                CanAddr::from_iface_isotp(interface, standard_id(rx_id)?, standard_id(tx_id)?)
                    .map_err(|err| setup_error(SetupStage::InterfaceIndex, interface, err))?
            }
        };
        socket
            .bind(&addr.into_sock_addr())
            .map_err(|err| setup_error(SetupStage::Bind, interface, err))?;

        info!(interface, index, mode = config.mode.name(), "CAN channel open");

        Ok(Self {
            socket,
            interface: interface.to_string(),
            index,
            mode: config.mode,
        })
    }

    /// Interface name this socket is bound to.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Kernel interface index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self.mode {
            ChannelMode::Raw { .. } => "socketcan-raw",
            ChannelMode::IsoTp { .. } => "socketcan-isotp",
        }
    }
}

impl CanIo for CanSocket {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.socket.send(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match (&self.socket).read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pfd` is a single valid pollfd.
        let rc = unsafe { libc::poll(&mut pfd, 1, poll_millis(timeout)) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            // A signal during the wait is treated like a timeout so the caller
            // re-checks its running flag.
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(rc > 0 && pfd.revents & (libc::POLLIN | libc::POLLERR) != 0)
    }
}

impl AsRawFd for CanSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl AsFd for CanSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl Drop for CanSocket {
    fn drop(&mut self) {
        debug!(interface = %self.interface, "closing CAN channel");
    }
}

impl std::fmt::Debug for CanSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanSocket")
            .field("interface", &self.interface)
            .field("index", &self.index)
            .field("type", &self.transport_name())
            .finish()
    }
}

/// Validate an interface name and convert it for the kernel.
pub fn interface_cstring(name: &str) -> Result<CString> {
    let invalid = |reason| TransportError::InterfaceName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.len() >= libc::IFNAMSIZ {
        return Err(invalid("longer than IFNAMSIZ - 1"));
    }
    CString::new(name).map_err(|_| invalid("contains a NUL byte"))
}

fn setup_error(stage: SetupStage, interface: &str, source: io::Error) -> TransportError {
    debug!(interface, %stage, error = %source, "channel setup aborted");
    TransportError::Setup {
        stage,
        interface: interface.to_string(),
        source,
    }
}

fn standard_id(id: u32) -> Result<StandardId> {
    u16::try_from(id)
        .ok()
        .and_then(StandardId::new)
        .ok_or_else(|| {
            TransportError::InvalidConfig(format!("0x{id:X} is not an 11-bit identifier"))
        })
}

/// Poll timeout in whole milliseconds, rounded up so a sub-millisecond wait
/// still sleeps instead of returning at once.
fn poll_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_nanos().div_ceil(1_000_000);
    millis.min(libc::c_int::MAX as u128) as libc::c_int
}

fn set_option<T>(
    socket: &Socket,
    level: libc::c_int,
    name: libc::c_int,
    value: &T,
) -> io::Result<()> {
    // SAFETY: `value` points to a live `T` and the length passed is its size.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            level,
            name,
            (value as *const T).cast::<libc::c_void>(),
            size_of::<T>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn apply_filter(socket: &Socket, filter: FilterMode) -> io::Result<()> {
    match filter {
        FilterMode::Only(rule) => {
            let rules = [libc::can_filter {
                can_id: rule.id,
                can_mask: rule.mask,
            }];
            set_option(socket, libc::SOL_CAN_RAW, libc::CAN_RAW_FILTER, &rules)
        }
        // An empty filter list clears all filters.
        FilterMode::AcceptAll => {
            let rules: [libc::can_filter; 0] = [];
            set_option(socket, libc::SOL_CAN_RAW, libc::CAN_RAW_FILTER, &rules)
        }
    }
}

// Not exported by libc.
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
struct can_isotp_fc_options {
    bs: u8,
    stmin: u8,
    wftmax: u8,
}

impl From<FlowControl> for can_isotp_fc_options {
    fn from(fc: FlowControl) -> Self {
        Self {
            bs: fc.block_size,
            stmin: fc.st_min,
            wftmax: fc.wft_max,
        }
    }
}

const SOL_CAN_ISOTP: libc::c_int = libc::SOL_CAN_BASE + libc::CAN_ISOTP;
const CAN_ISOTP_RECV_FC: libc::c_int = 2;
