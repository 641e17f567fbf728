use std::io;
use std::process::Command;

use canlink_session::InterfaceControl;
use tracing::debug;

/// Configures CAN interfaces with iproute2's `ip link`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpLink {
    sudo: bool,
}

impl IpLink {
    pub fn new(sudo: bool) -> Self {
        Self { sudo }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = if self.sudo {
            let mut command = Command::new("sudo");
            command.arg("ip");
            command
        } else {
            Command::new("ip")
        };
        command.args(args);
        command
    }

    fn run(&self, args: &[&str]) -> io::Result<()> {
        let mut command = self.command(args);
        debug!(?command, "running");
        let status = command.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "`{}` exited with {status}",
                describe(&command)
            )))
        }
    }
}

impl InterfaceControl for IpLink {
    fn bring_up(&self, interface: &str, bitrate: u32) -> io::Result<()> {
        let bitrate = bitrate.to_string();
        self.run(&["link", "set", interface, "type", "can", "bitrate", &bitrate])?;
        self.run(&["link", "set", interface, "up"])
    }

    fn bring_down(&self, interface: &str) -> io::Result<()> {
        self.run(&["link", "set", interface, "down"])
    }
}

fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ip_link_command() {
        let command = IpLink::new(false).command(&["link", "set", "can0", "up"]);
        assert_eq!(describe(&command), "ip link set can0 up");
    }

    #[test]
    fn sudo_prefixes_command() {
        let command = IpLink::new(true).command(&["link", "set", "can0", "down"]);
        assert_eq!(describe(&command), "sudo ip link set can0 down");
    }
}
