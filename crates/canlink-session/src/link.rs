use std::io;

use tracing::{info, warn};

/// Brings a CAN interface up at a bitrate and back down.
///
/// Implemented outside the core (e.g. by invoking `ip link`); the session
/// only decides when to call it.
pub trait InterfaceControl {
    fn bring_up(&self, interface: &str, bitrate: u32) -> io::Result<()>;
    fn bring_down(&self, interface: &str) -> io::Result<()>;
}

impl<T: InterfaceControl + ?Sized> InterfaceControl for &T {
    fn bring_up(&self, interface: &str, bitrate: u32) -> io::Result<()> {
        (**self).bring_up(interface, bitrate)
    }

    fn bring_down(&self, interface: &str) -> io::Result<()> {
        (**self).bring_down(interface)
    }
}

/// Keeps an interface up for its lifetime and brings it down on drop.
///
/// Both directions are best-effort: failures are logged, never returned, so
/// an interface that is already configured still works.
pub struct LinkGuard<L: InterfaceControl> {
    control: L,
    interface: String,
}

impl<L: InterfaceControl> LinkGuard<L> {
    pub fn up(control: L, interface: &str, bitrate: u32) -> Self {
        match control.bring_up(interface, bitrate) {
            Ok(()) => info!(interface, bitrate, "interface up"),
            Err(err) => warn!(interface, bitrate, error = %err, "interface bring-up failed"),
        }
        Self {
            control,
            interface: interface.to_string(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl<L: InterfaceControl> Drop for LinkGuard<L> {
    fn drop(&mut self) {
        match self.control.bring_down(&self.interface) {
            Ok(()) => info!(interface = %self.interface, "interface down"),
            Err(err) => {
                warn!(interface = %self.interface, error = %err, "interface bring-down failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_up: bool,
    }

    impl InterfaceControl for Recorder {
        fn bring_up(&self, interface: &str, bitrate: u32) -> io::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("up {interface} {bitrate}"));
            if self.fail_up {
                return Err(io::Error::other("busy"));
            }
            Ok(())
        }

        fn bring_down(&self, interface: &str) -> io::Result<()> {
            self.calls.lock().unwrap().push(format!("down {interface}"));
            Ok(())
        }
    }

    #[test]
    fn guard_brings_interface_down_on_drop() {
        let recorder = Recorder::default();
        {
            let guard = LinkGuard::up(&recorder, "can0", 100_000);
            assert_eq!(guard.interface(), "can0");
        }
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["up can0 100000".to_string(), "down can0".to_string()]
        );
    }

    #[test]
    fn failed_bring_up_still_brings_down() {
        let recorder = Recorder {
            fail_up: true,
            ..Default::default()
        };
        drop(LinkGuard::up(&recorder, "can1", 500_000));
        assert_eq!(recorder.calls.lock().unwrap().len(), 2);
    }
}
