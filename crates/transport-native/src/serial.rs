use core_types::{PortOpener, SerialTransport, TransportError};
use std::io::{self, Read};
use std::time::Duration;

/// Opens serial devices with the `serialport` crate, 8N1 without flow control.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePortOpener;

impl PortOpener for NativePortOpener {
    fn open(
        &self,
        path: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialTransport>, TransportError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(NativePort {
            name: path.to_string(),
            port: Some(port),
        }))
    }
}

/// An open `serialport` device. Dropping the inner handle closes the file descriptor.
pub struct NativePort {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl NativePort {
    fn port_mut(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        let name = &self.name;
        self.port.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, format!("{name} is closed"))
        })
    }
}

impl SerialTransport for NativePort {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let n = self.port_mut()?.bytes_to_read().map_err(io::Error::from)?;
        Ok(n as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port_mut()?.read(buf)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.port.take();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device_fails() {
        let result = NativePortOpener.open(
            "/dev/this-port-does-not-exist",
            115_200,
            Duration::from_millis(10),
        );
        match result {
            Err(TransportError::OpenFailed { port, .. }) => {
                assert_eq!(port, "/dev/this-port-does-not-exist")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opened a device that does not exist"),
        }
    }

    #[test]
    fn test_closed_port_reports_not_connected() {
        let mut port = NativePort {
            name: "test".into(),
            port: None,
        };
        assert!(!port.is_open());
        let err = port.bytes_available().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(err.to_string(), "test is closed");
        port.close().unwrap();
    }
}
