//! `presence-relay ports`: find serial devices a sensor may be attached to.

use presence_common::IngestError;
use tokio_serial::{SerialPortInfo, SerialPortType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// `/dev/ttyUSB0`, `COM3`, ...
    pub path: String,
    pub kind: &'static str,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    /// `VID:PID` in hex, USB devices only.
    pub usb_id: Option<String>,
}

impl From<&SerialPortInfo> for PortInfo {
    fn from(info: &SerialPortInfo) -> Self {
        let mut port = PortInfo {
            path: info.port_name.clone(),
            kind: "unknown",
            manufacturer: None,
            product: None,
            serial_number: None,
            usb_id: None,
        };
        match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                port.kind = "usb";
                port.manufacturer = usb.manufacturer.clone();
                port.product = usb.product.clone();
                port.serial_number = usb.serial_number.clone();
                port.usb_id = Some(format!("{:04x}:{:04x}", usb.vid, usb.pid));
            }
            SerialPortType::PciPort => port.kind = "pci",
            SerialPortType::BluetoothPort => port.kind = "bluetooth",
            SerialPortType::Unknown => {}
        }
        port
    }
}

/// Every serial port the OS reports, sorted by path.
pub fn list_ports() -> Result<Vec<PortInfo>, IngestError> {
    let ports = tokio_serial::available_ports().map_err(|e| IngestError::FeedOpen {
        source_name: "serial port enumeration".into(),
        reason: e.to_string(),
    })?;
    Ok(describe(&ports))
}

fn describe(ports: &[SerialPortInfo]) -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = ports.iter().map(PortInfo::from).collect();
    ports.sort_by(|a, b| a.path.cmp(&b.path));
    ports
}

pub fn print_ports(ports: &[PortInfo]) {
    if ports.is_empty() {
        println!("No serial ports found.");
        println!();
        println!("Make sure the sensor is:");
        println!("  - Connected via USB (or the UART is enabled on a Raspberry Pi)");
        println!("  - Powered on");
        println!("  - Using installed drivers (Device Manager on Windows)");
        return;
    }

    println!("Found {} port(s):", ports.len());
    println!();
    for (i, port) in ports.iter().enumerate() {
        println!("{}. {} ({})", i + 1, port.path, port.kind);
        if let Some(m) = &port.manufacturer {
            println!("   Manufacturer: {m}");
        }
        if let Some(p) = &port.product {
            println!("   Product: {p}");
        }
        if let Some(s) = &port.serial_number {
            println!("   Serial number: {s}");
        }
        if let Some(id) = &port.usb_id {
            println!("   USB id: {id}");
        }
    }
    println!();
    println!("Use one with: presence-relay serve --device <path>");
}
