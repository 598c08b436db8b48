//! nusb-based USB transport implementation.

use std::time::Duration;

use nusb::transfer::{Buffer, Bulk, In, Out, TransferError};
use nusb::{Endpoint, Interface, MaybeFuture, list_devices};
use tracing::{debug, info, instrument};

use super::traits::{TransportError as Error, UsbTransport};
use crate::protocol::constants::{CH341_PRODUCT_ID, CH341_VENDOR_ID};

/// nusb-based USB transport for the bridge controller.
pub struct NusbTransport {
    ep_in: Endpoint<Bulk, In>,
    ep_out: Endpoint<Bulk, Out>,
    _interface: Interface,
}

impl NusbTransport {
    /// Open the first CH341 bridge on the bus.
    #[instrument(level = "info")]
    pub fn open() -> Result<Self, Error> {
        Self::open_with_ids(CH341_VENDOR_ID, CH341_PRODUCT_ID)
    }

    /// Open a bridge with a specific VID/PID.
    #[instrument(level = "info", fields(vid = format!("{:04X}", vid), pid = format!("{:04X}", pid)))]
    pub fn open_with_ids(vid: u16, pid: u16) -> Result<Self, Error> {
        let device_info = list_devices()
            .wait()
            .map_err(|e| Error::OpenFailed(e.to_string()))?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or(Error::DeviceNotFound { vid, pid })?;

        info!(
            vendor_id = %format!("{:04X}", vid),
            product_id = %format!("{:04X}", pid),
            "Found bridge device"
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Error::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(0)
            .wait()
            .map_err(|e| Error::ClaimInterfaceFailed {
                interface: 0,
                message: e.to_string(),
            })?;

        // Find BULK endpoints
        let mut in_addr: u8 = 0;
        let mut out_addr: u8 = 0;

        for config in device.configurations() {
            for iface in config.interfaces() {
                if iface.interface_number() == 0 {
                    for alt in iface.alt_settings() {
                        for ep in alt.endpoints() {
                            if ep.transfer_type() == nusb::descriptors::TransferType::Bulk {
                                if ep.direction() == nusb::transfer::Direction::In {
                                    in_addr = ep.address();
                                } else {
                                    out_addr = ep.address();
                                }
                            }
                        }
                    }
                }
            }
        }

        if in_addr == 0 {
            return Err(Error::EndpointNotFound { direction: "IN" });
        }
        if out_addr == 0 {
            return Err(Error::EndpointNotFound { direction: "OUT" });
        }

        let ep_in = interface
            .endpoint::<Bulk, In>(in_addr)
            .map_err(|e| Error::OpenFailed(e.to_string()))?;
        let ep_out = interface
            .endpoint::<Bulk, Out>(out_addr)
            .map_err(|e| Error::OpenFailed(e.to_string()))?;

        info!(
            in_ep = %format!("0x{:02X}", in_addr),
            out_ep = %format!("0x{:02X}", out_addr),
            "Device opened successfully"
        );

        Ok(Self {
            ep_in,
            ep_out,
            _interface: interface,
        })
    }
}

impl UsbTransport for NusbTransport {
    #[instrument(skip(self, data), fields(len = data.len()))]
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize, Error> {
        let buf = Buffer::from(data.to_vec());
        let completion = self.ep_out.transfer_blocking(buf, timeout);
        match completion.status {
            Ok(()) => {}
            Err(TransferError::Disconnected) => return Err(Error::Disconnected),
            // transfer_blocking cancels the transfer at the deadline
            Err(TransferError::Cancelled) => {
                return Err(Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Err(e) => return Err(Error::WriteFailed(e.to_string())),
        }
        if completion.actual_len != data.len() {
            return Err(Error::ShortWrite {
                written: completion.actual_len,
                expected: data.len(),
            });
        }

        debug!(bytes_written = completion.actual_len, "Write complete");
        Ok(completion.actual_len)
    }

    #[instrument(skip(self, buf), fields(max_len = buf.len()))]
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, Error> {
        // IN transfers must request a multiple of the max packet size.
        let max_packet = self.ep_in.max_packet_size();
        let requested = buf.len().div_ceil(max_packet) * max_packet;
        let mut transfer = Buffer::new(requested);
        transfer.set_requested_len(requested);

        let completion = self.ep_in.transfer_blocking(transfer, timeout);
        match completion.status {
            Ok(()) => {}
            Err(TransferError::Disconnected) => return Err(Error::Disconnected),
            Err(TransferError::Cancelled) => {
                return Err(Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Err(e) => return Err(Error::ReadFailed(e.to_string())),
        }

        let received = completion.actual_len.min(buf.len());
        buf[..received].copy_from_slice(&completion.buffer[..received]);

        debug!(bytes_read = received, "Read complete");
        Ok(received)
    }
}
