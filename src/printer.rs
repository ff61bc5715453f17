use log::{debug, info};
use rusb::{
    Context, Device, DeviceDescriptor, DeviceHandle, Direction, Recipient, RequestType,
    TransferType, UsbContext,
};
use std::time::Duration;

use crate::{
    command::{TAPE_CUT, TAPE_FEED},
    error::Error,
    job::{build_job, PrintSettings},
    media::{tape_width_from_status, TapeProfile},
    raster::Raster,
};

/// King Jim Co., Ltd
const DEFAULT_VENDOR_ID: u16 = 0x0D8A;
/// TEPRA PRO SR920
const DEFAULT_PRODUCT_ID: u16 = 0x0103;

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    config: u8,
    iface: u8,
    setting: u8,
    address: u8,
}

/// USB identification of the printer to open.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    vendor_id: u16,
    product_id: u16,
}

impl Config {
    /// Defaults to the SR920.
    pub fn new() -> Config {
        Config {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
        }
    }

    /// Select another model by its USB ids.
    pub fn usb_ids(self, vendor_id: u16, product_id: u16) -> Self {
        Config {
            vendor_id,
            product_id,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// An open connection to a TEPRA printer.
///
/// One handle serves one job at a time; the protocol has no notion of
/// interleaved jobs and no cancellation once graphic data is flowing,
/// so concurrent use against the same device must be serialized by the
/// caller.
pub struct Printer {
    handle: Box<DeviceHandle<Context>>,
    endpoint_out: Endpoint,
}

impl Printer {
    pub fn new(config: Config) -> Result<Self, Error> {
        match Context::new() {
            Ok(mut context) => {
                match Self::open_device(&mut context, config.vendor_id, config.product_id) {
                    Ok((mut device, device_desc, mut handle)) => {
                        handle.reset()?;

                        let endpoint_out = match Self::find_endpoint(
                            &mut device,
                            &device_desc,
                            Direction::Out,
                            TransferType::Bulk,
                        ) {
                            Some(endpoint) => endpoint,
                            None => return Err(Error::MissingEndpoint),
                        };

                        // The kernel's usblp driver grabs the interface
                        // before we can claim it.
                        handle.set_auto_detach_kernel_driver(true)?;
                        handle.set_active_configuration(endpoint_out.config)?;
                        handle.claim_interface(endpoint_out.iface)?;
                        handle.set_alternate_setting(endpoint_out.iface, endpoint_out.setting)?;

                        Ok(Printer {
                            handle: Box::new(handle),
                            endpoint_out,
                        })
                    }
                    Err(err) => {
                        debug!("{:?}", err);
                        Err(Error::DeviceOffline)
                    }
                }
            }
            Err(err) => Err(Error::UsbError(err)),
        }
    }

    fn open_device(
        context: &mut Context,
        vid: u16,
        pid: u16,
    ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
        let devices = context.devices()?;

        if devices.is_empty() {
            debug!("Failed to read device list");
            return Err(Error::DeviceListNotReadable);
        }

        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() == vid && device_desc.product_id() == pid {
                match device.open() {
                    Ok(handle) => return Ok((device, device_desc, handle)),
                    Err(err) => {
                        debug!("Failed to open device: {:?}", err);
                        continue;
                    }
                }
            }
        }
        debug!("No device matches {:04x}:{:04x}", vid, pid);
        Err(Error::DeviceOffline)
    }

    fn find_endpoint(
        device: &mut Device<Context>,
        device_desc: &DeviceDescriptor,
        direction: Direction,
        transfer_type: TransferType,
    ) -> Option<Endpoint> {
        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for interface in config_desc.interfaces() {
                for interface_desc in interface.descriptors() {
                    for endpoint_desc in interface_desc.endpoint_descriptors() {
                        if endpoint_desc.direction() == direction
                            && endpoint_desc.transfer_type() == transfer_type
                        {
                            return Some(Endpoint {
                                config: config_desc.number(),
                                iface: interface_desc.interface_number(),
                                setting: interface_desc.setting_number(),
                                address: endpoint_desc.address(),
                            });
                        }
                    }
                }
            }
        }
        None
    }

    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        let timeout = Duration::from_secs(10);
        debug!("send: {:02X?}", buf);
        let result = self
            .handle
            .write_bulk(self.endpoint_out.address, buf, timeout);
        match result {
            Ok(n) => {
                if n == buf.len() {
                    Ok(n)
                } else {
                    debug!(
                        "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                        n,
                        buf.len()
                    );
                    Err(Error::InvalidResponse(n))
                }
            }
            Err(e) => Err(Error::UsbError(e)),
        }
    }

    /// Read the IEEE 1284 device ID string.
    pub fn device_id(&self) -> Result<String, Error> {
        let request_type = rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface);
        let mut buf = [0u8; 1024];
        let n = self
            .handle
            .read_control(request_type, 0x00, 0, 0, &mut buf, Duration::from_secs(1))?;
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }

    /// Read the raw 8-byte port status.
    ///
    /// Byte 3 carries the tape-width code; the rest is undocumented.
    pub fn port_status(&self) -> Result<[u8; 8], Error> {
        let request_type = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Interface);
        let mut buf = [0u8; 8];
        let n = self
            .handle
            .read_control(request_type, 0x01, 0, 0, &mut buf, Duration::from_secs(1))?;
        if n != buf.len() {
            return Err(Error::InvalidResponse(n));
        }
        debug!("port status: {:02X?}", buf);
        Ok(buf)
    }

    /// Width of the installed tape in millimeters; 0 when the slot is
    /// empty, 255 when the cartridge is not recognized.
    pub fn tape_width_mm(&self) -> Result<u8, Error> {
        Ok(tape_width_from_status(self.port_status()?[3]))
    }

    /// Profile of the installed tape, for feeding the rasterizer.
    pub fn tape_profile(&self) -> Result<TapeProfile, Error> {
        TapeProfile::from_status(&self.port_status()?)
    }

    /// Feed the tape without printing.
    pub fn feed(&self) -> Result<(), Error> {
        self.write(TAPE_FEED)?;
        Ok(())
    }

    /// Cut the tape at the current position.
    pub fn cut(&self) -> Result<(), Error> {
        self.write(TAPE_CUT)?;
        Ok(())
    }

    /// Print one job.
    ///
    /// The full command sequence is built and validated first, then
    /// handed to the device command by command. A transport failure
    /// mid-sequence aborts the remainder; copies already transmitted
    /// cannot be recalled.
    pub fn print(
        &self,
        profile: &TapeProfile,
        settings: &PrintSettings,
        raster: &Raster,
    ) -> Result<(), Error> {
        let commands = build_job(profile, settings, raster)?;

        info!(
            "printing on {}mm tape, {} commands",
            profile.width_mm(),
            commands.len()
        );

        for command in &commands {
            self.write(command)?;
        }

        info!("job sent");
        Ok(())
    }
}
