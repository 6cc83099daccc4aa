use embedded_hal as hal;
use hal::delay::DelayNs;

use super::SensorInterface;
use crate::rtu::ModbusRtu;
use crate::Error;
#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// Wait before every request, in ms
const REQUEST_SETTLE_MS: u32 = 20;

/// Register access through a Modbus-RTU client, typically over a UART.
///
/// Input and holding registers map directly onto the Modbus function
/// codes of the same name; no address translation is applied.
pub struct UartInterface<M, D> {
    /// the Modbus-RTU client to use when communicating
    client: M,
    /// Modbus slave address of the sensor
    address: u8,
    /// source of the settle delay before each request
    delay: D,
}

impl<M, D> UartInterface<M, D>
where
    M: ModbusRtu,
    D: DelayNs,
{
    pub fn new(client: M, address: u8, delay: D) -> Self {
        Self {
            client,
            address,
            delay,
        }
    }

    /// Release owned resources
    pub fn release(self) -> (M, D) {
        (self.client, self.delay)
    }

    /// The slave address this interface talks to
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl<M, D> SensorInterface for UartInterface<M, D>
where
    M: ModbusRtu,
    D: DelayNs,
{
    type InterfaceError = Error<M::Error>;

    fn read_input_register(&mut self, reg: u16) -> Result<u16, Self::InterfaceError> {
        self.delay.delay_ms(REQUEST_SETTLE_MS);
        let val = self
            .client
            .read_input_register(self.address, reg)
            .map_err(Error::Comm)?;

        #[cfg(feature = "rttdebug")]
        rprintln!("input reg 0x{:x} = 0x{:x}", reg, val);

        Ok(val)
    }

    fn read_holding_register(&mut self, reg: u16) -> Result<u16, Self::InterfaceError> {
        self.delay.delay_ms(REQUEST_SETTLE_MS);
        let val = self
            .client
            .read_holding_register(self.address, reg)
            .map_err(Error::Comm)?;

        #[cfg(feature = "rttdebug")]
        rprintln!("holding reg 0x{:x} = 0x{:x}", reg, val);

        Ok(val)
    }

    fn write_holding_register(&mut self, reg: u16, val: u16) -> Result<(), Self::InterfaceError> {
        self.delay.delay_ms(REQUEST_SETTLE_MS);
        self.client
            .write_holding_register(self.address, reg, val)
            .map_err(Error::Comm)
    }
}
