pub mod i2c;
pub mod uart;

pub use self::i2c::{filter_sentinel, is_sentinel, I2cInterface, Reading};
pub use self::uart::UartInterface;

/// A method of communicating with the sensor
///
/// The board exposes two register spaces: holding registers carry the
/// configuration, input registers carry identity and detection results.
/// Every register is 16 bits wide.
pub trait SensorInterface {
    /// Interface error type
    type InterfaceError;

    /// Read one data register
    fn read_input_register(&mut self, reg: u16) -> Result<u16, Self::InterfaceError>;

    /// Read one configuration register
    fn read_holding_register(&mut self, reg: u16) -> Result<u16, Self::InterfaceError>;

    /// Write one configuration register
    fn write_holding_register(&mut self, reg: u16, val: u16) -> Result<(), Self::InterfaceError>;
}
