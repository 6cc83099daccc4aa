/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

#![cfg_attr(not(test), no_std)]

use core::convert::TryFrom;

use embedded_hal as hal;
use hal::delay::DelayNs;

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

mod interface;
pub mod rtu;
#[cfg(test)]
mod testing;

pub use interface::{
    filter_sentinel, is_sentinel, I2cInterface, Reading, SensorInterface, UartInterface,
};
pub use rtu::{ModbusRtu, RtuError, RtuMaster};

/// Errors in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<CommE> {
    /// Sensor communication error
    Comm(CommE),
    /// A configuration register holds a value outside its enumeration
    InvalidConfig(u16),
}

pub struct Builder {}

impl Builder {
    /// Create a new driver using I2C interface
    pub fn new_i2c<I2C, D, CommE>(i2c: I2C, address: u8, delay: D) -> GS01<I2cInterface<I2C, D>>
    where
        I2C: hal::i2c::I2c<Error = CommE>,
        D: DelayNs,
    {
        let iface = interface::I2cInterface::new(i2c, address, delay);
        GS01::new_with_interface(iface)
    }

    /// Create a new driver speaking Modbus-RTU over a serial byte stream
    pub fn new_uart<S, D>(
        serial: S,
        address: u8,
        delay: D,
    ) -> GS01<UartInterface<RtuMaster<S>, D>>
    where
        S: embedded_io::Read + embedded_io::Write,
        D: DelayNs,
    {
        Self::new_modbus(RtuMaster::new(serial), address, delay)
    }

    /// Create a new driver on top of an existing Modbus-RTU client
    pub fn new_modbus<M, D>(client: M, address: u8, delay: D) -> GS01<UartInterface<M, D>>
    where
        M: ModbusRtu,
        D: DelayNs,
    {
        let iface = interface::UartInterface::new(client, address, delay);
        GS01::new_with_interface(iface)
    }
}

/// GS01 gesture and face detection sensor
pub struct GS01<SI> {
    pub(crate) si: SI,
}

impl<SI, CommE> GS01<SI>
where
    SI: SensorInterface<InterfaceError = Error<CommE>>,
{
    pub(crate) fn new_with_interface(sensor_interface: SI) -> Self {
        Self {
            si: sensor_interface,
        }
    }

    /// Release owned resources
    pub fn release(self) -> SI {
        self.si
    }

    /// Product ID
    pub fn get_pid(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_PID)
    }

    /// Vendor ID
    pub fn get_vid(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_VID)
    }

    pub fn get_hw_version(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_HW_VERSION)
    }

    pub fn get_sw_version(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_SW_VERSION)
    }

    /// Number of faces currently in view
    pub fn get_face_number(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_FACE_NUMBER)
    }

    /// X coordinate of the detected face
    pub fn get_face_location_x(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_FACE_LOCATION_X)
    }

    /// Y coordinate of the detected face
    pub fn get_face_location_y(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_FACE_LOCATION_Y)
    }

    /// Confidence of the face detection, 0-100
    pub fn get_face_score(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_FACE_SCORE)
    }

    /// Raw gesture type: 0 for none, otherwise see [`Gesture`]
    pub fn get_gesture_type(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_GESTURE_TYPE)
    }

    /// The detected gesture, if any
    pub fn get_gesture(&mut self) -> Result<Option<Gesture>, SI::InterfaceError> {
        let raw = self.get_gesture_type()?;
        Ok(Gesture::try_from(raw).ok())
    }

    /// Confidence of the gesture detection, 0-100
    pub fn get_gesture_score(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_input_register(REG_GESTURE_SCORE)
    }

    /// Set the minimum face score (0-100) for a detection to be reported.
    /// The board default is 60.
    pub fn set_face_detect_thres(&mut self, score: u16) -> Result<(), SI::InterfaceError> {
        self.si.write_holding_register(REG_FACE_SCORE_THRESHOLD, score)
    }

    pub fn get_face_detect_thres(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_holding_register(REG_FACE_SCORE_THRESHOLD)
    }

    /// Set the X coordinate detection threshold (0-100). The board default is 60.
    pub fn set_detect_thres(&mut self, x: u16) -> Result<(), SI::InterfaceError> {
        self.si.write_holding_register(REG_FACE_THRESHOLD, x)
    }

    pub fn get_detect_thres(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_holding_register(REG_FACE_THRESHOLD)
    }

    /// Set the minimum gesture score (0-100) for a detection to be reported.
    /// The board default is 60.
    pub fn set_gesture_detect_thres(&mut self, score: u16) -> Result<(), SI::InterfaceError> {
        self.si.write_holding_register(REG_GESTURE_SCORE_THRESHOLD, score)
    }

    pub fn get_gesture_detect_thres(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_holding_register(REG_GESTURE_SCORE_THRESHOLD)
    }

    /// Store a new bus address in the sensor.
    ///
    /// This driver keeps talking to the address it was built with; create
    /// a new driver to reach the sensor at its new address.
    pub fn set_device_addr(&mut self, addr: u8) -> Result<(), SI::InterfaceError> {
        self.si.write_holding_register(REG_ADDR, u16::from(addr))
    }

    /// Bus address currently stored in the sensor
    pub fn get_device_addr(&mut self) -> Result<u16, SI::InterfaceError> {
        self.si.read_holding_register(REG_ADDR)
    }

    /// Configure the sensor's serial port.
    ///
    /// Baud rate and framing live in two registers which are written one
    /// after the other. Only the outcome of the second write is reported.
    pub fn config_uart(
        &mut self,
        baud: BaudRate,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<(), SI::InterfaceError> {
        let verify_and_stop = ((parity as u16) << 8) | ((stop_bits as u16) & 0xFF);

        let _rc = self.si.write_holding_register(REG_BAUDRATE, baud as u16);
        #[cfg(feature = "rttdebug")]
        {
            if _rc.is_err() {
                rprintln!("baud rate write failed");
            }
        }

        self.si.write_holding_register(REG_VERIFY_AND_STOP, verify_and_stop)
    }

    /// Read back the serial port configuration stored in the sensor
    pub fn get_uart_config(
        &mut self,
    ) -> Result<(BaudRate, Parity, StopBits), SI::InterfaceError> {
        let baud_raw = self.si.read_holding_register(REG_BAUDRATE)?;
        let verify_and_stop = self.si.read_holding_register(REG_VERIFY_AND_STOP)?;

        let baud = BaudRate::try_from(baud_raw).map_err(Error::<CommE>::InvalidConfig)?;
        let parity =
            Parity::try_from(verify_and_stop >> 8).map_err(Error::<CommE>::InvalidConfig)?;
        let stop_bits =
            StopBits::try_from(verify_and_stop & 0xFF).map_err(Error::<CommE>::InvalidConfig)?;

        Ok((baud, parity, stop_bits))
    }
}

impl<I2C, D, CommE> GS01<I2cInterface<I2C, D>>
where
    I2C: hal::i2c::I2c<Error = CommE>,
    D: DelayNs,
{
    /// Read a data register, telling a not-ready answer apart from zero.
    /// A bus failure is `Err(Error::Comm)`, never a zero reading.
    pub fn read_input_reading(&mut self, reg: u16) -> Result<Reading, Error<CommE>> {
        self.si.read_input_reading(reg)
    }
}

/// Configuration (holding) registers
///
pub const REG_ADDR: u16 = 0x00;
pub const REG_BAUDRATE: u16 = 0x01;
/// parity in the high byte, stop bits in the low byte
pub const REG_VERIFY_AND_STOP: u16 = 0x02;
pub const REG_FACE_THRESHOLD: u16 = 0x03;
pub const REG_FACE_SCORE_THRESHOLD: u16 = 0x04;
pub const REG_GESTURE_SCORE_THRESHOLD: u16 = 0x05;

/// Data (input) registers
///
pub const REG_PID: u16 = 0x00;
pub const REG_VID: u16 = 0x01;
pub const REG_HW_VERSION: u16 = 0x02;
pub const REG_SW_VERSION: u16 = 0x03;
pub const REG_FACE_NUMBER: u16 = 0x04;
pub const REG_FACE_LOCATION_X: u16 = 0x05;
pub const REG_FACE_LOCATION_Y: u16 = 0x06;
pub const REG_FACE_SCORE: u16 = 0x07;
pub const REG_GESTURE_TYPE: u16 = 0x08;
pub const REG_GESTURE_SCORE: u16 = 0x09;

/// Where the input registers start in the flat I2C address space
pub const INPUT_REG_OFFSET: u16 = 0x06;

#[repr(u16)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Serial line rates supported by the sensor.
/// The numeric values are what the baud rate register stores.
pub enum BaudRate {
    Baud_1200 = 1,
    Baud_2400 = 2,
    Baud_4800 = 3,
    Baud_9600 = 4,
    Baud_14400 = 5,
    Baud_19200 = 6,
    Baud_38400 = 7,
    Baud_57600 = 8,
    Baud_115200 = 9,
    Baud_230400 = 10,
    Baud_460800 = 11,
    Baud_921600 = 12,
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::Baud_9600
    }
}

impl BaudRate {
    /// Line rate in bits per second
    pub fn bits_per_second(&self) -> u32 {
        match self {
            Self::Baud_1200 => 1200,
            Self::Baud_2400 => 2400,
            Self::Baud_4800 => 4800,
            Self::Baud_9600 => 9600,
            Self::Baud_14400 => 14400,
            Self::Baud_19200 => 19200,
            Self::Baud_38400 => 38400,
            Self::Baud_57600 => 57600,
            Self::Baud_115200 => 115_200,
            Self::Baud_230400 => 230_400,
            Self::Baud_460800 => 460_800,
            Self::Baud_921600 => 921_600,
        }
    }
}

impl TryFrom<u16> for BaudRate {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Baud_1200),
            2 => Ok(Self::Baud_2400),
            3 => Ok(Self::Baud_4800),
            4 => Ok(Self::Baud_9600),
            5 => Ok(Self::Baud_14400),
            6 => Ok(Self::Baud_19200),
            7 => Ok(Self::Baud_38400),
            8 => Ok(Self::Baud_57600),
            9 => Ok(Self::Baud_115200),
            10 => Ok(Self::Baud_230400),
            11 => Ok(Self::Baud_460800),
            12 => Ok(Self::Baud_921600),
            _ => Err(value),
        }
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Serial parity setting
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

impl Default for Parity {
    fn default() -> Self {
        Parity::None
    }
}

impl TryFrom<u16> for Parity {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Odd),
            2 => Ok(Self::Even),
            3 => Ok(Self::Mark),
            4 => Ok(Self::Space),
            _ => Err(value),
        }
    }
}

#[repr(u16)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Number of serial stop bits
pub enum StopBits {
    Stop_0_5 = 0,
    Stop_1 = 1,
    Stop_1_5 = 2,
    Stop_2 = 3,
}

impl Default for StopBits {
    fn default() -> Self {
        StopBits::Stop_1
    }
}

impl TryFrom<u16> for StopBits {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stop_0_5),
            1 => Ok(Self::Stop_1),
            2 => Ok(Self::Stop_1_5),
            3 => Ok(Self::Stop_2),
            _ => Err(value),
        }
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Hand gestures the sensor recognizes
pub enum Gesture {
    /// thumbs up
    Like = 1,
    /// thumb and index finger circle
    Ok = 2,
    /// open palm
    Stop = 3,
    /// V sign
    Yes = 4,
    /// thumb and little finger spread
    Six = 5,
}

impl TryFrom<u16> for Gesture {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Gesture::Like),
            2 => Ok(Gesture::Ok),
            3 => Ok(Gesture::Stop),
            4 => Ok(Gesture::Yes),
            5 => Ok(Gesture::Six),
            _ => Err(value),
        }
    }
}
