//! Minimal Modbus-RTU master for single-register access.
//!
//! Only the three function codes the GS01 understands are supported:
//! read holding registers (0x03), read input registers (0x04) and
//! write single register (0x06), always for one register at a time.

use crc::{Crc, CRC_16_MODBUS};
use embedded_io::{Read, ReadExactError, Write};
#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

const FC_READ_HOLDING: u8 = 0x03;
const FC_READ_INPUT: u8 = 0x04;
const FC_WRITE_SINGLE: u8 = 0x06;

/// Set on the function code of an exception response
const EXCEPTION_FLAG: u8 = 0x80;

/// Slave address that every device accepts and none answers
pub const BROADCAST_ADDRESS: u8 = 0x00;

/// Every request frame is the same length
const REQUEST_LEN: usize = 8;
/// slave + fc + byte count + 2 data bytes + crc
const READ_RESPONSE_LEN: usize = 7;
/// slave + fc + exception code + crc
const EXCEPTION_RESPONSE_LEN: usize = 5;

/// Errors reported by the Modbus-RTU master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtuError<E> {
    /// Error from the underlying byte stream
    Io(E),
    /// Stream ended before a full response frame arrived
    UnexpectedEof,
    /// Response checksum does not match its contents
    Crc { expected: u16, received: u16 },
    /// Slave answered with a Modbus exception code
    Exception(u8),
    /// Response does not belong to the request that was sent
    UnexpectedResponse,
}

impl<E> From<ReadExactError<E>> for RtuError<E> {
    fn from(err: ReadExactError<E>) -> Self {
        match err {
            ReadExactError::UnexpectedEof => RtuError::UnexpectedEof,
            ReadExactError::Other(e) => RtuError::Io(e),
        }
    }
}

/// Single-register Modbus-RTU operations addressed to one slave
pub trait ModbusRtu {
    /// Client error type
    type Error;

    /// Function 0x04, one register
    fn read_input_register(&mut self, slave: u8, reg: u16) -> Result<u16, Self::Error>;

    /// Function 0x03, one register
    fn read_holding_register(&mut self, slave: u8, reg: u16) -> Result<u16, Self::Error>;

    /// Function 0x06
    fn write_holding_register(&mut self, slave: u8, reg: u16, val: u16)
        -> Result<(), Self::Error>;
}

/// Append the little-endian CRC over `frame[..len - 2]` into the last two bytes
fn seal(frame: &mut [u8]) {
    let body = frame.len() - 2;
    let crc = CRC_COMPUTER.checksum(&frame[..body]);
    frame[body..].copy_from_slice(&crc.to_le_bytes());
}

/// Check the trailing little-endian CRC of a received frame
fn verify<E>(frame: &[u8]) -> Result<(), RtuError<E>> {
    let body = frame.len() - 2;
    let expected = CRC_COMPUTER.checksum(&frame[..body]);
    let received = u16::from_le_bytes([frame[body], frame[body + 1]]);
    if expected != received {
        return Err(RtuError::Crc { expected, received });
    }
    Ok(())
}

fn request(slave: u8, function: u8, reg: u16, arg: u16) -> [u8; REQUEST_LEN] {
    let [reg_hi, reg_lo] = reg.to_be_bytes();
    let [arg_hi, arg_lo] = arg.to_be_bytes();
    let mut frame = [slave, function, reg_hi, reg_lo, arg_hi, arg_lo, 0, 0];
    seal(&mut frame);
    frame
}

/// Modbus-RTU master over a byte stream such as a UART.
///
/// Frame timing (the 3.5 character gap) and response timeouts are left
/// to the stream; a read that never completes blocks forever.
pub struct RtuMaster<S> {
    stream: S,
}

impl<S> RtuMaster<S>
where
    S: Read + Write,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Release owned resources
    pub fn release(self) -> S {
        self.stream
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), RtuError<S::Error>> {
        #[cfg(feature = "rttdebug")]
        rprintln!("rtu tx {:x?}", frame);

        self.stream.write_all(frame).map_err(RtuError::Io)?;
        self.stream.flush().map_err(RtuError::Io)
    }

    /// Receive a response into `frame`, which is sized for the success case.
    ///
    /// Returns `RtuError::Exception` if the slave reported one instead.
    fn receive(
        &mut self,
        slave: u8,
        function: u8,
        frame: &mut [u8],
    ) -> Result<(), RtuError<S::Error>> {
        self.stream.read_exact(&mut frame[..2])?;
        if frame[0] != slave {
            self.discard_rest(frame[1], frame.len());
            return Err(RtuError::UnexpectedResponse);
        }

        if frame[1] == function | EXCEPTION_FLAG {
            let mut exception = [0u8; EXCEPTION_RESPONSE_LEN];
            exception[..2].copy_from_slice(&frame[..2]);
            self.stream.read_exact(&mut exception[2..])?;
            verify::<S::Error>(&exception)?;

            #[cfg(feature = "rttdebug")]
            rprintln!("rtu exception 0x{:x}", exception[2]);

            return Err(RtuError::Exception(exception[2]));
        }
        if frame[1] != function {
            self.discard_rest(frame[1], frame.len());
            return Err(RtuError::UnexpectedResponse);
        }

        self.stream.read_exact(&mut frame[2..])?;

        #[cfg(feature = "rttdebug")]
        rprintln!("rtu rx {:x?}", frame);

        verify(frame)
    }

    /// Drop the remainder of a reply that is not ours so the next request
    /// starts on a frame boundary. `len` is the length we were expecting.
    fn discard_rest(&mut self, function: u8, len: usize) {
        let len = if function & EXCEPTION_FLAG != 0 {
            EXCEPTION_RESPONSE_LEN
        } else {
            len
        };
        let mut scratch = [0u8; REQUEST_LEN];
        // the reply is already rejected, a short read here changes nothing
        let _ = self.stream.read_exact(&mut scratch[..len - 2]);
    }

    fn read_register(
        &mut self,
        slave: u8,
        function: u8,
        reg: u16,
    ) -> Result<u16, RtuError<S::Error>> {
        self.send(&request(slave, function, reg, 1))?;

        let mut frame = [0u8; READ_RESPONSE_LEN];
        self.receive(slave, function, &mut frame)?;
        if frame[2] != 2 {
            return Err(RtuError::UnexpectedResponse);
        }

        Ok(u16::from_be_bytes([frame[3], frame[4]]))
    }
}

impl<S> ModbusRtu for RtuMaster<S>
where
    S: Read + Write,
{
    type Error = RtuError<S::Error>;

    fn read_input_register(&mut self, slave: u8, reg: u16) -> Result<u16, Self::Error> {
        self.read_register(slave, FC_READ_INPUT, reg)
    }

    fn read_holding_register(&mut self, slave: u8, reg: u16) -> Result<u16, Self::Error> {
        self.read_register(slave, FC_READ_HOLDING, reg)
    }

    fn write_holding_register(
        &mut self,
        slave: u8,
        reg: u16,
        val: u16,
    ) -> Result<(), Self::Error> {
        let req = request(slave, FC_WRITE_SINGLE, reg, val);
        self.send(&req)?;
        if slave == BROADCAST_ADDRESS {
            return Ok(());
        }

        // a successful write is echoed back verbatim
        let mut echo = [0u8; REQUEST_LEN];
        self.receive(slave, FC_WRITE_SINGLE, &mut echo)?;
        if echo != req {
            return Err(RtuError::UnexpectedResponse);
        }
        Ok(())
    }
}
