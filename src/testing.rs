//! Test doubles shared by the unit tests

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c;
use embedded_io::{ErrorKind, ErrorType, Read, Write};

use crate::rtu::ModbusRtu;

/// Records every millisecond delay requested
#[derive(Default)]
pub struct RecordingDelay {
    pub millis: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.millis.push(ms);
    }
}

/// In-memory byte stream: replays a canned response and keeps what was written
pub struct FakeSerial {
    response: Vec<u8>,
    cursor: usize,
    pub written: Vec<u8>,
}

impl FakeSerial {
    pub fn new(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            cursor: 0,
            written: Vec::new(),
        }
    }
}

impl ErrorType for FakeSerial {
    type Error = ErrorKind;
}

impl Read for FakeSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.response[self.cursor..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl Write for FakeSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Emulates the sensor's I2C register file: a 2 byte write sets the
/// register pointer, a 4 byte write stores a value, a read returns the
/// register under the pointer.
pub struct FakeBoard {
    address: u8,
    pointer: u16,
    pub registers: [u16; 32],
    /// bus address of every transaction seen
    pub targets: Vec<u8>,
}

impl FakeBoard {
    pub fn filled(address: u8, value: u16) -> Self {
        Self {
            address,
            pointer: 0,
            registers: [value; 32],
            targets: Vec::new(),
        }
    }
}

impl i2c::ErrorType for FakeBoard {
    type Error = i2c::ErrorKind;
}

impl i2c::I2c for FakeBoard {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.targets.push(address);
        if address != self.address {
            return Err(i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }

        for op in operations {
            match op {
                i2c::Operation::Write(bytes) => match bytes.len() {
                    2 => self.pointer = u16::from_be_bytes([bytes[0], bytes[1]]),
                    4 => {
                        let reg = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
                        let slot = self.registers.get_mut(reg).ok_or(i2c::ErrorKind::Other)?;
                        *slot = u16::from_be_bytes([bytes[2], bytes[3]]);
                    }
                    _ => return Err(i2c::ErrorKind::Other),
                },
                i2c::Operation::Read(buf) => {
                    let value = self
                        .registers
                        .get(self.pointer as usize)
                        .copied()
                        .unwrap_or(0xFFFF);
                    buf.copy_from_slice(&value.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}

/// Modbus client backed by plain register arrays
#[derive(Default)]
pub struct RegisterBank {
    pub holding: [u16; 8],
    pub input: [u16; 16],
    /// successful writes, in order
    pub writes: Vec<(u16, u16)>,
    /// register whose writes are answered with exception 0x04
    pub failing_write: Option<u16>,
}

impl ModbusRtu for RegisterBank {
    type Error = u8;

    fn read_input_register(&mut self, _slave: u8, reg: u16) -> Result<u16, u8> {
        self.input.get(reg as usize).copied().ok_or(0x02)
    }

    fn read_holding_register(&mut self, _slave: u8, reg: u16) -> Result<u16, u8> {
        self.holding.get(reg as usize).copied().ok_or(0x02)
    }

    fn write_holding_register(&mut self, _slave: u8, reg: u16, val: u16) -> Result<(), u8> {
        if self.failing_write == Some(reg) {
            return Err(0x04);
        }
        let slot = self.holding.get_mut(reg as usize).ok_or(0x02)?;
        *slot = val;
        self.writes.push((reg, val));
        Ok(())
    }
}
