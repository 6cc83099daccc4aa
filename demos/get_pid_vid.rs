use gs01::Builder;
use linux_embedded_hal::{Delay, I2cdev};

/// I2C address configured on the sensor
const GS01_ADDRESS: u8 = 0x73;

fn main() {
    let i2c = I2cdev::new("/dev/i2c-1").expect("I2C device");
    let mut sensor = Builder::new_i2c(i2c, GS01_ADDRESS, Delay {});

    let pid = sensor.get_pid().expect("read PID");
    let vid = sensor.get_vid().expect("read VID");
    println!("PID: 0x{:04x}", pid);
    println!("VID: 0x{:04x}", vid);
    println!(
        "hw version: {}, sw version: {}",
        sensor.get_hw_version().expect("read hw version"),
        sensor.get_sw_version().expect("read sw version")
    );
}
