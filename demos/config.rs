use gs01::{BaudRate, Builder, Parity, StopBits};
use linux_embedded_hal::{Delay, I2cdev};

/// I2C address configured on the sensor
const GS01_ADDRESS: u8 = 0x73;

fn main() {
    let i2c = I2cdev::new("/dev/i2c-1").expect("I2C device");
    let mut sensor = Builder::new_i2c(i2c, GS01_ADDRESS, Delay {});

    sensor.set_face_detect_thres(60).expect("face threshold");
    sensor.set_detect_thres(100).expect("detection range");
    sensor.set_gesture_detect_thres(60).expect("gesture threshold");
    println!(
        "thresholds: face {} range {} gesture {}",
        sensor.get_face_detect_thres().expect("read face threshold"),
        sensor.get_detect_thres().expect("read detection range"),
        sensor.get_gesture_detect_thres().expect("read gesture threshold")
    );

    sensor
        .config_uart(BaudRate::Baud_9600, Parity::None, StopBits::Stop_1)
        .expect("configure uart");
    let (baud, parity, stop_bits) = sensor.get_uart_config().expect("read uart config");
    println!(
        "uart: {} baud, parity {:?}, stop bits {:?}",
        baud.bits_per_second(),
        parity,
        stop_bits
    );
}
