use std::thread;
use std::time::Duration;

use gs01::{Builder, Gesture};
use linux_embedded_hal::{Delay, I2cdev};

/// I2C address configured on the sensor
const GS01_ADDRESS: u8 = 0x73;

fn main() {
    let i2c = I2cdev::new("/dev/i2c-1").expect("I2C device");
    let mut sensor = Builder::new_i2c(i2c, GS01_ADDRESS, Delay {});

    // only report reasonably confident detections
    sensor.set_face_detect_thres(60).expect("face threshold");
    sensor.set_gesture_detect_thres(60).expect("gesture threshold");
    sensor.set_detect_thres(100).expect("detection range");

    loop {
        let faces = sensor.get_face_number().expect("face number");
        if faces > 0 {
            let x = sensor.get_face_location_x().expect("face x");
            let y = sensor.get_face_location_y().expect("face y");
            let score = sensor.get_face_score().expect("face score");
            println!("faces: {} at ({}, {}) score {}", faces, x, y, score);

            let gesture = sensor.get_gesture().expect("gesture type");
            let gesture_score = sensor.get_gesture_score().expect("gesture score");
            match gesture {
                Some(Gesture::Like) => println!("LIKE (blue) score {}", gesture_score),
                Some(Gesture::Ok) => println!("OK (green) score {}", gesture_score),
                Some(Gesture::Stop) => println!("STOP (red) score {}", gesture_score),
                Some(Gesture::Yes) => println!("YES (yellow) score {}", gesture_score),
                Some(Gesture::Six) => println!("SIX (purple) score {}", gesture_score),
                None => {}
            }
        }

        thread::sleep(Duration::from_millis(500));
    }
}
