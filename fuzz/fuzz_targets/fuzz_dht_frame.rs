//! Fuzz target: `dht22::decode_frame`
//!
//! Any 5-byte frame must either fail the checksum or decode to a finite
//! reading whose magnitude fits the 16-bit wire fields.
//!
//! cargo fuzz run fuzz_dht_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use medbox::sensors::dht22::decode_frame;

fuzz_target!(|frame: [u8; 5]| {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    match decode_frame(&frame) {
        Ok(reading) => {
            assert_eq!(sum, frame[4]);
            assert!(reading.humidity_pct.is_finite());
            assert!(reading.temperature_c.is_finite());
            assert!(reading.humidity_pct <= 6553.5);
            assert!(reading.temperature_c.abs() <= 3276.7);
        }
        Err(_) => assert_ne!(sum, frame[4]),
    }
});
