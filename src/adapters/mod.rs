//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `bt_serial`    | CommandSource      | Bluedroid SPP server        |
//! |                | LineSink           |                             |
//! | `console`      | LineSink           | UART0 via stdout            |
//! | `hardware`     | ServoPort          | LEDC PWM channel            |
//! |                | ClimatePort        | DHT22 GPIO lines            |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `report_sink`  | EventSink          | console + wireless lines    |
//! | `time`         | (none)             | ESP32 system timer          |

pub mod bt_serial;
pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod report_sink;
pub mod time;
