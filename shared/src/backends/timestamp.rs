use std::time::SystemTime;

pub struct Timestamp;

impl Timestamp {
    /// Wall clock in milliseconds since the UNIX epoch. Clocks set before the
    /// epoch yield negative values rather than failing.
    pub fn now_millis() -> i64 {
        match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            Err(before) => -(before.duration().as_millis() as i64),
        }
    }
}
