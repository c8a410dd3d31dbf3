use crate::config::*;

/// In-memory copy of the last PWM frame mapped from pixels.
///
/// The selected register page is not tracked; every transfer reselects it.
pub struct State {
    pub channels: [u8; BUFFER_SIZE],
}

impl Default for State {
    fn default() -> Self {
        Self {
            channels: [0; BUFFER_SIZE],
        }
    }
}
