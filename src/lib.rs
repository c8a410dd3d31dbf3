//! Driver for the ISSI IS31FL3741 39x9 PWM LED matrix controller.
//!
//! RGB pixels are gamma corrected and scattered onto the chip's 351 PWM
//! channels through a board specific channel map, then written across
//! the two PWM register pages. Both blocking ([`embedded_hal::i2c::I2c`])
//! and async ([`embedded_hal_async::i2c::I2c`]) buses are supported.
//!
//! ```rust,ignore
//! static MAP: [u16; 6] = [0, 1, 2, 3, 4, 5];
//! static GAMMA: [u8; 256] = is31fl3741::linear_gamma();
//!
//! let config = is31fl3741::DeviceConfig::new(0x30, &MAP, &GAMMA)
//!     .with_global_current(is31fl3741::global_current_control(1, 5));
//!
//! let mut leds = IS31FL3741::new_blocking(i2c, sdb, config);
//! leds.initialize()?;
//! leds.update_pixels(&[RGB8::new(255, 0, 0), RGB8::new(0, 0, 255)])?;
//! ```
#![no_std]

mod config;
mod is31fl3741;
mod state;

#[cfg(test)]
mod test_utils;

pub use crate::config::{
    channels_for_pixels, global_current_control, linear_gamma, DeviceConfig, Page, Scaling,
    SwSetting, BUFFER_SIZE, MAX_PIXELS, PAGE_BREAK,
};
pub use crate::is31fl3741::{Async, Blocking, IS31FL3741Error, Mode, IS31FL3741};
pub use smart_leds::RGB8;
