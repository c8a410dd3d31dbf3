pub const COMMAND_REGISTER: u8 = 0xfd;
pub const COMMAND_WRITE_LOCK_REGISTER: u8 = 0xfe;
pub const COMMAND_WRITE_UNLOCK: u8 = 0xc5;

pub const CONFIGURATION_REGISTER: u8 = 0x00;
pub const GCC_REGISTER: u8 = 0x01;
pub const RESET_REGISTER: u8 = 0x3f;
pub const RESET_VALUE: u8 = 0xae;

pub const CONFIGURATION_LOGIC_LEVEL_HIGH: u8 = 0b0000_1000;
pub const CONFIGURATION_SOFTWARE_SHUTDOWN_DISABLE: u8 = 0b0000_0001;

/// Number of channel registers, 39 current sinks by 9 switches.
pub const BUFFER_SIZE: usize = 39 * 9;

/// Size of one register page; channels past this offset live on the
/// second PWM / scaling page.
pub const PAGE_BREAK: usize = 0xb4;

/// Largest number of RGB pixels a full buffer can hold.
pub const MAX_PIXELS: usize = BUFFER_SIZE / 3;

/// Register pages of the chip. Every transfer selects its page first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Page {
    PwmA = 0x00,
    PwmB = 0x01,
    ScalingA = 0x02,
    ScalingB = 0x03,
    Function = 0x04,
}

/// SWS field of the configuration register, selecting which switch
/// lines are scanned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SwSetting {
    #[default]
    Sw1Sw9 = 0b0000,
    Sw1Sw8 = 0b0001,
    Sw1Sw7 = 0b0010,
    Sw1Sw6 = 0b0011,
    Sw1Sw5 = 0b0100,
    Sw1Sw4 = 0b0101,
    Sw1Sw3 = 0b0110,
    Sw1Sw2 = 0b0111,
    /// All switches off, current source mode.
    NoScan = 0b1000,
}

impl SwSetting {
    /// Value of the configuration register for normal operation with
    /// this switch setting.
    pub const fn configuration(self) -> u8 {
        ((self as u8) << 4)
            | CONFIGURATION_LOGIC_LEVEL_HIGH
            | CONFIGURATION_SOFTWARE_SHUTDOWN_DISABLE
    }
}

/// Per-colour scaling register values, programmed once at initialization.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scaling {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            red: 0xff,
            green: 0xff,
            blue: 0xff,
        }
    }
}

/// Per-instance constants of a driver.
#[derive(Debug, Copy, Clone)]
pub struct DeviceConfig {
    /// 7-bit I2C address of the chip
    pub address: u8,
    /// Buffer offsets of each pixel's red, green and blue channel, one
    /// triplet per pixel, following the board's wiring.
    pub rgb_map: &'static [u16],
    /// Brightness correction applied to every channel value
    pub gamma: &'static [u8; 256],
    /// Global current control register value, see [`global_current_control`]
    pub global_current: u8,
    pub sw_setting: SwSetting,
    pub scaling: Scaling,
}

impl DeviceConfig {
    pub const fn new(
        address: u8,
        rgb_map: &'static [u16],
        gamma: &'static [u8; 256],
    ) -> Self {
        Self {
            address,
            rgb_map,
            gamma,
            global_current: 0xff,
            sw_setting: SwSetting::Sw1Sw9,
            scaling: Scaling {
                red: 0xff,
                green: 0xff,
                blue: 0xff,
            },
        }
    }

    pub const fn with_global_current(mut self, global_current: u8) -> Self {
        self.global_current = global_current;
        self
    }

    pub const fn with_sw_setting(mut self, sw_setting: SwSetting) -> Self {
        self.sw_setting = sw_setting;
        self
    }

    pub const fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Number of pixels described by the channel map.
    pub const fn pixel_count(&self) -> usize {
        self.rgb_map.len() / 3
    }
}

/// Derive the global current control value from the external resistor
/// and the LED's maximum current.
///
/// Values that do not fit the register saturate at `0xff`.
pub const fn global_current_control(r_ext: u32, led_max_current: u32) -> u8 {
    let gcc = (r_ext as u128 * led_max_current as u128 * 256 * 256) / (383 * 255);

    if gcc > u8::MAX as u128 {
        u8::MAX
    } else {
        gcc as u8
    }
}

/// Identity brightness correction table.
pub const fn linear_gamma() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    table
}

/// Number of channels needed for `pixels` RGB pixels, `None` on overflow.
pub const fn channels_for_pixels(pixels: usize) -> Option<usize> {
    pixels.checked_mul(3)
}
