use crate::config::*;
use crate::state::State;

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::Operation;
use smart_leds::{SmartLedsWrite, RGB8};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IS31FL3741Error {
    /// The I2C bus or the SDB pin was not provided
    NotFound,
    /// A bus transfer or pin write failed
    IoError,
    /// More channels than the chip has registers
    CapacityError,
}

impl core::fmt::Display for IS31FL3741Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IS31FL3741Error::NotFound => f.write_str("I2C bus or SDB pin not found"),
            IS31FL3741Error::IoError => f.write_str("I/O error talking to the device"),
            IS31FL3741Error::CapacityError => {
                write!(f, "more than {} channels requested", BUFFER_SIZE)
            }
        }
    }
}

impl core::error::Error for IS31FL3741Error {}

pub trait Mode {}

#[derive(Debug)]
pub struct Async;
#[derive(Debug)]
pub struct Blocking;

impl Mode for Async {}
impl Mode for Blocking {}

pub struct IS31FL3741<BUS, SDB, M: Mode> {
    bus: Option<BUS>,
    sdb: Option<SDB>,
    config: DeviceConfig,
    state: State,
    _phantom: core::marker::PhantomData<M>,
}

// General implementation
impl<BUS, SDB, M: Mode> IS31FL3741<BUS, SDB, M> {
    /// Create a new IS31FL3741 driver
    /// # Arguments
    /// * `bus` - The I2C bus to use, `None` if it could not be resolved
    /// * `sdb` - The shutdown (SDB) pin, `None` if it could not be resolved
    /// * `config` - Per-device constants
    ///
    /// # Panics
    /// If the channel map is not made of whole RGB triplets, describes more
    /// channels than the chip has, or points past the last channel.
    ///
    /// # Returns
    /// A new IS31FL3741 driver with a zeroed channel buffer
    pub fn new(bus: Option<BUS>, sdb: Option<SDB>, config: DeviceConfig) -> Self {
        core::assert!(config.rgb_map.len() % 3 == 0);
        core::assert!(config.rgb_map.len() <= BUFFER_SIZE);
        core::assert!(config
            .rgb_map
            .iter()
            .all(|&offset| (offset as usize) < BUFFER_SIZE));

        Self {
            bus,
            sdb,
            config,
            state: State::default(),
            _phantom: core::marker::PhantomData,
        }
    }

    /// Give back the bus and the SDB pin.
    pub fn release(self) -> (Option<BUS>, Option<SDB>) {
        (self.bus, self.sdb)
    }

    pub fn inner_mut(&mut self) -> Option<&mut BUS> {
        self.bus.as_mut()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Number of RGB pixels wired to the chip.
    pub fn pixel_count(&self) -> usize {
        self.config.pixel_count()
    }

    /// The PWM values last produced by `update_pixels`.
    pub fn channels(&self) -> &[u8; BUFFER_SIZE] {
        &self.state.channels
    }

    /// Gamma-correct `pixels` into the channel buffer through the channel map.
    fn map_pixels(&mut self, pixels: &[RGB8]) -> Result<(), IS31FL3741Error> {
        match channels_for_pixels(pixels.len()) {
            Some(channels) if channels <= BUFFER_SIZE => {}
            _ => {
                #[cfg(feature = "defmt")]
                defmt::error!("{} pixels do not fit {} channels", pixels.len(), BUFFER_SIZE);
                return Err(IS31FL3741Error::CapacityError);
            }
        }

        let gamma = self.config.gamma;
        for (pixel, offsets) in pixels.iter().zip(self.config.rgb_map.chunks_exact(3)) {
            self.state.channels[offsets[0] as usize] = gamma[pixel.r as usize];
            self.state.channels[offsets[1] as usize] = gamma[pixel.g as usize];
            self.state.channels[offsets[2] as usize] = gamma[pixel.b as usize];
        }

        Ok(())
    }

    /// Scaling register contents: the configured colour scaling on every
    /// mapped channel, zero elsewhere.
    fn scaling_frame(&self) -> [u8; BUFFER_SIZE] {
        let scaling = self.config.scaling;
        let mut frame = [0; BUFFER_SIZE];

        for offsets in self.config.rgb_map.chunks_exact(3) {
            frame[offsets[0] as usize] = scaling.red;
            frame[offsets[1] as usize] = scaling.green;
            frame[offsets[2] as usize] = scaling.blue;
        }

        frame
    }
}

fn check_capacity(channels: usize) -> Result<(), IS31FL3741Error> {
    if channels > BUFFER_SIZE {
        #[cfg(feature = "defmt")]
        defmt::error!("{} channels do not fit {}", channels, BUFFER_SIZE);
        return Err(IS31FL3741Error::CapacityError);
    }
    Ok(())
}

impl<BUS: embedded_hal::i2c::I2c, SDB: OutputPin> IS31FL3741<BUS, SDB, Blocking> {
    pub fn new_blocking(bus: BUS, sdb: SDB, config: DeviceConfig) -> Self {
        Self::new(Some(bus), Some(sdb), config)
    }

    fn burst_write(&mut self, register: u8, data: &[u8]) -> Result<(), IS31FL3741Error> {
        let address = self.config.address;
        let bus = self.bus.as_mut().ok_or(IS31FL3741Error::NotFound)?;

        bus.transaction(
            address,
            &mut [Operation::Write(&[register]), Operation::Write(data)],
        )
        .map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Failed writing {} bytes from register {=u8:#x} on device {=u8:#x}: {}",
                data.len(),
                register,
                address,
                embedded_hal::i2c::Error::kind(&_e)
            );
            IS31FL3741Error::IoError
        })
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), IS31FL3741Error> {
        self.burst_write(register, &[value])
    }

    /// Unlock the page register
    fn unlock(&mut self) -> Result<(), IS31FL3741Error> {
        self.write_register(COMMAND_WRITE_LOCK_REGISTER, COMMAND_WRITE_UNLOCK)
    }

    /// Select the register page following writes go to. The page is
    /// written every time, never assumed from an earlier selection.
    ///
    /// # Arguments
    /// * `page` - The page to select
    ///
    /// # Returns
    /// * Ok(()) if both the unlock and the page write succeeded
    /// * Err(IS31FL3741Error::IoError) otherwise, the selected page is then unknown
    pub fn select_page(&mut self, page: Page) -> Result<(), IS31FL3741Error> {
        self.unlock()?;
        self.write_register(COMMAND_REGISTER, page as u8)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Selected page {}", page);

        Ok(())
    }

    /// Write `data` from register 0 of `first`, spilling everything past
    /// the page break onto register 0 of `second`.
    fn write_pages(
        &mut self,
        first: Page,
        second: Page,
        data: &[u8],
    ) -> Result<(), IS31FL3741Error> {
        let (head, tail) = data.split_at(data.len().min(PAGE_BREAK));

        self.select_page(first)?;
        self.burst_write(0x00, head)?;

        if tail.is_empty() {
            return Ok(());
        }

        self.select_page(second)?;
        self.burst_write(0x00, tail)
    }

    /// Power up and configure the device. Must run once before any update.
    ///
    /// Drives SDB high, resets the chip, programs the configuration and
    /// global current registers, then loads the colour scaling of every
    /// mapped channel. The channel buffer is zeroed afterwards.
    ///
    /// # Returns
    /// * Ok(()) if the device was initialized successfully
    /// * Err(IS31FL3741Error::NotFound) if the bus or the SDB pin is missing
    /// * Err(IS31FL3741Error::IoError) if any pin or bus write failed; the
    ///   chip is then partially configured and the whole sequence must be
    ///   restarted
    pub fn initialize(&mut self) -> Result<(), IS31FL3741Error> {
        if self.bus.is_none() {
            #[cfg(feature = "defmt")]
            defmt::error!("I2C bus for device {=u8:#x} not found", self.config.address);
            return Err(IS31FL3741Error::NotFound);
        }

        let Some(sdb) = self.sdb.as_mut() else {
            #[cfg(feature = "defmt")]
            defmt::error!("SDB pin for device {=u8:#x} not found", self.config.address);
            return Err(IS31FL3741Error::NotFound);
        };

        sdb.set_high().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "SDB pin for device {=u8:#x} cannot be pulled high: {}",
                self.config.address,
                embedded_hal::digital::Error::kind(&_e)
            );
            IS31FL3741Error::IoError
        })?;

        self.select_page(Page::Function)?;
        self.write_register(RESET_REGISTER, RESET_VALUE)?;

        // The reset drops the page selection
        self.select_page(Page::Function)?;
        self.write_register(CONFIGURATION_REGISTER, self.config.sw_setting.configuration())?;
        self.write_register(GCC_REGISTER, self.config.global_current)?;

        let scaling = self.scaling_frame();
        self.write_pages(Page::ScalingA, Page::ScalingB, &scaling)?;

        // Keep scaling values out of the PWM pages
        self.state.channels.fill(0);

        #[cfg(feature = "defmt")]
        defmt::debug!("IS31FL3741 {=u8:#x} initialized", self.config.address);

        Ok(())
    }

    /// Set the global current control
    ///
    /// # Arguments
    /// * `gcc` - The global current control value
    ///
    /// # Returns
    /// * Ok(()) if the global current control was set successfully
    pub fn set_global_current_control(&mut self, gcc: u8) -> Result<(), IS31FL3741Error> {
        self.select_page(Page::Function)?;
        self.write_register(GCC_REGISTER, gcc)
    }

    /// Write raw PWM values, channel `n` of `channels` going to channel
    /// register `n`. The channel buffer is left untouched.
    ///
    /// # Returns
    /// * Ok(()) if every channel was written
    /// * Err(IS31FL3741Error::CapacityError) if there are more channels than
    ///   registers, nothing is written
    /// * Err(IS31FL3741Error::IoError) if a transfer failed; channels on the
    ///   first PWM page may already be updated, resend the whole frame
    pub fn update_channels(&mut self, channels: &[u8]) -> Result<(), IS31FL3741Error> {
        check_capacity(channels.len())?;

        self.write_pages(Page::PwmA, Page::PwmB, channels)
    }

    /// Map `pixels` onto their channels through the gamma table and the
    /// channel map, then send the full channel buffer.
    ///
    /// # Returns
    /// * Ok(()) if the frame was written
    /// * Err(IS31FL3741Error::CapacityError) if the pixels need more channels
    ///   than the chip has, neither the buffer nor the bus is touched
    /// * Err(IS31FL3741Error::IoError) if a transfer failed, the buffer
    ///   already holds the new frame
    pub fn update_pixels(&mut self, pixels: &[RGB8]) -> Result<(), IS31FL3741Error> {
        self.map_pixels(pixels)?;

        let channels = self.state.channels;
        self.update_channels(&channels)
    }
}

impl<BUS: embedded_hal::i2c::I2c, SDB: OutputPin> SmartLedsWrite
    for IS31FL3741<BUS, SDB, Blocking>
{
    type Error = IS31FL3741Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let mut pixels: heapless::Vec<RGB8, MAX_PIXELS> = heapless::Vec::new();

        for pixel in iterator {
            pixels
                .push(pixel.into())
                .map_err(|_| IS31FL3741Error::CapacityError)?;
        }

        self.update_pixels(&pixels)
    }
}

impl<BUS: embedded_hal_async::i2c::I2c, SDB: OutputPin> IS31FL3741<BUS, SDB, Async> {
    pub fn new_async(bus: BUS, sdb: SDB, config: DeviceConfig) -> Self {
        Self::new(Some(bus), Some(sdb), config)
    }

    async fn burst_write(&mut self, register: u8, data: &[u8]) -> Result<(), IS31FL3741Error> {
        let address = self.config.address;
        let bus = self.bus.as_mut().ok_or(IS31FL3741Error::NotFound)?;

        bus.transaction(
            address,
            &mut [Operation::Write(&[register]), Operation::Write(data)],
        )
        .await
        .map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Failed writing {} bytes from register {=u8:#x} on device {=u8:#x}: {}",
                data.len(),
                register,
                address,
                embedded_hal::i2c::Error::kind(&_e)
            );
            IS31FL3741Error::IoError
        })
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), IS31FL3741Error> {
        self.burst_write(register, &[value]).await
    }

    /// Unlock the page register
    async fn unlock(&mut self) -> Result<(), IS31FL3741Error> {
        self.write_register(COMMAND_WRITE_LOCK_REGISTER, COMMAND_WRITE_UNLOCK)
            .await
    }

    /// Select the register page following writes go to. The page is
    /// written every time, never assumed from an earlier selection.
    pub async fn select_page(&mut self, page: Page) -> Result<(), IS31FL3741Error> {
        self.unlock().await?;
        self.write_register(COMMAND_REGISTER, page as u8).await?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Selected page {}", page);

        Ok(())
    }

    async fn write_pages(
        &mut self,
        first: Page,
        second: Page,
        data: &[u8],
    ) -> Result<(), IS31FL3741Error> {
        let (head, tail) = data.split_at(data.len().min(PAGE_BREAK));

        self.select_page(first).await?;
        self.burst_write(0x00, head).await?;

        if tail.is_empty() {
            return Ok(());
        }

        self.select_page(second).await?;
        self.burst_write(0x00, tail).await
    }

    /// Power up and configure the device, as the blocking `initialize`.
    pub async fn initialize(&mut self) -> Result<(), IS31FL3741Error> {
        if self.bus.is_none() {
            #[cfg(feature = "defmt")]
            defmt::error!("I2C bus for device {=u8:#x} not found", self.config.address);
            return Err(IS31FL3741Error::NotFound);
        }

        let Some(sdb) = self.sdb.as_mut() else {
            #[cfg(feature = "defmt")]
            defmt::error!("SDB pin for device {=u8:#x} not found", self.config.address);
            return Err(IS31FL3741Error::NotFound);
        };

        sdb.set_high().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "SDB pin for device {=u8:#x} cannot be pulled high: {}",
                self.config.address,
                embedded_hal::digital::Error::kind(&_e)
            );
            IS31FL3741Error::IoError
        })?;

        self.select_page(Page::Function).await?;
        self.write_register(RESET_REGISTER, RESET_VALUE).await?;

        // The reset drops the page selection
        self.select_page(Page::Function).await?;
        self.write_register(CONFIGURATION_REGISTER, self.config.sw_setting.configuration())
            .await?;
        self.write_register(GCC_REGISTER, self.config.global_current)
            .await?;

        let scaling = self.scaling_frame();
        self.write_pages(Page::ScalingA, Page::ScalingB, &scaling)
            .await?;

        self.state.channels.fill(0);

        #[cfg(feature = "defmt")]
        defmt::debug!("IS31FL3741 {=u8:#x} initialized", self.config.address);

        Ok(())
    }

    pub async fn set_global_current_control(&mut self, gcc: u8) -> Result<(), IS31FL3741Error> {
        self.select_page(Page::Function).await?;
        self.write_register(GCC_REGISTER, gcc).await
    }

    /// Write raw PWM values, as the blocking `update_channels`.
    pub async fn update_channels(&mut self, channels: &[u8]) -> Result<(), IS31FL3741Error> {
        check_capacity(channels.len())?;

        self.write_pages(Page::PwmA, Page::PwmB, channels).await
    }

    /// Map and send `pixels`, as the blocking `update_pixels`.
    pub async fn update_pixels(&mut self, pixels: &[RGB8]) -> Result<(), IS31FL3741Error> {
        self.map_pixels(pixels)?;

        let channels = self.state.channels;
        self.update_channels(&channels).await
    }
}
