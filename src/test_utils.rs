use embedded_hal::digital;
use embedded_hal::i2c::{Error, ErrorKind, ErrorType, Operation};

use crate::is31fl3741::{Async, Blocking};

#[derive(Debug)]
pub enum FakeI2cError {
    Error,
}
impl Error for FakeI2cError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One register write as seen on the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub register: u8,
    pub len: usize,
}

pub struct FakeI2cBus<M> {
    pub write_data: heapless::Vec<u8, 2048>,
    pub transfers: heapless::Vec<Transfer, 64>,
    pub addresses: heapless::Vec<u8, 64>,
    fail_at: Option<usize>,
    attempts: usize,
    _phantom: core::marker::PhantomData<M>,
}

impl<M> ErrorType for FakeI2cBus<M> {
    type Error = FakeI2cError;
}

impl<M> FakeI2cBus<M> {
    pub fn new() -> Self {
        Self {
            write_data: heapless::Vec::new(),
            transfers: heapless::Vec::new(),
            addresses: heapless::Vec::new(),
            fail_at: None,
            attempts: 0,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Fail the `index`-th transaction (zero based) and every later one.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    pub fn write_data_as_ref(&self) -> &[u8] {
        self.write_data.as_slice()
    }

    pub fn transfers_as_ref(&self) -> &[Transfer] {
        self.transfers.as_slice()
    }

    fn record(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), FakeI2cError> {
        let attempt = self.attempts;
        self.attempts += 1;

        if self.fail_at.is_some_and(|index| attempt >= index) {
            return Err(FakeI2cError::Error);
        }

        let start = self.write_data.len();
        for operation in operations {
            match operation {
                Operation::Write(write) => {
                    self.write_data
                        .extend_from_slice(write)
                        .map_err(|_| FakeI2cError::Error)?;
                }
                Operation::Read(read) => read.fill(0),
            }
        }

        let written = &self.write_data[start..];
        let transfer = Transfer {
            register: written.first().copied().ok_or(FakeI2cError::Error)?,
            len: written.len() - 1,
        };
        self.transfers
            .push(transfer)
            .map_err(|_| FakeI2cError::Error)?;
        self.addresses
            .push(address)
            .map_err(|_| FakeI2cError::Error)?;

        Ok(())
    }
}

impl FakeI2cBus<Blocking> {
    pub fn new_blocking() -> Self {
        Self::new()
    }
}

impl FakeI2cBus<Async> {
    pub fn new_async() -> Self {
        Self::new()
    }
}

impl embedded_hal::i2c::I2c for FakeI2cBus<Blocking> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

impl embedded_hal_async::i2c::I2c for FakeI2cBus<Async> {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.record(address, operations)
    }
}

#[derive(Debug)]
pub enum FakePinError {
    Error,
}
impl digital::Error for FakePinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Default)]
pub struct FakePin {
    pub high: bool,
    pub fail: bool,
}

impl FakePin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            high: false,
            fail: true,
        }
    }
}

impl digital::ErrorType for FakePin {
    type Error = FakePinError;
}

impl digital::OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(FakePinError::Error);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err(FakePinError::Error);
        }
        self.high = true;
        Ok(())
    }
}

/// Channel map placing pixel `n` on offsets `3n`, `3n + 1`, `3n + 2`.
pub static IDENTITY_MAP: [u16; crate::config::BUFFER_SIZE] = {
    let mut map = [0; crate::config::BUFFER_SIZE];
    let mut i = 0;
    while i < crate::config::BUFFER_SIZE {
        map[i] = i as u16;
        i += 1;
    }
    map
};

pub static LINEAR_GAMMA: [u8; 256] = crate::config::linear_gamma();
