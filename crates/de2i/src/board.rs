//! Device handle and register access framing
//!
//! Every access goes through [`Board::write`] or [`Board::read`], which issue
//! one select immediately followed by one 4-byte transfer. Nothing else can
//! reach the device in between, so a transfer always lands on the register
//! that was just selected.
//!
//! A board opened without hardware (see [`Board::absent`]) accepts every
//! call and does nothing, which lets the game run on machines without the
//! FPGA.

use crate::error::{HardwareError, HardwareResult};
use crate::io::{CharDevice, RegisterIo, WORD_SIZE};
use crate::register::Register;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Running totals of failed accesses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounters {
    /// Accesses that completed with a full word moved
    pub completed: u64,
    /// Failed select calls (transfer suppressed)
    pub selects: u64,
    /// Failed read/write calls
    pub transfers: u64,
    /// Transfers that moved fewer than 4 bytes
    pub short_transfers: u64,
}

impl FaultCounters {
    pub fn failures(&self) -> u64 {
        self.selects + self.transfers + self.short_transfers
    }
}

/// Handle to the FPGA board
pub struct Board {
    io: Option<Box<dyn RegisterIo + Send>>,
    faults: FaultCounters,
    healthy: [bool; Register::ALL.len()],
}

impl Board {
    /// Board without hardware: every access is a successful no-op
    pub fn absent() -> Self {
        Self {
            io: None,
            faults: FaultCounters::default(),
            healthy: [true; Register::ALL.len()],
        }
    }

    /// Board backed by an arbitrary register device
    pub fn with_io(io: Box<dyn RegisterIo + Send>) -> Self {
        Self {
            io: Some(io),
            ..Self::absent()
        }
    }

    /// Open the driver's device node
    pub fn open(path: impl AsRef<Path>) -> HardwareResult<Self> {
        let path = path.as_ref();
        let device = CharDevice::open(path).map_err(|source| HardwareError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        info!("FPGA device opened: {}", device.describe());
        Ok(Self::with_io(Box::new(device)))
    }

    /// Open the device node, falling back to an absent board
    pub fn open_or_absent(path: impl AsRef<Path>) -> Self {
        match Self::open(path) {
            Ok(board) => board,
            Err(e) => {
                warn!("{e}; continuing without FPGA features");
                Self::absent()
            }
        }
    }

    pub fn is_present(&self) -> bool {
        self.io.is_some()
    }

    pub fn faults(&self) -> FaultCounters {
        self.faults
    }

    /// Select `register` and write `value` to it
    ///
    /// An absent board accepts any write, including one to an input register.
    pub fn write(&mut self, register: Register, value: u32) -> HardwareResult<()> {
        let Some(io) = self.io.as_mut() else {
            return Ok(());
        };
        if !register.is_writable() {
            return Err(HardwareError::Direction { register });
        }

        let result = access(&mut **io, register, |io| io.write(value));
        self.record(register, result)
    }

    /// Select `register` and read its current value
    ///
    /// Returns `Ok(None)` when no hardware is present, whatever the register.
    pub fn read(&mut self, register: Register) -> HardwareResult<Option<u32>> {
        let Some(io) = self.io.as_mut() else {
            return Ok(None);
        };
        if !register.is_readable() {
            return Err(HardwareError::Direction { register });
        }

        let mut value = 0;
        let result = access(&mut **io, register, |io| io.read(&mut value));
        self.record(register, result).map(|()| Some(value))
    }

    /// Release the device handle
    pub fn close(self) {
        if let Some(io) = self.io {
            info!("FPGA device closed: {}", io.describe());
        }
    }

    fn record(&mut self, register: Register, result: HardwareResult<()>) -> HardwareResult<()> {
        let healthy = &mut self.healthy[register.index()];
        match &result {
            Ok(()) => {
                self.faults.completed += 1;
                if !*healthy {
                    info!("{register} responding again");
                    *healthy = true;
                }
            }
            Err(e) => {
                match e {
                    HardwareError::Select { .. } => self.faults.selects += 1,
                    HardwareError::Transfer { .. } => self.faults.transfers += 1,
                    HardwareError::ShortTransfer { .. } => self.faults.short_transfers += 1,
                    HardwareError::DeviceOpen { .. } | HardwareError::Direction { .. } => {}
                }
                if *healthy {
                    warn!("{e}");
                    *healthy = false;
                } else {
                    debug!("{e}");
                }
            }
        }
        result
    }
}

/// One select immediately followed by one transfer
fn access<D, F>(io: &mut D, register: Register, transfer: F) -> HardwareResult<()>
where
    D: RegisterIo + ?Sized,
    F: FnOnce(&mut D) -> io::Result<usize>,
{
    io.select(register)
        .map_err(|source| HardwareError::Select { register, source })?;
    let moved = transfer(io).map_err(|source| HardwareError::Transfer { register, source })?;
    if moved != WORD_SIZE {
        return Err(HardwareError::ShortTransfer { register, moved });
    }
    Ok(())
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("device", &self.io.as_ref().map(|io| io.describe()))
            .field("faults", &self.faults)
            .finish()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::absent()
    }
}
