//! In-memory stand-in for the board
//!
//! [`SimulatedDevice`] behaves like the driver: a select picks the register,
//! the next transfer reads or writes it. Its state is shared with a
//! [`SimHandle`] so tests (and the `--simulate` mode of the game) can look at
//! what was written, feed switch/button values, and inject faults after the
//! device has been boxed into a [`Board`](crate::Board).
//!
//! # Example
//!
//! ```
//! use de2i::sim::{Access, SimulatedDevice};
//! use de2i::{Board, Register};
//!
//! let (device, handle) = SimulatedDevice::new();
//! let mut board = Board::with_io(Box::new(device));
//!
//! board.write(Register::RedLeds, 0b11)?;
//! assert_eq!(handle.output(Register::RedLeds), 0b11);
//! assert_eq!(handle.log()[0], Access::Select(Register::RedLeds));
//! # Ok::<(), de2i::HardwareError>(())
//! ```

use crate::io::{RegisterIo, WORD_SIZE};
use crate::register::Register;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded device call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Select(Register),
    Write(Register, u32),
    Read(Register),
}

impl Access {
    pub fn register(&self) -> Register {
        match *self {
            Access::Select(r) | Access::Write(r, _) | Access::Read(r) => r,
        }
    }

    pub fn is_transfer(&self) -> bool {
        !matches!(self, Access::Select(_))
    }
}

/// Fault injected on a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The select ioctl fails
    Select,
    /// The read/write call fails
    Transfer,
    /// The read/write call moves only this many bytes
    Short(usize),
}

#[derive(Debug, Default)]
struct SimState {
    registers: [u32; Register::ALL.len()],
    faults: HashMap<Register, Fault>,
    log: Vec<Access>,
    logging: bool,
}

/// Simulated register device
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
    selected: Option<Register>,
}

/// Shared view of a [`SimulatedDevice`]
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedDevice {
    /// New device recording every call in its access log
    pub fn new() -> (Self, SimHandle) {
        Self::build(true)
    }

    /// New device that keeps register values but no access log
    ///
    /// Suitable for long-running sessions.
    pub fn quiet() -> (Self, SimHandle) {
        Self::build(false)
    }

    fn build(logging: bool) -> (Self, SimHandle) {
        let state = Arc::new(Mutex::new(SimState {
            logging,
            ..SimState::default()
        }));
        let handle = SimHandle {
            state: Arc::clone(&state),
        };
        (
            Self {
                state,
                selected: None,
            },
            handle,
        )
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn selected(&self) -> io::Result<Register> {
        self.selected
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no register selected"))
    }
}

impl RegisterIo for SimulatedDevice {
    fn select(&mut self, register: Register) -> io::Result<()> {
        let mut state = self.state();
        state.record(Access::Select(register));
        if state.faults.get(&register) == Some(&Fault::Select) {
            return Err(io::Error::other(format!("injected select fault on {register}")));
        }
        drop(state);
        self.selected = Some(register);
        Ok(())
    }

    fn write(&mut self, value: u32) -> io::Result<usize> {
        let register = self.selected()?;
        let mut state = self.state();
        state.record(Access::Write(register, value));
        if !register.is_writable() {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        match state.faults.get(&register) {
            Some(Fault::Transfer) => {
                Err(io::Error::other(format!("injected write fault on {register}")))
            }
            Some(Fault::Short(n)) => Ok((*n).min(WORD_SIZE)),
            _ => {
                state.registers[register.index()] = value;
                Ok(WORD_SIZE)
            }
        }
    }

    fn read(&mut self, value: &mut u32) -> io::Result<usize> {
        let register = self.selected()?;
        let mut state = self.state();
        state.record(Access::Read(register));
        if !register.is_readable() {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        match state.faults.get(&register) {
            Some(Fault::Transfer) => {
                Err(io::Error::other(format!("injected read fault on {register}")))
            }
            Some(Fault::Short(n)) => Ok((*n).min(WORD_SIZE)),
            _ => {
                *value = state.registers[register.index()];
                Ok(WORD_SIZE)
            }
        }
    }

    fn describe(&self) -> String {
        "simulated board".to_string()
    }
}

impl SimState {
    fn record(&mut self, access: Access) {
        if self.logging {
            self.log.push(access);
        }
    }
}

impl SimHandle {
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last value successfully written to an output register
    pub fn output(&self, register: Register) -> u32 {
        self.state().registers[register.index()]
    }

    /// Value the next read of an input register returns
    pub fn set_input(&self, register: Register, value: u32) {
        self.state().registers[register.index()] = value;
    }

    pub fn inject(&self, register: Register, fault: Fault) {
        self.state().faults.insert(register, fault);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Every device call made so far, oldest first
    pub fn log(&self) -> Vec<Access> {
        self.state().log.clone()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }
}
