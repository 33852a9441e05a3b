//! Hardware error types

use crate::register::Register;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single device operation
#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("cannot open FPGA device {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("select {register} failed: {source}")]
    Select {
        register: Register,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer on {register} failed: {source}")]
    Transfer {
        register: Register,
        #[source]
        source: std::io::Error,
    },

    #[error("short transfer on {register}: {moved} of 4 bytes")]
    ShortTransfer { register: Register, moved: usize },

    #[error("{register} cannot be accessed in that direction")]
    Direction { register: Register },
}

pub type HardwareResult<T> = Result<T, HardwareError>;
