//! Raw register device access
//!
//! [`RegisterIo`] is the seam between the access framing in
//! [`Board`](crate::Board) and whatever actually moves the bytes: the
//! driver's character device or the in-memory [`sim`](crate::sim) device.
//!
//! Implementations perform exactly one device call per method and never
//! retry. Ordering (select, then one transfer) is enforced by the caller.

use crate::register::Register;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

/// Size of one register transfer in bytes
pub const WORD_SIZE: usize = 4;

/// Low-level register device
pub trait RegisterIo {
    /// Point subsequent transfers at `register`
    fn select(&mut self, register: Register) -> io::Result<()>;

    /// Write one native-endian word, returning the number of bytes moved
    fn write(&mut self, value: u32) -> io::Result<usize>;

    /// Read one native-endian word into `value`, returning the number of bytes moved
    ///
    /// `value` is only updated when a full word was read.
    fn read(&mut self, value: &mut u32) -> io::Result<usize>;

    /// Human-readable description used in logs
    fn describe(&self) -> String {
        "register device".to_string()
    }
}

/// The board driver's character device node
#[derive(Debug)]
pub struct CharDevice {
    file: File,
    path: PathBuf,
}

impl CharDevice {
    /// Open the device node for reading and writing
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterIo for CharDevice {
    fn select(&mut self, register: Register) -> io::Result<()> {
        // SAFETY: the descriptor is owned by `self.file` and stays open for
        // the duration of the call; the select commands take no argument.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), register.select_code() as _) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn write(&mut self, value: u32) -> io::Result<usize> {
        self.file.write(&value.to_ne_bytes())
    }

    fn read(&mut self, value: &mut u32) -> io::Result<usize> {
        let mut buf = [0u8; WORD_SIZE];
        let moved = self.file.read(&mut buf)?;
        if moved == WORD_SIZE {
            *value = u32::from_ne_bytes(buf);
        }
        Ok(moved)
    }

    fn describe(&self) -> String {
        format!("{} (fd={})", self.path.display(), self.file.as_raw_fd())
    }
}
