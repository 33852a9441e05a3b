//! Addressable board registers
//!
//! The driver multiplexes every peripheral behind one device node. An
//! `ioctl` carrying the register's select code chooses which peripheral the
//! next `read` or `write` reaches.
//!
//! | Register       | Direction | Select code         |
//! |----------------|-----------|---------------------|
//! | `Switches`     | read      | `_IO('a', 'a')`     |
//! | `PushButtons`  | read      | `_IO('a', 'b')`     |
//! | `LeftDisplay`  | write     | `_IO('a', 'c')`     |
//! | `RightDisplay` | write     | `_IO('a', 'd')`     |
//! | `RedLeds`      | write     | `_IO('a', 'e')`     |
//! | `GreenLeds`    | write     | `_IO('a', 'f')`     |

use std::fmt;

/// Magic number shared by all of the driver's commands
const IOCTL_TYPE: u8 = b'a';

/// Encode a no-argument ioctl request (`_IO(ty, nr)` on Linux)
const fn io(ty: u8, nr: u8) -> u32 {
    ((ty as u32) << 8) | nr as u32
}

/// Transfer direction supported by a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Board to host (switches, buttons)
    Read,
    /// Host to board (LEDs, displays)
    Write,
}

/// One of the board's addressable endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// 18 red LEDs, bit n lights LEDR[n]
    RedLeds,
    /// 9 green LEDs, bit n lights LEDG[n]
    GreenLeds,
    /// Left seven-segment bank (active-low)
    LeftDisplay,
    /// Right seven-segment bank (active-low)
    RightDisplay,
    /// Slide switches SW0..SW17
    Switches,
    /// Push buttons KEY0..KEY3 (active-low)
    PushButtons,
}

impl Register {
    /// Every register, in select-code order
    pub const ALL: [Register; 6] = [
        Register::Switches,
        Register::PushButtons,
        Register::LeftDisplay,
        Register::RightDisplay,
        Register::RedLeds,
        Register::GreenLeds,
    ];

    /// Write-capable registers
    pub const OUTPUTS: [Register; 4] = [
        Register::RedLeds,
        Register::GreenLeds,
        Register::LeftDisplay,
        Register::RightDisplay,
    ];

    /// Read-capable registers
    pub const INPUTS: [Register; 2] = [Register::Switches, Register::PushButtons];

    /// Driver-defined select command for this register
    pub const fn select_code(self) -> u32 {
        match self {
            Register::Switches => io(IOCTL_TYPE, b'a'),
            Register::PushButtons => io(IOCTL_TYPE, b'b'),
            Register::LeftDisplay => io(IOCTL_TYPE, b'c'),
            Register::RightDisplay => io(IOCTL_TYPE, b'd'),
            Register::RedLeds => io(IOCTL_TYPE, b'e'),
            Register::GreenLeds => io(IOCTL_TYPE, b'f'),
        }
    }

    pub const fn direction(self) -> Direction {
        match self {
            Register::Switches | Register::PushButtons => Direction::Read,
            _ => Direction::Write,
        }
    }

    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self.direction(), Direction::Read)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self.direction(), Direction::Write)
    }

    /// Dense index, usable for per-register tables
    pub const fn index(self) -> usize {
        match self {
            Register::Switches => 0,
            Register::PushButtons => 1,
            Register::LeftDisplay => 2,
            Register::RightDisplay => 3,
            Register::RedLeds => 4,
            Register::GreenLeds => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::RedLeds => "red-leds",
            Register::GreenLeds => "green-leds",
            Register::LeftDisplay => "left-display",
            Register::RightDisplay => "right-display",
            Register::Switches => "switches",
            Register::PushButtons => "push-buttons",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
