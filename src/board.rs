//! Board Serial Bring-up
//!
//! Default port configuration for the three board UARTs, console/TTY role
//! assignment, and the boot-time registration sequence.
//!
//! # Board UARTs
//! ```text
//! UART0  Tx PA_21  Rx PA_22  IRQ 50  (slot 0, KM4 uart0)
//! UART1  Tx PA_12  Rx PA_13  IRQ 51  (slot 3, KM0 luart)
//! UART2  Tx PA_7   Rx PA_8   IRQ 19  (slot 2, KM0 log uart)
//! ```

use crate::serial::config::PortConfig;
use crate::serial::error::{Result, SerialError};
use crate::serial::hal::HardwareFactory;
use crate::serial::pins::PinName;
use crate::serial::port::{UartOps, UartPort};

pub const UART0_IRQ: u32 = 50;
pub const UART1_IRQ: u32 = 51;
pub const LOG_UART_IRQ: u32 = 19;

/// Device path of the system console.
pub const CONSOLE_PATH: &str = "/dev/console";

/// Device paths of the serial terminals, in role order.
pub const TTY_PATHS: [&str; 3] = ["/dev/ttyS0", "/dev/ttyS1", "/dev/ttyS2"];

/// A UART exposed by the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoardUart {
    Uart0,
    Uart1,
    Uart2,
}

impl BoardUart {
    /// All board UARTs, in assignment priority order.
    pub const ALL: [Self; 3] = [Self::Uart0, Self::Uart1, Self::Uart2];

    /// Default configuration of this UART.
    pub const fn default_config(self) -> PortConfig {
        match self {
            Self::Uart0 => PortConfig::new(PinName::PA_21, PinName::PA_22, UART0_IRQ),
            Self::Uart1 => PortConfig::new(PinName::PA_12, PinName::PA_13, UART1_IRQ),
            Self::Uart2 => PortConfig::new(PinName::PA_7, PinName::PA_8, LOG_UART_IRQ),
        }
    }
}

/// Which UARTs are in use, and which one carries the console.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoardSerialConfig {
    pub uart0: bool,
    pub uart1: bool,
    pub uart2: bool,
    pub console: Option<BoardUart>,
}

impl BoardSerialConfig {
    /// The log UART as console, other UARTs off.
    pub const fn log_console() -> Self {
        Self {
            uart0: false,
            uart1: false,
            uart2: true,
            console: Some(BoardUart::Uart2),
        }
    }

    /// Check whether a UART is in use. The console UART always is.
    pub fn is_enabled(&self, uart: BoardUart) -> bool {
        let enabled = match uart {
            BoardUart::Uart0 => self.uart0,
            BoardUart::Uart1 => self.uart1,
            BoardUart::Uart2 => self.uart2,
        };
        enabled || self.console == Some(uart)
    }
}

impl Default for BoardSerialConfig {
    fn default() -> Self {
        Self::log_console()
    }
}

/// Role each UART plays after assignment.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Roles {
    pub console: Option<BoardUart>,
    /// `ttys[n]` backs `/dev/ttySn`.
    pub ttys: [Option<BoardUart>; 3],
}

/// Assign console and TTY roles.
///
/// The console UART is ttyS0. Remaining enabled UARTs fill ttyS1 and
/// ttyS2 in UART0, UART1, UART2 order. Without a console the lowest enabled
/// UART becomes ttyS0.
pub fn assign_roles(cfg: &BoardSerialConfig) -> Roles {
    let mut roles = Roles {
        console: cfg.console,
        ttys: [None; 3],
    };

    let mut next = 0;
    if let Some(console) = cfg.console {
        roles.ttys[0] = Some(console);
        next = 1;
    }
    for uart in BoardUart::ALL {
        if next == roles.ttys.len() {
            break;
        }
        if cfg.is_enabled(uart) && cfg.console != Some(uart) {
            roles.ttys[next] = Some(uart);
            next += 1;
        }
    }
    roles
}

/// Device registration surface of the serial core.
///
/// Ports registered as the console arrive already set up.
pub trait Registrar<'a, 'r, F: HardwareFactory> {
    fn register(&mut self, path: &'static str, port: &'a UartPort<'r, F>) -> Result<()>;
}

/// The board's ports, one per UART that has been constructed.
pub struct BoardPorts<'a, 'r, F: HardwareFactory> {
    pub uart0: Option<&'a UartPort<'r, F>>,
    pub uart1: Option<&'a UartPort<'r, F>>,
    pub uart2: Option<&'a UartPort<'r, F>>,
}

impl<'a, 'r, F: HardwareFactory> BoardPorts<'a, 'r, F> {
    pub fn get(&self, uart: BoardUart) -> Option<&'a UartPort<'r, F>> {
        match uart {
            BoardUart::Uart0 => self.uart0,
            BoardUart::Uart1 => self.uart1,
            BoardUart::Uart2 => self.uart2,
        }
    }

    fn require(&self, uart: BoardUart) -> Result<&'a UartPort<'r, F>> {
        self.get(uart).ok_or_else(|| {
            log::error!("serial: {:?} has a role but no port", uart);
            SerialError::InvalidArgument
        })
    }
}

/// Register the console and terminal devices.
///
/// The console port is marked and set up before it is registered so the
/// console works before anything opens it.
pub fn serial_init<'a, 'r, F, R>(ports: &BoardPorts<'a, 'r, F>, roles: &Roles, registrar: &mut R) -> Result<()>
where
    F: HardwareFactory,
    R: Registrar<'a, 'r, F>,
{
    if let Some(uart) = roles.console {
        let port = ports.require(uart)?;
        port.set_console(true);
        port.setup()?;
        registrar.register(CONSOLE_PATH, port)?;
        log::info!("serial: {:?} registered as {}", uart, CONSOLE_PATH);
    }

    for (path, uart) in TTY_PATHS.into_iter().zip(roles.ttys) {
        if let Some(uart) = uart {
            registrar.register(path, ports.require(uart)?)?;
            log::info!("serial: {:?} registered as {}", uart, path);
        }
    }
    Ok(())
}
