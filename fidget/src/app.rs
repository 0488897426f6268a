//! The module for the main control loop.

use std::io::Write;
use std::thread;
use log::{debug, info, warn};
use time::OffsetDateTime;
use time::macros::format_description;
use fidget_hal::{HalResult, I2cDevice};
use fidget_hal::keyboard::{Key, Keyboard};
use crate::config::Config;
use crate::keymap::{Command, EXIT_KEY};

/// The outcome of a single poll.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// Keep polling.
    Continue,
    /// The operator asked to stop, or there is no more input.
    Terminate,
}

/// Counters kept over one session.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionStats {
    /// Commands successfully written to the slave.
    pub sent: usize,
    /// Recognized status bytes read back from the slave.
    pub received: usize,
    /// Bus transfers that failed.
    pub bus_errors: usize,
}

/// The main app state struct.
pub struct App<'a> {
    /// The configuration for the app.
    config: Config,
    /// The microcontroller on the I2C bus.
    device: &'a dyn I2cDevice,
    /// Where keystrokes come from.
    keyboard: &'a mut dyn Keyboard,
    /// Where operator-facing messages go.
    out: &'a mut dyn Write,
    stats: SessionStats,
}

impl<'a> App<'a> {
    /// Creates a new instance of the App.
    pub fn new(
        config: Config,
        device: &'a dyn I2cDevice,
        keyboard: &'a mut dyn Keyboard,
        out: &'a mut dyn Write,
    ) -> App<'a> {
        App {
            config,
            device,
            keyboard,
            out,
            stats: SessionStats::default(),
        }
    }

    /// Prints the controls the operator can use.
    pub fn print_instructions(&mut self) -> HalResult<()> {
        const ORDER: [Command; 9] = [
            Command::Forward,
            Command::Backward,
            Command::SteerLeft,
            Command::SteerRight,
            Command::PivotLeft,
            Command::PivotRight,
            Command::CameraLeft,
            Command::CameraRight,
            Command::Stop,
        ];

        writeln!(self.out, "Program is running.\n")?;
        for command in ORDER {
            let key = match command.key() {
                ' ' => "Space".to_string(),
                key => key.to_ascii_uppercase().to_string(),
            };
            writeln!(self.out, "{} = {}", key, command.description())?;
        }
        writeln!(self.out, "{} = exit\n", EXIT_KEY.to_ascii_uppercase())?;
        self.out.flush()?;
        Ok(())
    }

    /// Polls a single key, forwards it to the slave if it maps to a command,
    /// and reads the slave status back.
    ///
    /// Bus failures are logged and do not stop the loop; keyboard and output
    /// failures are returned.
    pub fn step(&mut self) -> HalResult<Step> {
        let key = match self.keyboard.read_key()? {
            Key::Char(c) => c.to_ascii_lowercase(),
            Key::Interrupt => {
                info!("Interrupted from the keyboard.");
                return Ok(Step::Terminate);
            }
            Key::EndOfInput => {
                info!("Keyboard input closed.");
                return Ok(Step::Terminate);
            }
        };

        if key == EXIT_KEY {
            info!("Exit key pressed.");
            return Ok(Step::Terminate);
        }

        if let Some(command) = Command::from_key(key) {
            match self.device.write_byte(command.value()) {
                Ok(()) => {
                    self.stats.sent += 1;
                    debug!("{:?} sent to {:?}.", command, self.device);
                    writeln!(self.out, "Sent to slave: {}", command.value())?;
                }
                Err(e) => {
                    self.stats.bus_errors += 1;
                    warn!("Failed to send {:?}: {}", command, e);
                }
            }
        } else {
            debug!("Ignoring unmapped key {:?}.", key);
        }

        if self.config.read_status {
            match self.device.read_byte() {
                Ok(status) => match Command::from_value(status) {
                    Some(_) => {
                        self.stats.received += 1;
                        writeln!(self.out, "Received from slave: {}", status)?;
                    }
                    None => debug!("Ignoring unknown status {:#04x}.", status),
                },
                Err(e) => {
                    self.stats.bus_errors += 1;
                    warn!("Failed to read status: {}", e);
                }
            }
        }

        self.out.flush()?;
        Ok(Step::Continue)
    }

    /// Runs the control loop until the operator exits, input ends, or
    /// `interrupted` reports a signal.
    pub fn run(&mut self, interrupted: impl Fn() -> bool) -> HalResult<SessionStats> {
        let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

        self.print_instructions()?;

        loop {
            if interrupted() {
                info!("Interrupted by signal.");
                break;
            }

            if self.step()? == Step::Terminate {
                break;
            }

            thread::sleep(self.config.poll_interval());
        }

        writeln!(self.out, "\nProgram is terminated.")?;
        self.out.flush()?;

        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let started_str = started.format(&format).unwrap_or_else(|_| started.to_string());
        let elapsed = OffsetDateTime::now_utc() - started;
        info!(
            "Session started {} lasted {}s: {} sent, {} received, {} bus errors.",
            started_str,
            elapsed.whole_seconds(),
            self.stats.sent,
            self.stats.received,
            self.stats.bus_errors,
        );

        Ok(self.stats)
    }
}
