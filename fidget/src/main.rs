use std::io;
use dotenv::dotenv;
use eyre::WrapErr;
use log::{debug, info, warn};
use fidget_hal::I2cDriver;
use fidget_hal::dev::DevI2cDriver;
use fidget_hal::keyboard::TerminalKeyboard;
use fidget_hal::loopback::LoopbackI2cDriver;
use fidget::app::App;
use fidget::config::Config;
use fidget::interrupt;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("Fidget v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = Config::path();
    debug!("Loading config from {}...", config_path.display());
    let config = Config::load_or_create(&config_path, |key| dotenv::var(key).ok())?;

    info!(
        "Slave @ bus {}, address {:#04x}, polling every {}ms{}",
        config.bus,
        config.slave_address,
        config.poll_interval_ms,
        if config.dry_run { " (dry run)" } else { "" },
    );

    debug!("Initializing I2C driver...");
    let driver: Box<dyn I2cDriver> = if config.dry_run {
        Box::new(LoopbackI2cDriver::new(config.bus))
    } else {
        Box::new(
            DevI2cDriver::new(config.bus)
                .wrap_err_with(|| format!("failed to open /dev/i2c-{}", config.bus))?,
        )
    };
    debug!("{:?} initialized.", driver);

    let device = driver.get_device(config.slave_address)?;
    debug!("{:?} claimed.", device);

    interrupt::install().wrap_err("failed to install SIGINT handler")?;

    let mut keyboard = TerminalKeyboard::new();
    if !keyboard.is_tty() {
        warn!("stdin is not a terminal; reading keys from the input stream as-is.");
    }

    let mut stdout = io::stdout();
    let mut app = App::new(config, &*device, &mut keyboard, &mut stdout);
    app.run(interrupt::interrupted)?;

    Ok(())
}
