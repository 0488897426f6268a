mod scan;

use dotenv::dotenv;
use eyre::WrapErr;
use log::{debug, info, warn};
use sysinfo::System;
use fidget::config::Config;
use fidget::keymap::Command;
use fidget_hal::I2cDriver;
use fidget_hal::dev::DevI2cDriver;
use fidget_hal::loopback::LoopbackI2cDriver;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    let config_path = Config::path();
    debug!("Loading config from {}...", config_path.display());
    let config = Config::load_or_create(&config_path, |key| dotenv::var(key).ok())?;

    let driver: Box<dyn I2cDriver> = if config.dry_run {
        Box::new(LoopbackI2cDriver::new(config.bus))
    } else {
        Box::new(
            DevI2cDriver::new(config.bus)
                .wrap_err_with(|| format!("failed to open /dev/i2c-{}", config.bus))?,
        )
    };
    debug!("{:?} initialized.", driver);

    info!("Scanning bus {}...", driver.bus());
    let present = scan::scan(&*driver);
    println!("{}", scan::render_grid(&present));
    info!("{} device(s) answered.", present.len());

    if !scan::answers(&*driver, config.slave_address) {
        warn!("Nothing answered at the slave address {:#04x}.", config.slave_address);
    }

    let stop = Command::Stop.value();
    let device = driver.get_device(config.slave_address)?;
    device.write_byte(stop).wrap_err("failed to send stop command")?;
    println!("Sent to slave: {}", stop);

    match device.read_byte() {
        Ok(status) => println!("Received from slave: {}", status),
        Err(e) => warn!("No status from slave: {}", e),
    }

    Ok(())
}
