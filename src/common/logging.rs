//! Logging setup.
//!
//! Everything in the crate logs through the [`log`] facade. Binaries (and tests that want output)
//! call [`init`] once; it installs [`env_logger`] with this crate filtered at the given level,
//! unless the `RUST_LOG` environment variable already specifies a filter:
//!
//! ```sh
//! $> RUST_LOG=nequip_mm=trace nequip-mm eval --config potential.toml --structure water.xyz
//! ```

use log::LevelFilter;





const CRATE_NAME: &str = "nequip_mm";





fn level_str(level: LevelFilter) -> &'static str
{
    match level
    {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

/// Initialize the global logger. Calling it again after a logger is installed does nothing.
///
/// # Parameters
/// ```text
/// level: default level for this crate when RUST_LOG is not set
/// ```
pub fn init(level: LevelFilter)
{
    let filter: String = format!("{}={}", CRATE_NAME, level_str(level));
    let result = if std::env::var("RUST_LOG").is_err()
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).try_init()
    }
    else
    {
        env_logger::try_init()
    };

    if result.is_err()
    {
        log::debug!("logger already initialized");
    }
}

/// Map a `-v` count from the command line to a level filter.
pub fn verbosity_to_level(verbosity: u8) -> LevelFilter
{
    match verbosity
    {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
