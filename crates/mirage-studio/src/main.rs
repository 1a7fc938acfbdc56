use std::process::ExitCode;

use anyhow::Result;
use mirage_engine::device::GpuInit;
use mirage_engine::logging::{init_logging, LoggingConfig};
use mirage_engine::scene::{Scene, SceneConfig};
use mirage_engine::window::{Runtime, RuntimeConfig};

fn run() -> Result<()> {
    let config = SceneConfig::from_env()?;
    let scene = Scene::new(config)?;
    Runtime::run(RuntimeConfig::default(), GpuInit::default(), scene)
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
