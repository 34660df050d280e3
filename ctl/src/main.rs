use anyhow::Context;
use ctl::config::LogTarget;
use shared::journald_logger;
use tokio::signal::ctrl_c;

fn main() -> Result<(), i32> {
    inner_main().map_err(|err| {
        eprintln!("{err:#}");
        1
    })?;

    Ok(())
}

fn inner_main() -> anyhow::Result<()> {
    let (config, info_log) = ctl::config::load_and_parse()?;

    match config.log_target {
        LogTarget::Std => Ok(env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(config.log_level.as_str()),
        )
        .try_init()?),
        LogTarget::Journald => journald_logger::init(config.log_level, "mesh-ctl"),
    }
    .context("Logger initialization failed")?;

    // log info from load_and_parse
    for l in info_log {
        log::info!(target: "ctl::config", "{l}");
    }

    // Everything happens on this thread, datagrams are processed one after the other
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        tokio::select! {
            res = ctl::run(&config) => res,
            _ = ctrl_c() => {
                log::warn!("Received SIGINT, stopping");
                Ok(())
            }
        }
    })
}
