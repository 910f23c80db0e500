use chrono::Local;

/// Wire up the global fern dispatcher.
///
/// Debug builds log the workspace crates at debug level; release builds stay
/// at info. Third-party noise (wgpu, iced internals) is capped at warn.
pub fn setup(is_debug: bool) -> Result<(), fern::InitError> {
    let level = if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(log::LevelFilter::Warn)
        .level_for("strata_chart", level)
        .level_for("strata_chart_data", level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}
