//! Subscriber setup: stderr (text or JSON) plus an optional rotating file.

use std::path::Path;

use eyre::{Result, WrapErr};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::FILE_GUARD;

/// `RUST_LOG` wins over `level`.
pub fn init(json: bool, level: &str, logging: &ebike_config::Logging) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let stderr: Box<dyn Layer<Registry> + Send + Sync> = if json || logging.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let appender = appender(Path::new(path), logging.rotation.as_deref());
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(file)
        .with(filter)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn appender(path: &Path, rotation: Option<&str>) -> RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ebike.log".to_string());
    match rotation {
        Some("daily") => rolling::daily(dir, name),
        Some("hourly") => rolling::hourly(dir, name),
        _ => rolling::never(dir, name),
    }
}

/// Level from the flag, then the config file, then `info`.
pub fn effective_level<'a>(flag: Option<&'a str>, logging: &'a ebike_config::Logging) -> &'a str {
    flag.or(logging.level.as_deref()).unwrap_or("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_config_level() {
        let logging = ebike_config::Logging {
            level: Some("debug".into()),
            ..Default::default()
        };
        assert_eq!(effective_level(Some("warn"), &logging), "warn");
        assert_eq!(effective_level(None, &logging), "debug");
        assert_eq!(effective_level(None, &ebike_config::Logging::default()), "info");
    }
}
