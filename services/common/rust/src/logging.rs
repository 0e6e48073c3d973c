use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::dispatcher::Dispatch;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::{AppBasepathCfg, AppLogHandlerCfg, AppLoggerCfg, AppLoggingCfg};
use crate::constant::logging::{Destination, Level};
use crate::AppLogAlias;

pub type AppLogLevel = Level;

/// Map application log level to `tracing` level, `FATAL` has no
/// counterpart so it shares the `ERROR` level.
#[macro_export]
macro_rules! tracing_level {
    ($lvl:expr) => {
        match $lvl {
            $crate::logging::AppLogLevel::FATAL => tracing::Level::ERROR,
            $crate::logging::AppLogLevel::ERROR => tracing::Level::ERROR,
            $crate::logging::AppLogLevel::WARNING => tracing::Level::WARN,
            $crate::logging::AppLogLevel::INFO => tracing::Level::INFO,
            $crate::logging::AppLogLevel::DEBUG => tracing::Level::DEBUG,
            $crate::logging::AppLogLevel::TRACE => tracing::Level::TRACE,
        }
    };
}

// writer shared by all loggers referring to the same handler alias
struct LogSink {
    writer: NonBlocking,
    min_level: tracing::Level,
}

fn sink_file_path(basepath: &str, relative: &str) -> PathBuf {
    Path::new(basepath).join(relative.trim_start_matches('/'))
}

fn open_sink(basepath: &AppBasepathCfg, cfg: &AppLogHandlerCfg) -> Option<(LogSink, WorkerGuard)> {
    let (writer, guard) = match cfg.destination {
        Destination::CONSOLE => tracing_appender::non_blocking(std::io::stdout()),
        Destination::LOCALFS => {
            let fullpath = sink_file_path(&basepath.system, cfg.path.as_deref()?);
            let appender = RollingFileAppender::new(
                Rotation::NEVER,
                fullpath.parent()?,
                fullpath.file_name()?,
            );
            tracing_appender::non_blocking(appender)
        }
    };
    let min_level = tracing_level!(&cfg.min_level);
    Some((LogSink { writer, min_level }, guard))
}

fn build_dispatch(cfg: &AppLoggerCfg, sinks: &HashMap<AppLogAlias, LogSink>) -> Dispatch {
    let overridden = cfg.level.as_ref().map(|l| tracing_level!(l));
    let mut layers = Vec::with_capacity(cfg.handlers.len());
    for alias in cfg.handlers.iter() {
        let Some(sink) = sinks.get(alias) else {
            continue;
        };
        let lvl = overridden.unwrap_or(sink.min_level);
        let layer = FmtLayer::new()
            .with_writer(sink.writer.clone())
            .with_file(false)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_filter(LevelFilter::from_level(lvl));
        layers.push(layer);
    }
    Dispatch::new(Registry::default().with(layers))
}

/// Loggers keyed by module path, each one dispatches events to the
/// handlers it names in the logging configuration.
pub struct AppLogContext {
    dispatchers: HashMap<AppLogAlias, Dispatch>,
    // dropping a guard stops its background writer thread
    _guards: Vec<WorkerGuard>,
}

impl AppLogContext {
    pub fn new(basepath: &AppBasepathCfg, cfg: &AppLoggingCfg) -> Self {
        let mut sinks = HashMap::new();
        let mut guards = Vec::new();
        for hcfg in cfg.handlers.iter() {
            match open_sink(basepath, hcfg) {
                Some((sink, guard)) => {
                    sinks.insert(hcfg.alias.clone(), sink);
                    guards.push(guard);
                }
                None => eprintln!("[WARN] unable to open log handler: {}", hcfg.alias),
            }
        }
        let dispatchers = cfg
            .loggers
            .iter()
            .map(|lcfg| (lcfg.alias.clone(), build_dispatch(lcfg, &sinks)))
            .collect();
        Self {
            dispatchers,
            _guards: guards,
        }
    }

    /// Logger registered for the module path, or the one of its nearest
    /// ancestor module, so a logger named after the crate covers every
    /// module in it.
    pub fn dispatcher_for(&self, module_path: &str) -> Option<&Dispatch> {
        let mut path = module_path;
        loop {
            if let Some(d) = self.dispatchers.get(&path.to_string()) {
                return Some(d);
            }
            let (parent, _) = path.rsplit_once("::")?;
            path = parent;
        }
    }
} // end of impl AppLogContext

#[macro_export]
macro_rules! app_log_event {
    ( $ctx:ident, $lvl:expr, $($arg:tt)+ ) => {{
        const MOD_PATH: &str = module_path!();
        match $ctx.dispatcher_for(MOD_PATH) {
            Some(dispatch) => {
                const LVL: tracing::Level = $crate::logging::tracing_level!($lvl);
                tracing::dispatcher::with_default(dispatch, || {
                    tracing::event!(LVL, $($arg)+);
                });
            }
            None => {
                eprintln!("[WARN] no logger for module: {}", MOD_PATH);
                eprintln!($($arg)+);
            }
        }
    }};
}

pub use app_log_event;
pub use tracing_level;
