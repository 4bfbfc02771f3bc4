//! Structured `event=<name> key=value ...` log lines under a single target.

/// Target of every log line emitted by this crate.
pub(crate) const LOG_TARGET: &str = "sieve";

/// Key/value pairs shared by all lines logged from one component.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LogContext {
    fields: &'static str,
}

impl LogContext {
    pub(crate) const fn new(fields: &'static str) -> Self {
        Self { fields }
    }

    pub(crate) fn fields(&self) -> &'static str {
        self.fields
    }
}

/// `sieve_log!(level, ctx: CTX, "event", "k={} ...", args...)`
macro_rules! sieve_log {
    ($level:expr, ctx: $ctx:expr, $event:expr, $fmt:literal $(, $args:expr)* $(,)?) => {{
        let level: log::Level = $level;
        if log::log_enabled!(target: crate::logging::LOG_TARGET, level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                level,
                "event={} {} {}",
                $event,
                $ctx.fields(),
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use sieve_log;
