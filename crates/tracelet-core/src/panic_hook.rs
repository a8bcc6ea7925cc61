//! Process-wide panic logging
//!
//! The analogue of a global unhandled-error listener: panics are logged
//! at fatal level (message plus source location) before the previously
//! installed hook runs, so default backtrace printing and abort
//! behavior are preserved.

use std::panic::PanicHookInfo;

use serde_json::json;

use crate::logger::Logger;

/// Install a hook that logs every panic through `logger` at fatal
/// level, then delegates to the previously installed hook.
pub fn install_panic_hook(logger: Logger) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let message = panic_message(info);
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        logger.fatal(
            format!("panic: {message}"),
            json!({"location": location}),
        );
        previous(info);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
