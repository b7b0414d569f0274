//! Host callbacks fired by the monitor.
//!
//! Handlers run synchronously on whichever thread detected the condition
//! (a foreground call or the collector) while the monitor is borrowed, so
//! they must be quick and must not call back into the monitor.

use std::fmt;

/// A swappable no-argument callback. Defaults to doing nothing.
pub struct Handler(Box<dyn FnMut() + Send>);

impl Handler {
    pub fn new(f: impl FnMut() + Send + 'static) -> Self {
        Handler(Box::new(f))
    }

    pub fn noop() -> Self {
        Handler(Box::new(|| {}))
    }

    pub(crate) fn fire(&mut self) {
        (self.0)()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

#[derive(Debug, Default)]
pub(crate) struct Handlers {
    pub on_empty: Handler,
    pub on_level_change: Handler,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_handler_fires_closure() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let mut handler = Handler::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        handler.fire();
        handler.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_handler_is_noop() {
        let mut handlers = Handlers::default();
        handlers.on_empty.fire();
        handlers.on_level_change.fire();
    }
}
