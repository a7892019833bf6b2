// Copyright (c) 2026 rezky_nightky

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

/// Raised by a process signal; the animation polls it between frames.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Routes SIGINT, SIGTERM and SIGHUP (Ctrl-C on Windows) into this flag.
    pub fn install(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            for sig in [SIGINT, SIGTERM, SIGHUP] {
                signal_hook::flag::register(sig, Arc::clone(&self.0))?;
            }
        }

        #[cfg(windows)]
        {
            let flag = Arc::clone(&self.0);
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
                .map_err(std::io::Error::other)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptFlag;

    #[test]
    fn clones_share_state() {
        let flag = InterruptFlag::new();
        let seen_by_loop = flag.clone();
        assert!(!seen_by_loop.is_raised());
        flag.raise();
        assert!(seen_by_loop.is_raised());
    }
}
