//! Portable backend built on `fs2`.
//!
//! `fs2` locks the handle it is given, so the caller's open file is reused
//! rather than a second handle being opened on the same path.

use fs2::FileExt;
use std::fs::File;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use super::LockBackend;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls `try_lock_exclusive` until the lock is free or the deadline passes.
pub struct PortableLock;

impl LockBackend for PortableLock {
    fn name(&self) -> &'static str {
        "fs2"
    }

    fn lock_exclusive(&self, file: &File, deadline: Instant) -> io::Result<()> {
        let contended = fs2::lock_contended_error().kind();
        loop {
            match FileExt::try_lock_exclusive(file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == contended => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "exclusive lock still contended at deadline",
                ));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        FileExt::unlock(file)
    }
}
