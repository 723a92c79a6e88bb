//! Errno-style status codes.
//!
//! Every status that crosses the command dispatch channel follows the
//! convention of the embedded shells this crate emulates: `0` (or any
//! non-negative value) is success and a negated errno is failure.

use std::io;

pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const E2BIG: i32 = 7;
pub const ENOEXEC: i32 = 8;
pub const EACCES: i32 = 13;
pub const EINVAL: i32 = 22;

/// Negated OS error code of `err`, or `-EIO` when the error carries none.
pub fn status_from_io(err: &io::Error) -> i32 {
    match err.raw_os_error() {
        Some(code) if code > 0 => -code,
        _ => match err.kind() {
            io::ErrorKind::NotFound => -ENOENT,
            io::ErrorKind::PermissionDenied => -EACCES,
            io::ErrorKind::InvalidInput => -EINVAL,
            _ => -EIO,
        },
    }
}

/// Like [`status_from_io`], but looks for the first `io::Error` in an `anyhow` chain.
pub fn status_from_anyhow(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .map_or(-EIO, status_from_io)
}
