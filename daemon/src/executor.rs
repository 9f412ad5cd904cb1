//! Process signal delivery

use std::io;

/// Deliver a signal via kill(2). The raw numeric signal from the client is
/// passed through unchanged; the kernel rejects invalid combinations.
pub fn send_signal(pid: i32, signal: i32) -> io::Result<()> {
    let ret = unsafe { libc::kill(pid, signal) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
