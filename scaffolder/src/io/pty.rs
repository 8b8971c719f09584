//! Pseudo-terminal plumbing over `libc`.
//!
//! This is the only module allowed to use `unsafe`. Everything it hands out is
//! an owned std type (`File`, `OwnedFd`, `Child`).

#![allow(unsafe_code)]

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tracing::debug;

/// Both ends of a freshly opened PTY.
#[derive(Debug)]
pub struct PtyPair {
    /// Side the runner reads output from and writes answers to.
    pub controller: File,
    /// Side handed to the child as stdin/stdout/stderr.
    pub dependent: OwnedFd,
}

/// Open a PTY pair, sized like the invoking terminal when there is one.
pub fn open_pty() -> io::Result<PtyPair> {
    let mut controller: libc::c_int = -1;
    let mut dependent: libc::c_int = -1;
    let mut size = terminal_size();
    let size_ptr = size
        .as_mut()
        .map_or(std::ptr::null_mut(), |ws| ws as *mut libc::winsize);

    // SAFETY: the out-pointers are valid for writes; name and termios may be null.
    let rc = unsafe {
        libc::openpty(
            &mut controller,
            &mut dependent,
            std::ptr::null_mut(),
            std::ptr::null_mut::<libc::termios>(),
            size_ptr,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: openpty succeeded, so both descriptors are open and owned by us alone.
    let (controller, dependent) =
        unsafe { (OwnedFd::from_raw_fd(controller), OwnedFd::from_raw_fd(dependent)) };
    set_cloexec(&controller)?;
    set_cloexec(&dependent)?;
    debug!(
        controller = controller.as_raw_fd(),
        dependent = dependent.as_raw_fd(),
        "opened pty"
    );

    Ok(PtyPair {
        controller: File::from(controller),
        dependent,
    })
}

/// Spawn `cmd` with all three standard streams on `dependent`.
///
/// The child starts a new session with the PTY as its controlling terminal so
/// tools that open `/dev/tty` for prompts talk to us. `cmd` is consumed and
/// dropped before returning, which closes the parent's copies of `dependent`.
pub fn spawn_on_pty(mut cmd: Command, dependent: OwnedFd) -> io::Result<Child> {
    cmd.stdin(Stdio::from(dependent.try_clone()?))
        .stdout(Stdio::from(dependent.try_clone()?))
        .stderr(Stdio::from(dependent));

    // SAFETY: the hook only calls async-signal-safe functions (setsid, ioctl).
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            // Best effort: without a controlling terminal the child still has
            // the PTY on its standard streams.
            libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY as _, 0);
            Ok(())
        });
    }

    let child = cmd.spawn();
    drop(cmd);
    child
}

/// Wait up to `timeout` for `fd` to become readable (or hung up).
pub fn wait_readable(fd: BorrowedFd<'_>, timeout: Duration) -> io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    // SAFETY: `pollfd` is a valid one-element array for the duration of the call.
    let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(rc > 0 && pollfd.revents != 0)
}

/// True for the read errors a PTY controller reports once every dependent
/// descriptor is closed (`EIO` on Linux, `ENXIO` "device not configured" on BSDs).
pub fn is_hangup(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(code) if code == libc::EIO || code == libc::ENXIO)
}

fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: `raw` is a valid open descriptor borrowed from `fd`.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above; only the close-on-exec bit is added.
    if unsafe { libc::fcntl(raw, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn terminal_size() -> Option<libc::winsize> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: TIOCGWINSZ writes a `winsize` into the provided pointer.
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) };
    (rc == 0 && size.ws_row > 0 && size.ws_col > 0).then_some(size)
}
