//! Low-level signal, alarm and terminal plumbing on top of `libc`.
//!
//! Signal handlers installed here do a single thing: forward the signal number
//! over a non-blocking socket to a [`SignalStream`]. Everything else happens in
//! ordinary code on the receiving side.

use std::io::{self, Read};
use std::mem::MaybeUninit;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI32, Ordering};

use libc::{c_int, c_void};

pub(crate) type SignalNumber = c_int;

pub(crate) use libc::{SIGALRM, SIGINT};

fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(io::Error::last_os_error()),
        _ => Ok(res),
    }
}

static TX: AtomicI32 = AtomicI32::new(-1);

extern "C" fn forward(signal: SignalNumber) {
    let tx = TX.load(Ordering::Relaxed);
    if tx != -1 {
        let byte = signal as u8;
        // SAFETY: send(2) is async-signal-safe and `byte` outlives the call.
        unsafe {
            libc::send(
                tx,
                (&byte as *const u8).cast::<c_void>(),
                1,
                libc::MSG_DONTWAIT,
            );
        }
    }
}

/// Receiving end for signals registered through [`SignalHandler`].
///
/// Only the most recently created stream receives signals.
pub(crate) struct SignalStream {
    rx: UnixStream,
    tx: UnixStream,
}

impl SignalStream {
    pub(crate) fn new() -> io::Result<Self> {
        let (rx, tx) = UnixStream::pair()?;
        TX.store(tx.as_raw_fd(), Ordering::Relaxed);
        Ok(Self { rx, tx })
    }

    /// Block until a streamed signal arrives and return its number.
    pub(crate) fn recv(&mut self) -> io::Result<SignalNumber> {
        let mut byte = [0u8; 1];
        loop {
            match self.rx.read(&mut byte) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "signal stream closed",
                    ));
                }
                Ok(_) => return Ok(SignalNumber::from(byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl Drop for SignalStream {
    fn drop(&mut self) {
        let _ = TX.compare_exchange(
            self.tx.as_raw_fd(),
            -1,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }
}

struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    /// An action that forwards the signal into the latest [`SignalStream`].
    fn forwarding() -> io::Result<Self> {
        // SAFETY: an all-zero sigaction is a valid value to start from.
        let mut raw: libc::sigaction = unsafe { MaybeUninit::zeroed().assume_init() };
        // SAFETY: `sa_mask` is a valid, writable sigset_t.
        cerr(unsafe { libc::sigfillset(&mut raw.sa_mask) })?;
        raw.sa_flags = libc::SA_RESTART;
        raw.sa_sigaction = forward as extern "C" fn(SignalNumber) as libc::sighandler_t;
        Ok(Self { raw })
    }

    /// Install this action, returning the one it replaced.
    fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original = MaybeUninit::<libc::sigaction>::zeroed();
        // SAFETY: both pointers are valid for the duration of the call and the
        // handler in `self.raw` only calls async-signal-safe functions.
        cerr(unsafe { libc::sigaction(signal, &self.raw, original.as_mut_ptr()) })?;
        Ok(Self {
            // SAFETY: sigaction succeeded and filled in the previous action.
            raw: unsafe { original.assume_init() },
        })
    }
}

/// A registered handler. Dropping it restores the previous action.
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    original_action: SignalAction,
}

impl SignalHandler {
    /// Forward `signal` into the latest [`SignalStream`] until dropped.
    pub(crate) fn register(signal: SignalNumber) -> io::Result<Self> {
        let original_action = SignalAction::forwarding()?.register(signal)?;
        Ok(Self {
            signal,
            original_action,
        })
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        if let Err(err) = self.original_action.register(self.signal) {
            tracing::warn!(signal = self.signal, "cannot restore signal action: {err}");
        }
    }
}

/// Arm the one-shot alarm clock. `0` cancels a pending alarm.
pub(crate) fn arm_alarm(seconds: u32) {
    // SAFETY: alarm(2) has no preconditions.
    unsafe {
        libc::alarm(seconds);
    }
}

static SAVED_TERMIOS: OnceLock<libc::termios> = OnceLock::new();

/// Remember the attributes of the terminal on standard input, if it is one.
pub(crate) fn save_terminal() -> io::Result<()> {
    // SAFETY: isatty(3) only inspects the descriptor.
    if unsafe { libc::isatty(libc::STDIN_FILENO) } != 1 {
        return Ok(());
    }
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: `termios` is valid for writes of a whole termios struct.
    cerr(unsafe { libc::tcgetattr(libc::STDIN_FILENO, termios.as_mut_ptr()) })?;
    // SAFETY: tcgetattr succeeded, so the struct is initialized.
    let _ = SAVED_TERMIOS.set(unsafe { termios.assume_init() });
    Ok(())
}

/// Put the terminal back the way [`save_terminal`] found it.
pub(crate) fn restore_terminal() {
    if let Some(termios) = SAVED_TERMIOS.get() {
        // SAFETY: `termios` was filled in by a successful tcgetattr.
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, termios);
        }
    }
}

/// Write straight to the standard output descriptor, bypassing the `Stdout` lock.
pub(crate) fn write_unbuffered(message: &str) {
    let mut bytes = message.as_bytes();
    while !bytes.is_empty() {
        // SAFETY: the pointer and length describe the live `bytes` slice.
        let written = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                bytes.as_ptr().cast::<c_void>(),
                bytes.len(),
            )
        };
        match cerr(written) {
            Ok(n) => bytes = &bytes[n as usize..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return,
        }
    }
}
