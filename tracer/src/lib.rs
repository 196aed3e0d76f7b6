//! A minimal, synchronous controller over one traced process and any
//! threads it spawns.
//!
//! Breakpoints are software `int3` patches installed and removed through
//! the kernel's process-tracing interface. The tracee runs single-threaded
//! from the tracer's point of view: `run` blocks until the next event and
//! the caller is expected to act on it (inspect registers, patch memory)
//! before calling `run` again.

#[macro_use]
extern crate log;

mod error;

pub use error::TracerError;
pub use linetable::Address;

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use pete::{Pid, Ptracer, Restart, Signal, Stop, Tracee};

type Result<T> = std::result::Result<T, TracerError>;

/// The outcome of resuming the tracee and waiting for its next event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// A software breakpoint fired at `pc`.
    Trap { pc: Address },
    /// The root tracee exited with `code`.
    Exit { code: i32 },
    /// `wait` failed, or delivered a status this tracer cannot classify.
    Error,
}

/// An owned handle to a traced process. Killing the tracee on drop means a
/// `Tracer` going out of scope mid-run never leaves an orphaned, stopped
/// child behind.
pub struct Tracer {
    tracer: Ptracer,
    root_pid: Option<Pid>,
    /// The tracee last returned from `wait`, held until the next `run` call
    /// resumes it. `None` once the root tracee has exited.
    tracee: Option<Tracee>,
}

impl Tracer {
    /// Launch `executable_path` under trace with `argv` as its arguments
    /// (not including `argv[0]`, which is set to `executable_path`).
    pub fn load(executable_path: &Path, argv: &[String]) -> Result<Tracer> {
        let is_executable = std::fs::metadata(executable_path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false);

        if !is_executable {
            return Err(TracerError::Launch {
                path: executable_path.display().to_string(),
                reason: "file does not exist or is not executable".into(),
            });
        }

        let mut cmd = Command::new(executable_path);
        cmd.args(argv);

        let mut tracer = Ptracer::new();
        let _child = tracer.spawn(cmd).map_err(|e| TracerError::Launch {
            path: executable_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut tracee = continue_to_init_exec(&mut tracer).map_err(|_| TracerError::Launch {
            path: executable_path.display().to_string(),
            reason: "did not observe the initial exec stop".into(),
        })?;

        // Follow clones (new threads); leave forks and nested execs alone,
        // since this crate treats clones of the root as the same tracee.
        let mut options = pete::ptracer::Options::all();
        options.remove(pete::ptracer::Options::PTRACE_O_TRACEFORK);
        options.remove(pete::ptracer::Options::PTRACE_O_TRACEVFORK);
        options.remove(pete::ptracer::Options::PTRACE_O_TRACEEXEC);
        tracee.set_options(options)?;

        let root_pid = tracee.pid;

        Ok(Tracer {
            tracer,
            root_pid: Some(root_pid),
            tracee: Some(tracee),
        })
    }

    /// The root tracee's PID, if it hasn't exited or been closed yet.
    pub fn pid(&self) -> Option<i32> {
        self.root_pid.map(|pid| pid.as_raw())
    }

    /// Kill the tracee, if one is still attached. Idempotent.
    pub fn close(&mut self) {
        if let Some(pid) = self.root_pid.take() {
            let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL);
        }
        self.tracee = None;
    }

    /// Install a breakpoint at each address, returning the byte each one
    /// overwrote.
    pub fn set_breakpoints(&mut self, addresses: &[Address]) -> Result<BTreeMap<Address, u8>> {
        let mut saved = BTreeMap::new();
        for &addr in addresses {
            let original = self.read_byte(addr)?;
            self.write_byte(addr, 0xcc)?;
            saved.insert(addr, original);
        }
        Ok(saved)
    }

    /// Restore the original byte under every breakpoint in `saved`.
    pub fn remove_breakpoints(&mut self, saved: &BTreeMap<Address, u8>) -> Result<()> {
        for (&addr, &original) in saved {
            self.write_byte(addr, original)?;
        }
        Ok(())
    }

    /// Undo the one-shot breakpoint at `addr` after it has fired: rewind
    /// the active thread's instruction pointer over the clobbered `int3`
    /// and restore the original instruction byte.
    pub fn eliminate_hit_breakpoint(&mut self, addr: Address, original_byte: u8) -> Result<()> {
        let tracee = self.tracee.as_mut().ok_or(TracerError::NoTracee)?;
        let mut regs = tracee.registers()?;
        regs.rip = addr.0;
        tracee.set_registers(regs)?;
        self.write_byte(addr, original_byte)?;
        Ok(())
    }

    /// Resume the active thread and wait for the next event, classifying
    /// it into a [`TraceEvent`].
    pub fn run(&mut self) -> Result<TraceEvent> {
        if let Some(tracee) = self.tracee.take() {
            self.tracer.restart(tracee, Restart::Continue)?;
        }

        loop {
            let tracee = match self.tracer.wait() {
                Ok(Some(tracee)) => tracee,
                Ok(None) => return Ok(TraceEvent::Exit { code: 0 }),
                Err(_) => return Ok(TraceEvent::Error),
            };

            // Checked ahead of the generic stop-signal branch: a clone event
            // rides a `SIGTRAP` stop, but it is its own status class, not an
            // ordinary trap.
            if let Stop::Clone { new } = tracee.stop {
                debug!("new thread: {new}");
                self.tracer.restart(tracee, Restart::Continue)?;
                continue;
            }

            match tracee.stop {
                Stop::SignalDelivery {
                    signal: Signal::SIGTRAP,
                } => {
                    let regs = tracee.registers()?;
                    let pc = Address(regs.rip.saturating_sub(1));
                    self.tracee = Some(tracee);
                    return Ok(TraceEvent::Trap { pc });
                }
                Stop::SignalDelivery { signal } => {
                    trace!("forwarding signal {signal:?}");
                    self.tracer.restart(tracee, Restart::Continue)?;
                }
                Stop::Exiting { exit_code } => {
                    let root = tracee.pid;
                    if Some(root) == self.root_pid {
                        self.root_pid = None;
                        self.tracer.restart(tracee, Restart::Continue)?;
                        return Ok(TraceEvent::Exit { code: exit_code });
                    }
                    self.tracer.restart(tracee, Restart::Continue)?;
                }
                Stop::Signaling { signal, .. } => {
                    let root = tracee.pid;
                    if Some(root) == self.root_pid {
                        self.root_pid = None;
                        self.tracer.restart(tracee, Restart::Continue)?;
                        return Ok(TraceEvent::Exit { code: 128 + signal as i32 });
                    }
                    self.tracer.restart(tracee, Restart::Continue)?;
                }
                other => {
                    debug!("stop: {other:?}");
                    self.tracer.restart(tracee, Restart::Continue)?;
                }
            }
        }
    }

    /// The active thread's current instruction pointer.
    pub fn ip(&self) -> Result<Address> {
        let tracee = self.tracee.as_ref().ok_or(TracerError::NoTracee)?;
        Ok(Address(tracee.registers()?.rip))
    }

    /// The active thread's instruction pointer as it was before a trap was
    /// taken (one byte earlier, to account for the post-`int3` convention).
    pub fn ip_before_trap(&self) -> Result<Address> {
        Ok(Address(self.ip()?.0.saturating_sub(1)))
    }

    /// Read one byte from the tracee's memory at `addr`.
    pub fn read_byte(&mut self, addr: Address) -> Result<u8> {
        let tracee = self.tracee.as_mut().ok_or(TracerError::NoTracee)?;
        let mut byte = [0u8; 1];
        tracee.read_memory_mut(addr.0, &mut byte)?;
        Ok(byte[0])
    }

    /// Write one byte into the tracee's memory at `addr`.
    pub fn write_byte(&mut self, addr: Address, value: u8) -> Result<()> {
        let tracee = self.tracee.as_mut().ok_or(TracerError::NoTracee)?;
        tracee.write_memory(addr.0, &[value])?;
        Ok(())
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.close();
    }
}

fn continue_to_init_exec(tracer: &mut Ptracer) -> std::result::Result<Tracee, ()> {
    while let Ok(Some(tracee)) = tracer.wait() {
        if let Stop::SyscallExit = tracee.stop {
            return Ok(tracee);
        }

        if tracer.restart(tracee, Restart::Continue).is_err() {
            return Err(());
        }
    }

    Err(())
}
