//! Host-side tool access (`git`, `gh`)
//!
//! The clone planner and the credential propagator only ever ask two things
//! of the host: is a binary installed, and what does a command print. Keeping
//! that behind a trait lets the orchestrator run against a scripted host in
//! tests.

use std::io;

use crate::process::{self, Captured};

pub trait HostTools {
    fn has_binary(&self, name: &str) -> bool;

    fn capture(&self, program: &str, args: &[&str]) -> io::Result<Captured>;
}

/// The real machine seven runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostTools for SystemHost {
    fn has_binary(&self, name: &str) -> bool {
        process::is_available(name)
    }

    fn capture(&self, program: &str, args: &[&str]) -> io::Result<Captured> {
        process::capture(program, args, &[])
    }
}

/// Run a host command and return its trimmed output only when it succeeded.
pub fn output_if_success<H: HostTools + ?Sized>(
    host: &H,
    program: &str,
    args: &[&str],
) -> Option<String> {
    match host.capture(program, args) {
        Ok(out) if out.success => Some(out.text.trim().to_string()),
        Ok(out) => {
            tracing::debug!("{} {:?} failed: {}", program, args, out.text);
            None
        }
        Err(e) => {
            tracing::debug!("{} {:?} could not run: {}", program, args, e);
            None
        }
    }
}
