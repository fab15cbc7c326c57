//! # Per-Call Trace Output
//!
//! Labelled stdout sections behind the per-call `trace` flag. Debug aid
//! only; results are identical with tracing on or off.

use std::fmt;

const RULE: &str = "═══════════════════════════════════════════════════════════";

pub(crate) struct Trace {
    enabled: bool,
}

impl Trace {
    pub fn new(enabled: bool) -> Self {
        Trace { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Start a labelled section
    pub fn section(&self, title: &str) {
        if self.enabled {
            println!("{RULE}");
            println!("  {title}");
            println!("{RULE}");
        }
    }

    /// One `label: value` line inside the current section
    pub fn line(&self, label: &str, value: &dyn fmt::Display) {
        if self.enabled {
            println!("  {label}: {value}");
        }
    }
}
