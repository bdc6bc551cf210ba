//! Tunables for the RAS class
//!
//! Defaults are compile-time constants; a kernel may override them from its
//! boot command line with `ras.timeslice=N`, `ras.bg_timeslice=N` and
//! `ras.bg_marker=C`.

use crate::kwarn;

/// Base timeslice in scheduler ticks; a foreground task gets `weight` of these.
pub const RAS_TIMESLICE: u32 = 10;

/// Fixed timeslice for background-group tasks, in ticks.
pub const RAS_BG_TIMESLICE: u32 = 10;

/// First character of a background cgroup's top-level directory name.
pub const RAS_BG_MARKER: u8 = b'b';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasConfig {
    pub base_timeslice: u32,
    pub bg_timeslice: u32,
    pub background_marker: u8,
}

impl RasConfig {
    pub const fn new() -> Self {
        Self {
            base_timeslice: RAS_TIMESLICE,
            bg_timeslice: RAS_BG_TIMESLICE,
            background_marker: RAS_BG_MARKER,
        }
    }

    /// Build a config from boot parameters, keeping defaults for anything
    /// missing or malformed.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::new();
        config.apply_cmdline(cmdline);
        config
    }

    pub fn apply_cmdline(&mut self, cmdline: &str) {
        for token in cmdline.split_whitespace() {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };

            if key.eq_ignore_ascii_case("ras.timeslice") {
                if let Some(ticks) = parse_ticks(key, value) {
                    self.base_timeslice = ticks;
                }
            } else if key.eq_ignore_ascii_case("ras.bg_timeslice") {
                if let Some(ticks) = parse_ticks(key, value) {
                    self.bg_timeslice = ticks;
                }
            } else if key.eq_ignore_ascii_case("ras.bg_marker") {
                match value.as_bytes() {
                    [marker] if marker.is_ascii_graphic() && *marker != b'/' => {
                        self.background_marker = *marker;
                    }
                    _ => kwarn!("RAS: ignoring {}={} (expected one character)", key, value),
                }
            }
        }
    }

    /// Timeslice for a foreground task of the given weight.
    #[inline]
    pub const fn foreground_timeslice(&self, weight: u32) -> u32 {
        self.base_timeslice.saturating_mul(weight)
    }
}

impl Default for RasConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ticks(key: &str, value: &str) -> Option<u32> {
    match value.parse::<u32>() {
        Ok(0) | Err(_) => {
            kwarn!("RAS: ignoring {}={} (expected a positive tick count)", key, value);
            None
        }
        Ok(ticks) => Some(ticks),
    }
}
