//! Foreground/background classification
//!
//! A task belongs to the background when the first component of its cgroup
//! path starts with the background marker (Android puts such tasks under
//! `/bg_non_interactive`). Background tasks skip the weight calculation and
//! always get the fixed background slice.

use core::fmt;

/// Capacity of a [`GroupPath`] buffer in bytes
pub const GROUP_PATH_MAX: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskClass {
    Foreground,
    Background,
}

/// A cgroup path formatted by the host into a caller-owned buffer.
///
/// Writes past the capacity are truncated at a character boundary.
#[derive(Clone)]
pub struct GroupPath {
    buf: [u8; GROUP_PATH_MAX],
    len: usize,
}

impl GroupPath {
    pub const fn empty() -> Self {
        Self {
            buf: [0; GROUP_PATH_MAX],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        // push_str only ever copies whole characters
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append as much of `s` as fits; returns false if anything was dropped.
    pub fn push_str(&mut self, s: &str) -> bool {
        let room = GROUP_PATH_MAX - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        take == s.len()
    }
}

impl Default for GroupPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for GroupPath {
    fn from(path: &str) -> Self {
        let mut out = Self::empty();
        out.push_str(path);
        out
    }
}

impl fmt::Debug for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupPath").field(&self.as_str()).finish()
    }
}

impl fmt::Write for GroupPath {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_str(s) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Classify a cgroup path. Anything that is not an absolute path with a
/// non-empty first component counts as foreground.
pub fn classify_path(path: &str, background_marker: u8) -> TaskClass {
    let Some(rest) = path.strip_prefix('/') else {
        return TaskClass::Foreground;
    };

    match rest.as_bytes().first() {
        Some(&first) if first == background_marker => TaskClass::Background,
        _ => TaskClass::Foreground,
    }
}
