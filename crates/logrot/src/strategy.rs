//! Filesystem steps used by a rotation: advancing a generation, deleting the
//! oldest one, and clearing the active file.
//!
//! Every step returns an `io::Result` and leaves the decision of what to do with
//! a failure to the rotation loop.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// How one generation is moved to the next slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Duplicate the content and leave the source in place.
    /// Keeps the identity of the active file so open handles stay valid.
    Copy,
    /// Move the file to its new name
    Rename,
}

impl Strategy {
    pub fn from_rotate_by_copy(rotate_by_copy: bool) -> Self {
        if rotate_by_copy {
            Strategy::Copy
        } else {
            Strategy::Rename
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, Strategy::Copy)
    }

    /// Move `from` into the `to` slot.
    /// `file_mode` only applies to files created by copying.
    pub fn advance(self, from: &Path, to: &Path, file_mode: Option<u32>) -> io::Result<()> {
        match self {
            Strategy::Copy => copy_into(from, to, file_mode),
            Strategy::Rename => fs::rename(from, to),
        }
    }
}

/// Copy the content of `from` into `to`, then apply `file_mode` to `to`.
///
/// `fs::copy` would carry the source permissions over, so the content is streamed
/// into a freshly opened file instead; without a mode the new file gets the
/// process defaults.
fn copy_into(from: &Path, to: &Path, file_mode: Option<u32>) -> io::Result<()> {
    let copied = stream_copy(from, to);
    let moded = match file_mode {
        Some(mode) => set_mode(to, mode),
        None => Ok(()),
    };
    copied.and(moded)
}

fn stream_copy(from: &Path, to: &Path) -> io::Result<()> {
    let mut source = File::open(from)?;
    let mut target = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(to)?;
    io::copy(&mut source, &mut target)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

// Only the owner write bit has a meaning here
#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}

/// Drop the oldest generation
pub fn remove(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

/// Empty the active file without replacing it.
///
/// Processes that hold the file open keep a valid handle. The file is created
/// when a rename has moved it away.
pub fn clear_file(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().write(true).create(true).open(path)?;
    file.set_len(0)
}
