//-
// Copyright (c) 2024, Jason Lingle
//
// This file is part of Profmig.
//
// Profmig is free software: you can redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Profmig is distributed in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Profmig. If not, see <http://www.gnu.org/licenses/>.

//! Miscellaneous functions for working with files.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::support::error::Error;

/// Write `data` into the file at `path`, atomically.
///
/// The file will first be staged within `tmp`, which must be on the same file
/// system as `path`.
///
/// If `overwrite` is true, this will replace anything already at `path`. If
/// false, the call will fail if `path` already exists.
pub fn spit(
    tmp: impl AsRef<Path>,
    path: impl AsRef<Path>,
    overwrite: bool,
    mode: u32,
    data: &[u8],
) -> io::Result<()> {
    let mut tf = tempfile::NamedTempFile::new_in(tmp)?;
    tf.as_file_mut().write_all(data)?;
    chmod(tf.path(), mode)?;
    tf.as_file_mut().sync_all()?;
    if overwrite {
        tf.persist(path)?;
    } else {
        tf.persist_noclobber(path)?;
    }
    Ok(())
}

pub fn chmod(path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Copy the regular file `src` to `dst`, returning the number of bytes
/// copied.
///
/// Any missing parent directories of `dst` are created with `dir_mode`. The
/// call fails with `AlreadyExists` if `dst` is already present; nothing is
/// ever overwritten.
pub fn copy_file_noclobber(
    src: &Path,
    dst: &Path,
    dir_mode: u32,
) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::DirBuilder::new()
            .recursive(true)
            .mode(dir_mode)
            .create(parent)?;
    }

    let mut input = fs::File::open(src)?;
    let mut output = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)?;
    let copied = io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    Ok(copied)
}

/// Recursively copy the contents of the directory `src` into `dst`.
///
/// `dst` may already exist. Directories are created with `dir_mode`; files
/// keep their permission bits. Symbolic links are not followed or copied.
///
/// Returns the total number of bytes copied.
pub fn copy_tree(src: &Path, dst: &Path, dir_mode: u32) -> Result<u64, Error> {
    let mut copied = 0u64;

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::DirBuilder::new()
                .mode(dir_mode)
                .create(&target)
                .ignore_already_exists()?;
        } else if file_type.is_file() {
            copied += fs::copy(entry.path(), &target)?;
        } else {
            debug!("Not copying special file {}", entry.path().display());
        }
    }

    Ok(copied)
}

/// Return the total size of the regular files at or below `path`.
///
/// A symlink at `path` itself is followed, the same way `copy_tree` and
/// `copy_file_noclobber` follow it. Links further down are not. A nonexistent
/// `path` has size 0.
pub fn tree_size(path: &Path) -> Result<u64, Error> {
    let md = match fs::metadata(path) {
        Ok(md) => md,
        Err(e) if io::ErrorKind::NotFound == e.kind() => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    if !md.is_dir() {
        return Ok(if md.is_file() { md.len() } else { 0 });
    }

    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }

    Ok(total)
}

pub trait IgnoreKinds {
    fn ignore_already_exists(self) -> Self;
}

impl<R: Default> IgnoreKinds for Result<R, io::Error> {
    fn ignore_already_exists(self) -> Self {
        match self {
            Ok(r) => Ok(r),
            Err(e) if io::ErrorKind::AlreadyExists == e.kind() => {
                Ok(R::default())
            },
            Err(e) => Err(e),
        }
    }
}
