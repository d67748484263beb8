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

//! Deciding where a server's mail store lives in the new profile.

use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use super::model::{IMAP_MAIL_DIR, MAIL_DIR, NEWS_DIR};
use crate::support::{error::Error, safe_name::is_safe_name};

/// Upper bound on disambiguation attempts before giving up.
const MAX_UNIQUE_ATTEMPTS: u32 = 10_000;

/// The top-level store directories of the new profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderKind {
    ImapRoot,
    MailRoot,
    NewsRoot,
}

impl FolderKind {
    /// Map a server's declared `type` to the directory its data moves into.
    ///
    /// Returns `None` for types we don't know how to relocate. Servers of
    /// those types keep their old directory untouched.
    pub fn for_server_type(server_type: &str) -> Option<Self> {
        match server_type {
            "imap" => Some(FolderKind::ImapRoot),
            // "none" is the local folders pseudo-server
            "pop3" | "none" => Some(FolderKind::MailRoot),
            "nntp" => Some(FolderKind::NewsRoot),
            _ => None,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            FolderKind::ImapRoot => IMAP_MAIL_DIR,
            FolderKind::MailRoot => MAIL_DIR,
            FolderKind::NewsRoot => NEWS_DIR,
        }
    }
}

/// Allocates directories under a target profile root.
#[derive(Clone, Debug)]
pub struct RelocationPolicy {
    target_root: PathBuf,
    create_mode: u32,
}

impl RelocationPolicy {
    pub fn new(target_root: PathBuf, create_mode: u32) -> Self {
        RelocationPolicy {
            target_root,
            create_mode,
        }
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn folder(&self, kind: FolderKind) -> PathBuf {
        self.target_root.join(kind.dir_name())
    }

    /// Create and return a fresh directory for the server `host_name` of
    /// type `server_type`.
    ///
    /// Returns `Ok(None)` if the server type has no relocation.
    pub fn relocate_server(
        &self,
        server_type: &str,
        host_name: &str,
    ) -> Result<Option<PathBuf>, Error> {
        match FolderKind::for_server_type(server_type) {
            None => Ok(None),
            Some(kind) => unique_directory(
                &self.folder(kind),
                host_name,
                self.create_mode,
            )
            .map(Some),
        }
    }
}

/// Create a new directory named after `name` under `parent`.
///
/// The first choice is `parent/name`. If that already exists, `name-1`,
/// `name-2`, etc are tried in turn. The directory is created before this
/// returns, and creation fails if something already exists at the path, so
/// the returned directory is always one that did not exist before the call.
///
/// `parent` and any missing ancestors are created as needed.
pub fn unique_directory(
    parent: &Path,
    name: &str,
    mode: u32,
) -> Result<PathBuf, Error> {
    if !is_safe_name(name) {
        return Err(Error::UnsafeName);
    }

    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(parent)?;

    for attempt in 0..MAX_UNIQUE_ATTEMPTS {
        let candidate = if 0 == attempt {
            parent.join(name)
        } else {
            parent.join(format!("{}-{}", name, attempt))
        };

        match fs::DirBuilder::new().mode(mode).create(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if io::ErrorKind::AlreadyExists == e.kind() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::NoUniqueName(parent.join(name)))
}
