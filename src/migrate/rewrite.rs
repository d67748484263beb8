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

//! Rewriting the path-valued preferences of the structural branches.
//!
//! Every rewrite that points a preference into the new profile also schedules
//! the copy that puts the data there. Nothing is copied here; the copies run
//! when the queue is drained.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::copy_queue::FileCopyQueue;
use super::model::{ItemCategory, NEWS_DIR};
use super::relocate::RelocationPolicy;
use crate::prefs::{Branch, PrefStore, PrefValue};
use crate::support::{log_prefix::LogPrefix, safe_name::is_safe_name};

pub const IDENTITY_BRANCH: &str = "mail.identity.";
pub const SERVER_BRANCH: &str = "mail.server.";
pub const ADDRESS_BOOK_BRANCH: &str = "ldap_2.";

const SIG_FILE_SUFFIX: &str = ".sig_file";
const DIRECTORY_SUFFIX: &str = ".directory";
const DIRECTORY_REL_SUFFIX: &str = ".directory-rel";
const NEWSRC_SUFFIX: &str = ".newsrc.file";
const FILENAME_SUFFIX: &str = ".filename";

/// Applies the relocation rules to snapshotted branches.
///
/// `source` is the image loaded from the old profile; it is consulted for
/// sibling preferences such as a server's type and host name, and is never
/// modified.
pub struct BranchRewriter<'a> {
    log_prefix: &'a LogPrefix,
    source_root: &'a Path,
    source: &'a PrefStore,
    policy: &'a RelocationPolicy,
    queue: &'a mut FileCopyQueue,
}

impl<'a> BranchRewriter<'a> {
    pub fn new(
        log_prefix: &'a LogPrefix,
        source_root: &'a Path,
        source: &'a PrefStore,
        policy: &'a RelocationPolicy,
        queue: &'a mut FileCopyQueue,
    ) -> Self {
        BranchRewriter {
            log_prefix,
            source_root,
            source,
            policy,
            queue,
        }
    }

    /// Move signature files into the root of the new profile.
    pub fn rewrite_identities(&mut self, identities: &mut Branch) {
        let target_root = self.policy.target_root().to_owned();

        for entry in identities.iter_mut() {
            if !entry.name.ends_with(SIG_FILE_SUFFIX) {
                continue;
            }

            if let Some(new_path) = self.schedule_file(
                &entry.name,
                &entry.value,
                &target_root,
                ItemCategory::ACCOUNT_SETTINGS,
            ) {
                entry.value = path_value(&new_path);
            }
        }
    }

    /// Relocate each server's mail store and its newsrc file.
    pub fn rewrite_servers(&mut self, servers: &mut Branch) {
        // Relative directory preferences would still point at the old layout.
        // The client recreates them on demand.
        servers.retain(|e| !e.name.ends_with(DIRECTORY_REL_SUFFIX));

        let news_root = self.policy.target_root().join(NEWS_DIR);

        for entry in servers.iter_mut() {
            if let Some(server_id) = entry.name.strip_suffix(DIRECTORY_SUFFIX) {
                if let Some(new_dir) =
                    self.relocate_server_directory(server_id, &entry.value)
                {
                    entry.value = path_value(&new_dir);
                }
            } else if entry.name.ends_with(NEWSRC_SUFFIX) {
                if let Some(new_path) = self.schedule_file(
                    &entry.name,
                    &entry.value,
                    &news_root,
                    ItemCategory::NEWS_DATA,
                ) {
                    entry.value = path_value(&new_path);
                }
            }
        }
    }

    /// Schedule each address book database for copy.
    ///
    /// Address book file names are relative to the profile root, so the
    /// preferences themselves stay as they are.
    pub fn rewrite_address_books(&mut self, address_books: &Branch) {
        for entry in address_books.iter() {
            if !entry.name.ends_with(FILENAME_SUFFIX) {
                continue;
            }

            let file_name = match entry.value {
                PrefValue::String(ref s) => s,
                _ => {
                    warn!(
                        "{} {}{} is not a string; ignoring",
                        self.log_prefix,
                        ADDRESS_BOOK_BRANCH,
                        entry.name
                    );
                    continue;
                },
            };

            if !is_safe_name(file_name) {
                warn!(
                    "{} Address book file name {:?} is not a plain file name; \
                     not copying it",
                    self.log_prefix, file_name
                );
                continue;
            }

            let source = self.source_root.join(file_name);
            if !source.is_file() {
                debug!(
                    "{} Address book {} does not exist",
                    self.log_prefix,
                    source.display()
                );
                continue;
            }

            self.queue.enqueue_file(
                &source,
                &self.policy.target_root().join(file_name),
                ItemCategory::ADDRESSBOOK_DATA,
            );
        }
    }

    /// Copy the file named by a path-valued preference into `dest_dir`.
    ///
    /// Returns the new location if a copy was scheduled. Nothing is scheduled
    /// if the file doesn't exist or another copy already claimed the
    /// destination.
    fn schedule_file(
        &mut self,
        name: &str,
        value: &PrefValue,
        dest_dir: &Path,
        category: ItemCategory,
    ) -> Option<PathBuf> {
        let source = match *value {
            PrefValue::String(ref s) => Path::new(s),
            _ => {
                warn!("{} {} is not a path; ignoring", self.log_prefix, name);
                return None;
            },
        };

        if !source.is_file() {
            debug!(
                "{} {} refers to missing file {}",
                self.log_prefix,
                name,
                source.display()
            );
            return None;
        }

        let leaf = source.file_name()?;
        let destination = dest_dir.join(leaf);
        if self.queue.enqueue_file(source, &destination, category) {
            Some(destination)
        } else {
            info!(
                "{} {} already copied to {}; leaving {} as is",
                self.log_prefix,
                leaf.to_string_lossy(),
                destination.display(),
                name
            );
            None
        }
    }

    fn relocate_server_directory(
        &mut self,
        server_id: &str,
        value: &PrefValue,
    ) -> Option<PathBuf> {
        let old_dir = match *value {
            PrefValue::String(ref s) => PathBuf::from(s),
            _ => {
                warn!(
                    "{} Directory of server {} is not a path; ignoring",
                    self.log_prefix, server_id
                );
                return None;
            },
        };

        let source = self.source;
        let server_pref = |leaf: &str| {
            source.get_str(&format!("{}{}.{}", SERVER_BRANCH, server_id, leaf))
        };

        let server_type = match server_pref("type") {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "{} Not relocating server {}: {}",
                    self.log_prefix, server_id, e
                );
                return None;
            },
        };
        let host_name = match server_pref("hostname") {
            Ok(h) => h,
            Err(e) => {
                warn!(
                    "{} Not relocating server {}: {}",
                    self.log_prefix, server_id, e
                );
                return None;
            },
        };

        match self.policy.relocate_server(server_type, host_name) {
            Ok(Some(new_dir)) => {
                info!(
                    "{} Server {} ({}) moves from {} to {}",
                    self.log_prefix,
                    server_id,
                    server_type,
                    old_dir.display(),
                    new_dir.display()
                );
                self.queue.enqueue_directory(
                    &old_dir,
                    &new_dir,
                    ItemCategory::MAIL_DATA,
                );
                Some(new_dir)
            },
            Ok(None) => {
                info!(
                    "{} Server {} has unsupported type {:?}; \
                     leaving its directory alone",
                    self.log_prefix, server_id, server_type
                );
                None
            },
            Err(e) => {
                warn!(
                    "{} Not relocating server {} (host {:?}): {}",
                    self.log_prefix, server_id, host_name, e
                );
                None
            },
        }
    }
}

/// The persistent form of a path stored in a preference.
fn path_value(path: &Path) -> PrefValue {
    PrefValue::String(path.to_string_lossy().into_owned())
}
