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

//! Fixtures for building legacy profiles in tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A `prefs.js` as written by the legacy client, with two IMAP/local mail
/// accounts, a news account, a feed account the migration doesn't know how
/// to relocate, and assorted settings.
///
/// Every occurrence of `@PROFILE@` stands for the absolute path of the
/// profile directory.
pub static LEGACY_PREFS: &str = include_str!("legacy_prefs.js");

/// Files of the legacy profile other than `prefs.js`, relative to its root.
pub static LEGACY_FILES: &[(&str, &[u8])] = &[
    ("sig.txt", b"-- \nJoe Bloggs\n"),
    ("abook.mab", b"// <!-- <mdb:mork:z v=\"1.4\"/> -->\n"),
    ("user.js", b"user_pref(\"mail.check_all_imap_folders\", true);\n"),
    ("cert8.db", &[0u8; 64]),
    ("training.dat", b"\xFE\xED\xFA\xCE\x00\x00\x00\x01"),
    ("12345678.s", b"#2c\n.\n"),
    ("ImapMail/imap.example.com/INBOX", b"From joe Mon Jan  1 00:00:00 2007\n"),
    ("ImapMail/imap.example.com/INBOX.msf", b"// <!-- <mdb:mork"),
    ("Mail/Local Folders/Inbox", b""),
    ("Mail/Local Folders/Trash", b"From nobody\n"),
    ("Mail/Local Folders/Archives.sbd/2006", b"From someone\n"),
    ("News/news.example.com/comp.lang.rust.msf", b"// <!-- <mdb:mork"),
    ("News/newsrc-news.example.com", b"comp.lang.rust: 1-100\n"),
    ("Mail/feeds/feeds.rdf", b"<RDF/>"),
];

/// A scratch directory containing a populated legacy profile and an empty
/// directory to migrate it into.
pub struct LegacyProfile {
    _root: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl LegacyProfile {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("seamonkey/default");
        let target = root.path().join("thunderbird/default");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();

        for &(name, data) in LEGACY_FILES {
            let path = source.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, data).unwrap();
        }

        fs::write(
            source.join("prefs.js"),
            LEGACY_PREFS.replace("@PROFILE@", source.to_str().unwrap()),
        )
        .unwrap();

        LegacyProfile {
            _root: root,
            source,
            target,
        }
    }

    /// The absolute path of `rel` in the source profile, as it appears in
    /// preferences.
    pub fn source_path(&self, rel: &str) -> String {
        path_string(&self.source.join(rel))
    }

    /// The absolute path of `rel` in the target profile, as it appears in
    /// preferences.
    pub fn target_path(&self, rel: &str) -> String {
        path_string(&self.target.join(rel))
    }
}

fn path_string(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

/// The combined size of every legacy file whose path starts with one of
/// `prefixes`.
pub fn legacy_size(prefixes: &[&str]) -> u64 {
    LEGACY_FILES
        .iter()
        .filter(|&&(name, _)| prefixes.iter().any(|p| name.starts_with(p)))
        .map(|&(_, data)| data.len() as u64)
        .sum()
}
