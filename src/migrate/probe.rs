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

//! Finding out what a legacy profile has to offer.

use std::fs;
use std::path::Path;

use log::debug;

use super::model::{ItemCategory, JUNK_TRAINING_FILE, PREFS_FILE};
use crate::prefs::PrefStore;
use crate::support::{error::Error, safe_name::is_safe_name};

/// The preference naming the credential store of a profile.
pub const SIGNON_FILE_PREF: &str = "signon.SignonFileName";
/// The extension of credential store files.
const SIGNON_EXTENSION: &str = "s";

/// Determine which item categories can be migrated out of the profile at
/// `source_root`.
///
/// `replace` indicates that the migration creates a fresh profile rather than
/// merging into an existing one. Settings and junk training are only offered
/// in that case.
pub fn migratable_items(
    source_root: &Path,
    replace: bool,
) -> Result<ItemCategory, Error> {
    if !source_root.is_dir() {
        return Err(Error::SourceProfileNotFound(source_root.to_owned()));
    }

    // Carried over with the preferences or discovered while copying, so
    // always on offer.
    let mut items = ItemCategory::ACCOUNT_SETTINGS
        | ItemCategory::MAIL_DATA
        | ItemCategory::NEWS_DATA
        | ItemCategory::ADDRESSBOOK_DATA;

    if replace {
        if source_root.join(PREFS_FILE).is_file() {
            items |= ItemCategory::SETTINGS;
        }
        if source_root.join(JUNK_TRAINING_FILE).is_file() {
            items |= ItemCategory::JUNK_TRAINING;
        }
    }

    if let Some(name) = signon_file_name(source_root, replace) {
        if source_root.join(name).is_file() {
            items |= ItemCategory::PASSWORDS;
        }
    }

    Ok(items)
}

/// Work out the name of the credential store under `source_root`.
///
/// When `replace` is set, the profile's own preferences are asked first. If
/// that doesn't produce a name, the first file with the credential store
/// extension is taken.
pub fn signon_file_name(source_root: &Path, replace: bool) -> Option<String> {
    if replace {
        if let Some(name) = signon_file_pref(source_root) {
            return Some(name);
        }
    }

    locate_signon_file(source_root)
}

fn signon_file_pref(source_root: &Path) -> Option<String> {
    let store = match PrefStore::open(&source_root.join(PREFS_FILE)) {
        Ok(store) => store,
        Err(e) => {
            debug!("No signon file preference available: {}", e);
            return None;
        },
    };

    match store.get_str(SIGNON_FILE_PREF) {
        Ok(name) if is_safe_name(name) => Some(name.to_owned()),
        Ok(name) => {
            debug!("Ignoring unsafe signon file name {:?}", name);
            None
        },
        Err(_) => None,
    }
}

/// Look for a credential store by extension.
///
/// Entries are considered in name order so the choice is stable.
fn locate_signon_file(source_root: &Path) -> Option<String> {
    let mut candidates = fs::read_dir(source_root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().map_or(false, |t| t.is_file())
                && entry
                    .path()
                    .extension()
                    .map_or(false, |ext| SIGNON_EXTENSION == ext)
        })
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect::<Vec<_>>();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod test {
    use super::*;

    fn always() -> ItemCategory {
        ItemCategory::ACCOUNT_SETTINGS
            | ItemCategory::MAIL_DATA
            | ItemCategory::NEWS_DATA
            | ItemCategory::ADDRESSBOOK_DATA
    }

    #[test]
    fn empty_profile() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(always(), migratable_items(root.path(), true).unwrap());
        assert_eq!(always(), migratable_items(root.path(), false).unwrap());
        assert_matches!(
            Err(Error::SourceProfileNotFound(..)),
            migratable_items(&root.path().join("nx"), true)
        );
    }

    #[test]
    fn settings_and_junk_only_when_replacing() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(PREFS_FILE), "").unwrap();
        fs::write(root.path().join(JUNK_TRAINING_FILE), b"\xFE\xED").unwrap();

        assert_eq!(
            always() | ItemCategory::SETTINGS | ItemCategory::JUNK_TRAINING,
            migratable_items(root.path(), true).unwrap()
        );
        assert_eq!(always(), migratable_items(root.path(), false).unwrap());
    }

    #[test]
    fn passwords_by_extension() {
        let root = tempfile::tempdir().unwrap();
        assert!(!migratable_items(root.path(), true)
            .unwrap()
            .contains(ItemCategory::PASSWORDS));

        // A directory with the right extension doesn't count
        fs::create_dir(root.path().join("a.s")).unwrap();
        assert_eq!(None, signon_file_name(root.path(), false));

        fs::write(root.path().join("9876543.s"), b"#2c\n").unwrap();
        fs::write(root.path().join("1234567.s"), b"#2c\n").unwrap();
        assert_eq!(
            Some("1234567.s".to_owned()),
            signon_file_name(root.path(), false)
        );
        assert!(migratable_items(root.path(), false)
            .unwrap()
            .contains(ItemCategory::PASSWORDS));
    }

    #[test]
    fn passwords_by_preference() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("other.s"), b"#2c\n").unwrap();
        fs::write(
            root.path().join(PREFS_FILE),
            "user_pref(\"signon.SignonFileName\", \"named.s\");\n",
        )
        .unwrap();

        // The preference wins when replacing, even if the file isn't there
        assert_eq!(
            Some("named.s".to_owned()),
            signon_file_name(root.path(), true)
        );
        assert!(!migratable_items(root.path(), true)
            .unwrap()
            .contains(ItemCategory::PASSWORDS));

        // When merging, the preference is not consulted
        assert_eq!(
            Some("other.s".to_owned()),
            signon_file_name(root.path(), false)
        );

        fs::write(root.path().join("named.s"), b"#2c\n").unwrap();
        assert!(migratable_items(root.path(), true)
            .unwrap()
            .contains(ItemCategory::PASSWORDS));

        fs::write(
            root.path().join(PREFS_FILE),
            "user_pref(\"signon.SignonFileName\", \"../x.s\");\n",
        )
        .unwrap();
        assert_eq!(
            Some("named.s".to_owned()),
            signon_file_name(root.path(), true)
        );
    }
}
