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

//! The in-memory image of a preference file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;

use super::syntax;
use super::value::{PrefType, PrefValue};
use crate::support::{error::Error, file_ops};

const PREFS_FILE_MODE: u32 = 0o600;

/// A whole preference file held in memory.
///
/// Keys are kept in lexicographic order, which is also the order in which
/// they are saved.
#[derive(Clone, Debug, Default)]
pub struct PrefStore {
    prefs: BTreeMap<String, PrefValue>,
}

/// A working copy of every preference under a common prefix.
///
/// Entries are named relative to the prefix. Changes only reach a store
/// through `PrefStore::write_branch`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    prefix: String,
    entries: Vec<BranchEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: String,
    pub value: PrefValue,
}

impl PrefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new store from the file at `path`.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }

    /// Replace the contents of this store with the preferences in `path`.
    ///
    /// On failure, the store is left empty.
    pub fn load(&mut self, path: &Path) -> Result<(), Error> {
        self.reset();

        let text = fs::read_to_string(path).map_err(|e| {
            Error::StoreUnreadable {
                path: path.to_owned(),
                reason: e.to_string(),
            }
        })?;
        let parsed =
            syntax::parse(&text).map_err(|e| Error::StoreUnreadable {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;

        // Later statements override earlier ones, as when the client itself
        // reads the file.
        self.prefs.extend(parsed);
        Ok(())
    }

    /// Write the whole store to `path`, atomically replacing whatever is
    /// there.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut data = syntax::FILE_HEADER.to_owned();
        for (key, value) in &self.prefs {
            data.push_str(&syntax::format_statement(key, value));
            data.push('\n');
        }

        let tmp = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        file_ops::spit(tmp, path, true, PREFS_FILE_MODE, data.as_bytes())
            .map_err(|source| Error::StoreWriteError {
                path: path.to_owned(),
                source,
            })
    }

    /// Remove every preference.
    pub fn reset(&mut self) {
        self.prefs.clear();
    }

    pub fn len(&self) -> usize {
        self.prefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefs.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.prefs.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&PrefValue, Error> {
        self.prefs
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
    }

    /// Get the string preference `key`.
    pub fn get_str(&self, key: &str) -> Result<&str, Error> {
        match *self.get(key)? {
            PrefValue::String(ref s) => Ok(s),
            ref other => Err(Error::TypeMismatch {
                key: key.to_owned(),
                expected: PrefType::String,
                actual: other.pref_type(),
            }),
        }
    }

    /// Set `key` to `value`.
    ///
    /// If `key` already exists with a different type, the store is unchanged
    /// and `TypeMismatch` is returned.
    pub fn set(&mut self, key: &str, value: PrefValue) -> Result<(), Error> {
        if let Some(existing) = self.prefs.get_mut(key) {
            if existing.pref_type() != value.pref_type() {
                return Err(Error::TypeMismatch {
                    key: key.to_owned(),
                    expected: existing.pref_type(),
                    actual: value.pref_type(),
                });
            }

            *existing = value;
        } else {
            self.prefs.insert(key.to_owned(), value);
        }

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrefValue)> + '_ {
        self.prefs.iter().map(|(k, v)| (&**k, v))
    }

    /// Copy out every preference whose key starts with `prefix`.
    pub fn branch(&self, prefix: &str) -> Branch {
        let entries = self
            .prefs
            .range(prefix.to_owned()..)
            .take_while(|&(k, _)| k.starts_with(prefix))
            .map(|(k, v)| BranchEntry {
                name: k[prefix.len()..].to_owned(),
                value: v.clone(),
            })
            .collect();

        Branch {
            prefix: prefix.to_owned(),
            entries,
        }
    }

    /// Write every entry of `branch` back under its prefix.
    ///
    /// Entries that would change the type of an existing preference are
    /// logged and skipped.
    pub fn write_branch(&mut self, branch: &Branch) {
        for entry in &branch.entries {
            let key = format!("{}{}", branch.prefix, entry.name);
            if let Err(e) = self.set(&key, entry.value.clone()) {
                warn!("Not writing preference: {}", e);
            }
        }
    }
}

impl Branch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PrefValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BranchEntry> + '_ {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BranchEntry> + '_ {
        self.entries.iter_mut()
    }

    /// Drop every entry for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&BranchEntry) -> bool) {
        self.entries.retain(keep);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> PrefStore {
        let mut store = PrefStore::new();
        store
            .set("mail.server.server1.hostname", "host1".into())
            .unwrap();
        store.set("mail.server.server1.port", 143.into()).unwrap();
        store
            .set("mail.server.server2.hostname", "host2".into())
            .unwrap();
        store.set("mail.serverx", true.into()).unwrap();
        store.set("mail.identity.id1.fullName", "Joe".into()).unwrap();
        store
    }

    #[test]
    fn test_get_set() {
        let mut store = sample();
        assert_eq!(
            &PrefValue::Int(143),
            store.get("mail.server.server1.port").unwrap()
        );
        assert_eq!("host1", store.get_str("mail.server.server1.hostname").unwrap());
        assert_matches!(
            Err(Error::KeyNotFound(..)),
            store.get("mail.server.server3.port")
        );
        assert_matches!(
            Err(Error::TypeMismatch {
                expected: PrefType::String,
                actual: PrefType::Int,
                ..
            }),
            store.get_str("mail.server.server1.port")
        );

        store.set("mail.server.server1.port", 993.into()).unwrap();
        assert_eq!(
            &PrefValue::Int(993),
            store.get("mail.server.server1.port").unwrap()
        );

        assert_matches!(
            Err(Error::TypeMismatch {
                expected: PrefType::Int,
                actual: PrefType::String,
                ..
            }),
            store.set("mail.server.server1.port", "993".into())
        );
        assert_eq!(
            &PrefValue::Int(993),
            store.get("mail.server.server1.port").unwrap()
        );
    }

    #[test]
    fn test_branch() {
        let mut store = sample();
        let mut branch = store.branch("mail.server.");
        assert_eq!(3, branch.len());
        assert_eq!(
            vec!["server1.hostname", "server1.port", "server2.hostname"],
            branch.iter().map(|e| &*e.name).collect::<Vec<_>>()
        );
        assert_eq!(
            Some(&PrefValue::from("host2")),
            branch.get("server2.hostname")
        );

        branch.retain(|e| !e.name.ends_with(".port"));
        for entry in branch.iter_mut() {
            entry.value = PrefValue::from("changed");
        }

        store.reset();
        assert!(store.is_empty());
        store.set("mail.server.server1.hostname", 5.into()).unwrap();
        store.write_branch(&branch);

        // The conflicting entry was skipped, the other written
        assert_eq!(
            &PrefValue::Int(5),
            store.get("mail.server.server1.hostname").unwrap()
        );
        assert_eq!(
            "changed",
            store.get_str("mail.server.server2.hostname").unwrap()
        );
        assert!(!store.contains("mail.server.server1.port"));
        assert!(store.branch("nothing.").is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("prefs.js");

        let store = sample();
        store.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(syntax::FILE_HEADER));
        assert!(text.contains(
            "\nuser_pref(\"mail.identity.id1.fullName\", \"Joe\");\n\
             user_pref(\"mail.server.server1.hostname\", \"host1\");\n"
        ));

        let mut loaded = PrefStore::new();
        loaded.set("stale", 1.into()).unwrap();
        loaded.load(&path).unwrap();
        assert!(!loaded.contains("stale"));
        assert_eq!(
            store.iter().collect::<Vec<_>>(),
            loaded.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_load_errors() {
        let root = tempfile::tempdir().unwrap();
        assert_matches!(
            Err(Error::StoreUnreadable { .. }),
            PrefStore::open(&root.path().join("prefs.js"))
        );

        let path = root.path().join("bad.js");
        fs::write(&path, "user_pref(\"a\", 1);\nnonsense\n").unwrap();
        let mut store = sample();
        match store.load(&path) {
            Err(Error::StoreUnreadable { reason, .. }) => {
                assert!(reason.contains("line 2"), "{}", reason)
            },
            r => panic!("Unexpected result: {:?}", r),
        }
        assert!(store.is_empty());

        let path = root.path().join("dupes.js");
        fs::write(&path, "user_pref(\"a\", 1);\nuser_pref(\"a\", \"x\");\n")
            .unwrap();
        assert_eq!(
            "x",
            PrefStore::open(&path).unwrap().get_str("a").unwrap()
        );
    }

    #[test]
    fn test_save_error() {
        let root = tempfile::tempdir().unwrap();
        assert_matches!(
            Err(Error::StoreWriteError { .. }),
            sample().save(&root.path().join("nx/prefs.js"))
        );
    }
}
