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

use std::fmt;

use bitflags::bitflags;
use log::info;

/// The preference file at the root of every profile.
pub const PREFS_FILE: &str = "prefs.js";
/// Preferences the user maintains by hand; copied without interpretation.
pub const USER_PREFS_FILE: &str = "user.js";
pub const JUNK_TRAINING_FILE: &str = "training.dat";

/// Files copied as-is from the old profile root to the new one as part of
/// the settings.
pub const VERBATIM_FILES: &[&str] = &[
    USER_PREFS_FILE,
    // Security databases
    "cert8.db",
    "key3.db",
    "secmod.db",
    // User MIME type overrides
    "mimeTypes.rdf",
    "persdict.dat",
    "mailviews.dat",
];

/// Directory under the new profile holding local folders and POP3 mail.
pub const MAIL_DIR: &str = "Mail";
/// Directory under the new profile holding IMAP mail.
pub const IMAP_MAIL_DIR: &str = "ImapMail";
/// Directory under the new profile holding news data.
pub const NEWS_DIR: &str = "News";

bitflags! {
    /// The classes of data a migration can carry over.
    ///
    /// The bit values are those used by the legacy migration interface and
    /// show up in notifications.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ItemCategory: u16 {
        const SETTINGS = 0x0001;
        const ACCOUNT_SETTINGS = 0x0002;
        const ADDRESSBOOK_DATA = 0x0004;
        const JUNK_TRAINING = 0x0008;
        const PASSWORDS = 0x0010;
        const NEWS_DATA = 0x0040;
        const MAIL_DATA = 0x0080;
    }
}

impl ItemCategory {
    /// Interpret a requested item mask. An empty request means everything.
    pub fn requested(mask: ItemCategory) -> ItemCategory {
        if mask.is_empty() {
            ItemCategory::all()
        } else {
            mask
        }
    }

    /// The name of a single category, as used on the command line and in
    /// reports.
    pub fn name(self) -> &'static str {
        const NAMES: &[(ItemCategory, &str)] = &[
            (ItemCategory::SETTINGS, "settings"),
            (ItemCategory::ACCOUNT_SETTINGS, "account-settings"),
            (ItemCategory::ADDRESSBOOK_DATA, "address-books"),
            (ItemCategory::JUNK_TRAINING, "junk-training"),
            (ItemCategory::PASSWORDS, "passwords"),
            (ItemCategory::NEWS_DATA, "news"),
            (ItemCategory::MAIL_DATA, "mail"),
        ];

        NAMES
            .iter()
            .find(|&&(category, _)| category == self)
            .map_or("mixed", |&(_, name)| name)
    }

    pub fn from_cli_name(name: &str) -> Option<Self> {
        ItemCategory::all().iter().find(|c| c.name() == name)
    }

    /// The names of every category set in this mask.
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(ItemCategory::name).collect()
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// A notification sent to the host while a migration runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationEvent {
    Started,
    ItemBeforeMigrate(ItemCategory),
    ItemAfterMigrate(ItemCategory),
    /// Percentage of the copy payload completed so far.
    Progress(u8),
    Ended,
}

pub trait MigrationObserver {
    fn notify(&mut self, event: MigrationEvent);
}

impl<F: FnMut(MigrationEvent)> MigrationObserver for F {
    fn notify(&mut self, event: MigrationEvent) {
        self(event)
    }
}

/// Observer which just writes events to the log.
///
/// Progress is only logged when it crosses a multiple of 10%.
#[derive(Debug, Default)]
pub struct LogObserver {
    last_progress: u8,
}

impl MigrationObserver for LogObserver {
    fn notify(&mut self, event: MigrationEvent) {
        match event {
            MigrationEvent::Started => info!("Migration started"),
            MigrationEvent::ItemBeforeMigrate(item) => {
                info!("Migrating {}", item)
            },
            MigrationEvent::ItemAfterMigrate(item) => {
                info!("Finished migrating {}", item)
            },
            MigrationEvent::Progress(pct) => {
                if pct / 10 != self.last_progress / 10 {
                    info!("Copied {}%", pct);
                }
                self.last_progress = pct;
            },
            MigrationEvent::Ended => info!("Migration ended"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_category_names() {
        for category in ItemCategory::all().iter() {
            assert_eq!(
                Some(category),
                ItemCategory::from_cli_name(category.name())
            );
        }
        assert_eq!(None, ItemCategory::from_cli_name("cookies"));
        assert_eq!(
            "settings,passwords,mail",
            (ItemCategory::MAIL_DATA
                | ItemCategory::SETTINGS
                | ItemCategory::PASSWORDS)
                .to_string()
        );
    }

    #[test]
    fn test_requested() {
        assert_eq!(
            ItemCategory::all(),
            ItemCategory::requested(ItemCategory::empty())
        );
        assert_eq!(
            ItemCategory::PASSWORDS,
            ItemCategory::requested(ItemCategory::PASSWORDS)
        );
        assert_eq!(0xDF, ItemCategory::all().bits());
    }
}
