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

//! Driving one migration from start to finish.
//!
//! `MigrationSession::migrate` runs every synchronous phase in one go: it
//! transforms the preferences, writes the new `prefs.js`, and schedules every
//! copy. The copies are then executed by repeated calls to
//! `MigrationSession::step`, one copy per call, so a host with an event loop
//! can interleave other work. `run_to_completion` does the same with a pause
//! between steps.

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::prelude::*;
use log::{error, info, warn};

use super::copy_queue::FileCopyQueue;
use super::model::*;
use super::probe::signon_file_name;
use super::relocate::RelocationPolicy;
use super::report::MigrationReport;
use super::rewrite::{
    BranchRewriter, ADDRESS_BOOK_BRANCH, IDENTITY_BRANCH, SERVER_BRANCH,
};
use super::transform::TransformTable;
use crate::prefs::PrefStore;
use crate::support::{
    error::Error, log_prefix::LogPrefix, system_config::QueueConfig,
};

/// Branches carried into the new profile without changes.
const CARRIED_BRANCHES: &[&str] = &[
    "mail.account.",
    "mail.smtpserver.",
    "mailnews.labels.",
    "mailnews.tags.",
];

/// The phases that run before the copy queue is drained, in order.
const PHASES: &[ItemCategory] = &[
    ItemCategory::SETTINGS,
    ItemCategory::ACCOUNT_SETTINGS,
    ItemCategory::NEWS_DATA,
    ItemCategory::JUNK_TRAINING,
    ItemCategory::PASSWORDS,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Ready,
    Draining,
    Finished,
}

pub struct MigrationSession {
    log_prefix: LogPrefix,
    source_root: PathBuf,
    config: QueueConfig,
    policy: RelocationPolicy,
    requested: ItemCategory,
    replace: bool,
    /// The preference image. It holds the source profile's preferences until
    /// they have been transformed, and the new profile's afterwards.
    prefs: PrefStore,
    queue: FileCopyQueue,
    state: State,
    started: Option<DateTime<Utc>>,
    ended: Option<DateTime<Utc>>,
    fatal_error: Option<String>,
}

impl MigrationSession {
    /// Prepare to migrate the profile at `source_root` into `target_root`.
    ///
    /// `target_root` is created if it does not exist yet.
    pub fn new(
        source_root: PathBuf,
        target_root: PathBuf,
        config: QueueConfig,
    ) -> Result<Self, Error> {
        if !source_root.is_dir() {
            return Err(Error::SourceProfileNotFound(source_root));
        }

        fs::DirBuilder::new()
            .recursive(true)
            .mode(config.create_mode)
            .create(&target_root)?;

        let log_prefix = LogPrefix::new(
            source_root
                .file_name()
                .map_or_else(
                    || source_root.to_string_lossy(),
                    |n| n.to_string_lossy(),
                )
                .into_owned(),
        );

        Ok(MigrationSession {
            queue: FileCopyQueue::new(log_prefix.clone(), config.create_mode),
            policy: RelocationPolicy::new(target_root, config.create_mode),
            log_prefix,
            source_root,
            config,
            requested: ItemCategory::all(),
            replace: true,
            prefs: PrefStore::new(),
            state: State::Ready,
            started: None,
            ended: None,
            fatal_error: None,
        })
    }

    pub fn target_root(&self) -> &Path {
        self.policy.target_root()
    }

    pub fn queue(&self) -> &FileCopyQueue {
        &self.queue
    }

    pub fn cumulative_bytes_copied(&self) -> u64 {
        self.queue.bytes_copied()
    }

    pub fn total_bytes_expected(&self) -> u64 {
        self.queue.total_bytes_expected()
    }

    /// Whether the migration has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        State::Finished == self.state
    }

    /// Run every synchronous phase of the migration.
    ///
    /// `items` selects the categories to migrate; an empty mask selects all
    /// of them. `replace` is true when migrating into a fresh profile, in
    /// which case settings, junk training data and passwords are carried
    /// over; when false, those phases only send their notifications.
    ///
    /// On success, the session is ready to be stepped. On a fatal error, no
    /// further phases run, the migration is ended, and the error is
    /// returned.
    ///
    /// A session can only migrate once. Later calls do nothing.
    pub fn migrate<O: MigrationObserver + ?Sized>(
        &mut self,
        items: ItemCategory,
        replace: bool,
        observer: &mut O,
    ) -> Result<(), Error> {
        if State::Ready != self.state {
            warn!("{} Migration already run", self.log_prefix);
            return Ok(());
        }

        self.requested = ItemCategory::requested(items);
        self.replace = replace;
        self.started = Some(Utc::now());
        info!(
            "{} Migrating {} from {} to {}{}",
            self.log_prefix,
            self.requested,
            self.source_root.display(),
            self.target_root().display(),
            if replace { "" } else { " (existing profile)" },
        );
        observer.notify(MigrationEvent::Started);

        if let Err(e) = self.run_phases(observer) {
            error!("{} Migration aborted: {}", self.log_prefix, e);
            self.fatal_error = Some(e.to_string());
            self.state = State::Finished;
            self.ended = Some(Utc::now());
            observer.notify(MigrationEvent::Ended);
            return Err(e);
        }

        info!(
            "{} {} copies totalling {} bytes scheduled",
            self.log_prefix,
            self.queue.len(),
            self.queue.total_bytes_expected()
        );
        self.log_prefix.set_phase(ItemCategory::MAIL_DATA.name());
        observer.notify(MigrationEvent::ItemBeforeMigrate(
            ItemCategory::MAIL_DATA,
        ));
        self.state = State::Draining;
        Ok(())
    }

    /// Execute at most one scheduled copy.
    ///
    /// Returns whether there is more to do. When the last copy has run, the
    /// end of the migration is signalled to `observer`.
    pub fn step<O: MigrationObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> bool {
        if State::Draining != self.state {
            return false;
        }

        if self.queue.step().is_some() {
            observer
                .notify(MigrationEvent::Progress(self.queue.progress_percent()));
        }

        if self.queue.is_drained() {
            self.finish(observer);
            false
        } else {
            true
        }
    }

    /// Step until the queue is empty, pausing for the configured interval
    /// between steps.
    pub fn run_to_completion<O: MigrationObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) {
        let interval = self.config.step_interval();
        while self.step(observer) {
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
    }

    pub fn report(&self) -> MigrationReport {
        MigrationReport {
            source: self.source_root.to_string_lossy().into_owned(),
            target: self.target_root().to_string_lossy().into_owned(),
            replace: self.replace,
            requested: self.requested.names(),
            started: self.started,
            ended: self.ended,
            bytes_expected: self.queue.total_bytes_expected(),
            bytes_copied: self.queue.bytes_copied(),
            failed_categories: self.queue.failed_categories().names(),
            fatal_error: self.fatal_error.clone(),
            transactions: self
                .queue
                .transactions()
                .iter()
                .map(Into::into)
                .collect(),
        }
    }

    fn finish<O: MigrationObserver + ?Sized>(&mut self, observer: &mut O) {
        observer.notify(MigrationEvent::ItemAfterMigrate(
            ItemCategory::MAIL_DATA,
        ));
        self.log_prefix.clear_phase();

        let failed = self.queue.failed_categories();
        if failed.is_empty() {
            info!(
                "{} Migration complete; {} bytes copied",
                self.log_prefix,
                self.queue.bytes_copied()
            );
        } else {
            warn!(
                "{} Migration complete, but some copies of {} failed",
                self.log_prefix, failed
            );
        }

        self.state = State::Finished;
        self.ended = Some(Utc::now());
        observer.notify(MigrationEvent::Ended);
    }

    fn run_phases<O: MigrationObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<(), Error> {
        for &category in PHASES {
            if !self.requested.contains(category) {
                continue;
            }

            self.log_prefix.set_phase(category.name());
            observer.notify(MigrationEvent::ItemBeforeMigrate(category));
            let result = if ItemCategory::SETTINGS == category {
                self.copy_settings(observer)
            } else if ItemCategory::JUNK_TRAINING == category {
                self.copy_junk_training();
                Ok(())
            } else if ItemCategory::PASSWORDS == category {
                self.copy_passwords();
                Ok(())
            } else {
                // Account settings and news data were already carried over
                // along with the preferences.
                Ok(())
            };
            observer.notify(MigrationEvent::ItemAfterMigrate(category));
            self.log_prefix.clear_phase();
            result?;
        }

        Ok(())
    }

    fn copy_settings<O: MigrationObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<(), Error> {
        if !self.replace {
            info!(
                "{} Not replacing settings of an existing profile",
                self.log_prefix
            );
            return Ok(());
        }

        for name in VERBATIM_FILES {
            self.schedule_root_file(name, ItemCategory::SETTINGS);
        }

        self.transform_preferences(observer)
    }

    fn transform_preferences<O: MigrationObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<(), Error> {
        self.prefs.load(&self.source_root.join(PREFS_FILE))?;
        info!(
            "{} Loaded {} preferences",
            self.log_prefix,
            self.prefs.len()
        );

        let table = TransformTable::standard();
        let staged = table.extract(&self.prefs);

        let mut identities = self.prefs.branch(IDENTITY_BRANCH);
        let mut servers = self.prefs.branch(SERVER_BRANCH);
        let address_books = self.prefs.branch(ADDRESS_BOOK_BRANCH);
        let carried = CARRIED_BRANCHES
            .iter()
            .map(|prefix| self.prefs.branch(prefix))
            .collect::<Vec<_>>();

        {
            let mut rewriter = BranchRewriter::new(
                &self.log_prefix,
                &self.source_root,
                &self.prefs,
                &self.policy,
                &mut self.queue,
            );
            rewriter.rewrite_identities(&mut identities);
            rewriter.rewrite_servers(&mut servers);

            observer.notify(MigrationEvent::ItemBeforeMigrate(
                ItemCategory::ADDRESSBOOK_DATA,
            ));
            rewriter.rewrite_address_books(&address_books);
            observer.notify(MigrationEvent::ItemAfterMigrate(
                ItemCategory::ADDRESSBOOK_DATA,
            ));
        }

        // From here on, the image holds the new profile's preferences.
        self.prefs.reset();
        table.apply(&staged, &mut self.prefs);
        for branch in [&identities, &servers, &address_books]
            .into_iter()
            .chain(&carried)
        {
            self.prefs.write_branch(branch);
        }

        let dest = self.target_root().join(PREFS_FILE);
        self.prefs.save(&dest)?;
        info!(
            "{} Wrote {} preferences to {}",
            self.log_prefix,
            self.prefs.len(),
            dest.display()
        );
        Ok(())
    }

    fn copy_junk_training(&mut self) {
        if self.replace {
            self.schedule_root_file(
                JUNK_TRAINING_FILE,
                ItemCategory::JUNK_TRAINING,
            );
        }
    }

    fn copy_passwords(&mut self) {
        if !self.replace {
            return;
        }

        match signon_file_name(&self.source_root, self.replace) {
            Some(name) => {
                self.schedule_root_file(&name, ItemCategory::PASSWORDS)
            },
            None => info!("{} No saved passwords to copy", self.log_prefix),
        }
    }

    /// Schedule the copy of the file `name` at the root of the old profile
    /// to the root of the new one, if it exists.
    fn schedule_root_file(&mut self, name: &str, category: ItemCategory) {
        let source = self.source_root.join(name);
        if source.is_file() {
            let destination = self.target_root().join(name);
            self.queue.enqueue_file(&source, &destination, category);
        }
    }
}
