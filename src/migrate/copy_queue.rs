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

//! The queue of file and directory copies a migration performs.
//!
//! Copies are only scheduled while the preferences are rewritten. They are
//! executed afterwards, one per call to `FileCopyQueue::step`, in the order
//! they were scheduled.

use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::model::ItemCategory;
use crate::support::{error::Error, file_ops, log_prefix::LogPrefix};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn name(self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
        }
    }
}

/// One scheduled copy.
///
/// Everything but `outcome` and `error` is fixed when the transaction is
/// queued.
#[derive(Clone, Debug)]
pub struct CopyTransaction {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// If true, the whole tree under `source` is copied into `destination`.
    pub is_directory: bool,
    /// Bytes expected to be copied, measured when the transaction was queued.
    pub size: u64,
    pub category: ItemCategory,
    pub outcome: Outcome,
    /// Description of the failure, if `outcome` is `Failed`.
    pub error: Option<String>,
}

pub struct FileCopyQueue {
    log_prefix: LogPrefix,
    create_mode: u32,
    transactions: Vec<CopyTransaction>,
    destinations: HashSet<PathBuf>,
    next: usize,
    bytes_processed: u64,
    bytes_copied: u64,
}

impl FileCopyQueue {
    pub fn new(log_prefix: LogPrefix, create_mode: u32) -> Self {
        FileCopyQueue {
            log_prefix,
            create_mode,
            transactions: Vec::new(),
            destinations: HashSet::new(),
            next: 0,
            bytes_processed: 0,
            bytes_copied: 0,
        }
    }

    /// Schedule the copy of the regular file `source` to `destination`.
    ///
    /// If `destination` is already the target of another scheduled copy or
    /// already exists, nothing is scheduled and this returns false. The first
    /// copy to claim a destination wins.
    pub fn enqueue_file(
        &mut self,
        source: &Path,
        destination: &Path,
        category: ItemCategory,
    ) -> bool {
        if self.destinations.contains(destination) || destination.exists() {
            debug!(
                "{} {} already taken, not copying {}",
                self.log_prefix,
                destination.display(),
                source.display()
            );
            return false;
        }

        self.push(source, destination, false, category);
        true
    }

    /// Schedule the copy of the tree under `source` into the directory
    /// `destination`.
    pub fn enqueue_directory(
        &mut self,
        source: &Path,
        destination: &Path,
        category: ItemCategory,
    ) {
        self.push(source, destination, true, category);
    }

    fn push(
        &mut self,
        source: &Path,
        destination: &Path,
        is_directory: bool,
        category: ItemCategory,
    ) {
        let size = file_ops::tree_size(source).unwrap_or_else(|e| {
            warn!(
                "{} Unable to determine size of {}: {}",
                self.log_prefix,
                source.display(),
                e
            );
            0
        });

        debug!(
            "{} Scheduling copy of {} ({} bytes) to {}",
            self.log_prefix,
            source.display(),
            size,
            destination.display()
        );

        self.destinations.insert(destination.to_owned());
        self.transactions.push(CopyTransaction {
            source: source.to_owned(),
            destination: destination.to_owned(),
            is_directory,
            size,
            category,
            outcome: Outcome::Pending,
            error: None,
        });
    }

    pub fn transactions(&self) -> &[CopyTransaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Whether every transaction has been executed.
    pub fn is_drained(&self) -> bool {
        self.next >= self.transactions.len()
    }

    /// The total size of every scheduled transaction.
    pub fn total_bytes_expected(&self) -> u64 {
        self.transactions.iter().map(|t| t.size).sum()
    }

    /// Bytes actually written by successful transactions so far.
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }

    /// How much of the expected payload has been dealt with, successfully or
    /// not, as a percentage.
    pub fn progress_percent(&self) -> u8 {
        let total = self.total_bytes_expected();
        if 0 == total {
            return if self.is_drained() { 100 } else { 0 };
        }

        (self.bytes_processed.min(total) * 100 / total) as u8
    }

    /// The categories with at least one failed transaction.
    pub fn failed_categories(&self) -> ItemCategory {
        self.transactions
            .iter()
            .filter(|t| Outcome::Failed == t.outcome)
            .fold(ItemCategory::empty(), |acc, t| acc | t.category)
    }

    /// Execute the next pending transaction.
    ///
    /// Returns the transaction that was run, or `None` if the queue is
    /// already drained. A failed copy is recorded on the transaction and does
    /// not prevent later ones from running.
    pub fn step(&mut self) -> Option<&CopyTransaction> {
        let ix = self.next;
        if ix >= self.transactions.len() {
            return None;
        }
        self.next += 1;

        let result = execute(&self.transactions[ix], self.create_mode);
        let transaction = &mut self.transactions[ix];
        match result {
            Ok(copied) => {
                info!(
                    "{} Copied {} to {}",
                    self.log_prefix,
                    transaction.source.display(),
                    transaction.destination.display()
                );
                transaction.outcome = Outcome::Succeeded;
                self.bytes_copied += copied;
            },
            Err(e) => {
                warn!(
                    "{} Failed to copy {} to {}: {}",
                    self.log_prefix,
                    transaction.source.display(),
                    transaction.destination.display(),
                    e
                );
                transaction.outcome = Outcome::Failed;
                transaction.error = Some(e.to_string());
            },
        }

        self.bytes_processed += transaction.size;
        Some(&self.transactions[ix])
    }
}

fn execute(transaction: &CopyTransaction, mode: u32) -> Result<u64, Error> {
    if transaction.is_directory {
        if !transaction.source.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "source is not a directory",
            )));
        }

        fs::DirBuilder::new()
            .recursive(true)
            .mode(mode)
            .create(&transaction.destination)?;
        file_ops::copy_tree(&transaction.source, &transaction.destination, mode)
    } else {
        Ok(file_ops::copy_file_noclobber(
            &transaction.source,
            &transaction.destination,
            mode,
        )?)
    }
}
