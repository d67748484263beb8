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

use chrono::prelude::*;
use serde::Serialize;

use super::copy_queue::CopyTransaction;

/// A summary of what a migration did, suitable for saving.
#[derive(Clone, Debug, Serialize)]
pub struct MigrationReport {
    pub source: String,
    pub target: String,
    pub replace: bool,
    pub requested: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,
    pub bytes_expected: u64,
    pub bytes_copied: u64,
    /// Categories with at least one failed copy.
    pub failed_categories: Vec<&'static str>,
    /// The error which stopped the migration early, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
    pub transactions: Vec<TransactionReport>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TransactionReport {
    pub source: String,
    pub destination: String,
    pub directory: bool,
    pub category: &'static str,
    pub size: u64,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&CopyTransaction> for TransactionReport {
    fn from(tx: &CopyTransaction) -> Self {
        TransactionReport {
            source: tx.source.to_string_lossy().into_owned(),
            destination: tx.destination.to_string_lossy().into_owned(),
            directory: tx.is_directory,
            category: tx.category.name(),
            size: tx.size,
            outcome: tx.outcome.name(),
            error: tx.error.clone(),
        }
    }
}

impl MigrationReport {
    /// Whether anything at all went wrong.
    pub fn is_clean(&self) -> bool {
        self.fatal_error.is_none() && self.failed_categories.is_empty()
    }
}
