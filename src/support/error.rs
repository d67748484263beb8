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

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::prefs::value::PrefType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Preference store '{}' is unreadable: {reason}", path.display())]
    StoreUnreadable { path: PathBuf, reason: String },
    #[error("Failed to write preference store '{}': {source}", path.display())]
    StoreWriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Preference '{0}' not found")]
    KeyNotFound(String),
    #[error("Preference '{key}' is {actual}, not {expected}")]
    TypeMismatch {
        key: String,
        expected: PrefType,
        actual: PrefType,
    },
    #[error("Unsafe file name")]
    UnsafeName,
    #[error("No unique name available under '{}'", .0.display())]
    NoUniqueName(PathBuf),
    #[error("Source profile '{}' not found", .0.display())]
    SourceProfileNotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}
