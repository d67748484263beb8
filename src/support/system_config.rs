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

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The configuration for Profmig.
///
/// This is stored in a TOML file passed with `--config`. Every section is
/// optional; a missing file section takes its defaults.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Options controlling how the copy queue is drained.
    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// How long to pause between copy transactions, in milliseconds.
    ///
    /// Each pause gives the host a chance to process other events. Setting
    /// this to 0 drains the queue as fast as the disks allow.
    pub step_interval_ms: u64,

    /// The UNIX permission bits for directories created in the new profile.
    ///
    /// Profiles contain credentials, so the default only grants access to
    /// the owning user.
    pub create_mode: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            step_interval_ms: 1,
            create_mode: 0o700,
        }
    }
}

impl QueueConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}
