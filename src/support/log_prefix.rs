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
use std::sync::{Arc, Mutex};

/// Tracks text that should be included in at the start of every log statement.
///
/// Clones of a `LogPrefix` share the same underlying data, so the session can
/// update the current phase and every component holding a clone picks it up.
#[derive(Clone)]
pub struct LogPrefix {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone)]
struct Inner {
    profile: String,
    phase: Option<&'static str>,
}

impl LogPrefix {
    pub fn new(profile: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                profile: sanitise(profile),
                phase: None,
            })),
        }
    }

    pub fn set_phase(&self, phase: &'static str) {
        self.inner.lock().unwrap().phase = Some(phase);
    }

    pub fn clear_phase(&self) {
        self.inner.lock().unwrap().phase = None;
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        write!(f, "{}", inner.profile)?;
        if let Some(phase) = inner.phase {
            write!(f, "[{phase}]")?;
        }

        Ok(())
    }
}

fn sanitise(mut s: String) -> String {
    s.retain(|c| !c.is_control());
    if let Some((truncate_len, _)) = s.char_indices().nth(64) {
        s.truncate(truncate_len);
    }

    s
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let prefix = LogPrefix::new("default\n".to_owned());
        assert_eq!("default", prefix.to_string());

        let shared = prefix.clone();
        prefix.set_phase("settings");
        assert_eq!("default[settings]", shared.to_string());

        shared.clear_phase();
        assert_eq!("default", prefix.to_string());
    }
}
