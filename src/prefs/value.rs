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

/// The type tag of a preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefType {
    String,
    Bool,
    Int,
}

impl fmt::Display for PrefType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            PrefType::String => "string",
            PrefType::Bool => "boolean",
            PrefType::Int => "integer",
        })
    }
}

/// The value of a single preference.
///
/// The variant is decided when the preference is read and is never
/// reinterpreted; writing a value of another type over an existing preference
/// is rejected by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrefValue {
    String(String),
    Bool(bool),
    Int(i32),
}

impl PrefValue {
    pub fn pref_type(&self) -> PrefType {
        match *self {
            PrefValue::String(..) => PrefType::String,
            PrefValue::Bool(..) => PrefType::Bool,
            PrefValue::Int(..) => PrefType::Int,
        }
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::String(s.to_owned())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::String(s)
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Bool(b)
    }
}

impl From<i32> for PrefValue {
    fn from(i: i32) -> Self {
        PrefValue::Int(i)
    }
}
