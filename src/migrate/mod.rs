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

//! Migration of a legacy mail client profile into the current layout.
//!
//! The preference store of the old profile is read, a fixed set of simple
//! settings is carried over through the transform table, and the branches
//! describing identities, servers and address books are rewritten so that
//! every path they hold points into the new profile. The data behind those
//! paths is copied by a queue drained one copy at a time.

pub mod copy_queue;
pub mod model;
pub mod probe;
pub mod relocate;
pub mod report;
pub mod rewrite;
pub mod session;
pub mod transform;

pub use self::model::ItemCategory;
pub use self::probe::migratable_items;
pub use self::session::MigrationSession;
