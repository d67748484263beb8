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

use std::path::Path;

use log::error;

use super::main::{MigrateSubcommand, ProbeSubcommand};
use crate::migrate::model::LogObserver;
use crate::migrate::report::MigrationReport;
use crate::migrate::{migratable_items, ItemCategory, MigrationSession};
use crate::support::{file_ops, sysexits::*, system_config::SystemConfig};

pub(super) fn probe(cmd: ProbeSubcommand) {
    match migratable_items(&cmd.source, !cmd.existing_profile) {
        Ok(items) => {
            for name in items.names() {
                println!("{}", name);
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            Sysexit::for_error(&e).exit()
        },
    }
}

pub(super) fn migrate(system_config: SystemConfig, cmd: MigrateSubcommand) {
    let items = cmd
        .items
        .iter()
        .fold(ItemCategory::empty(), |acc, &item| acc | item);

    let mut session =
        match MigrationSession::new(cmd.source, cmd.target, system_config.queue)
        {
            Ok(session) => session,
            Err(e) => {
                eprintln!("{}", e);
                Sysexit::for_error(&e).exit()
            },
        };

    let mut observer = LogObserver::default();
    let result = session.migrate(items, !cmd.existing_profile, &mut observer);
    if result.is_ok() {
        session.run_to_completion(&mut observer);
    }

    let report = session.report();
    if let Some(ref path) = cmd.report {
        write_report(path, &report);
    }

    if let Err(e) = result {
        eprintln!("Migration failed: {}", e);
        Sysexit::for_error(&e).exit();
    }

    println!(
        "Copied {} of {} bytes into {}",
        report.bytes_copied,
        report.bytes_expected,
        session.target_root().display()
    );

    if !report.failed_categories.is_empty() {
        eprintln!(
            "Some data could not be copied: {}",
            report.failed_categories.join(", ")
        );
        EX_TEMPFAIL.exit();
    }
}

fn write_report(path: &Path, report: &MigrationReport) {
    let data = match toml::to_string(report) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialise report: {}", e);
            EX_SOFTWARE.exit()
        },
    };

    let tmp = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(e) = file_ops::spit(tmp, path, true, 0o600, data.as_bytes()) {
        eprintln!("Failed to write report to '{}': {}", path.display(), e);
        EX_CANTCREAT.exit();
    }
}
