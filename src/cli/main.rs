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

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use structopt::StructOpt;

use crate::migrate::ItemCategory;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
enum Command {
    Probe(ProbeSubcommand),
    Migrate(MigrateSubcommand),
}

impl Command {
    fn common_options(&mut self) -> CommonOptions {
        match *self {
            Command::Probe(ref mut c) => mem::take(&mut c.common),
            Command::Migrate(ref mut c) => mem::take(&mut c.common),
        }
    }
}

#[derive(StructOpt, Default)]
pub(super) struct CommonOptions {
    /// The TOML configuration file to use. A `logging.toml` in the same
    /// directory configures logging when not running on a terminal.
    /// [default: built-in defaults]
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

/// List the kinds of data that can be migrated out of a legacy profile.
///
/// One category name is printed per line. These are the names accepted by
/// `migrate --items`.
#[derive(StructOpt)]
pub(super) struct ProbeSubcommand {
    #[structopt(flatten)]
    pub(super) common: CommonOptions,

    /// Probe as for a migration into an existing profile.
    #[structopt(long)]
    pub(super) existing_profile: bool,

    /// The root directory of the legacy profile.
    #[structopt(parse(from_os_str))]
    pub(super) source: PathBuf,
}

/// Migrate a legacy profile into the current profile layout.
///
/// The new `prefs.js` is written to the target directory, and then mail
/// stores, signatures, address books and the other data files referenced by
/// the old profile are copied one by one. A failed copy does not stop the
/// migration; the exit status is 75 (EX_TEMPFAIL) if any copy failed.
///
/// Migration does not lock either profile. Neither the old nor the new mail
/// client should be running while it happens.
#[derive(StructOpt)]
pub(super) struct MigrateSubcommand {
    #[structopt(flatten)]
    pub(super) common: CommonOptions,

    /// Only migrate these categories, comma-separated. Categories are
    /// settings, account-settings, address-books, junk-training, passwords,
    /// news, mail. [default: all]
    #[structopt(
        long,
        use_delimiter = true,
        require_delimiter = true,
        parse(try_from_str = parse_item_category)
    )]
    pub(super) items: Vec<ItemCategory>,

    /// The target is an existing profile. Settings, junk mail training and
    /// passwords are left alone.
    #[structopt(long)]
    pub(super) existing_profile: bool,

    /// Write a TOML report of everything that was done to this file.
    #[structopt(long, parse(from_os_str))]
    pub(super) report: Option<PathBuf>,

    /// The root directory of the legacy profile.
    #[structopt(parse(from_os_str))]
    pub(super) source: PathBuf,

    /// The root directory of the new profile. It is created if needed.
    #[structopt(parse(from_os_str))]
    pub(super) target: PathBuf,
}

pub(super) fn parse_item_category(s: &str) -> Result<ItemCategory, String> {
    ItemCategory::from_cli_name(s).ok_or_else(|| {
        format!(
            "Unknown category '{}'; expected one of {}",
            s,
            ItemCategory::all()
        )
    })
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let mut cmd = Command::from_clap(&match Command::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let common = cmd.common_options();
    let system_config = match common.config {
        Some(ref path) => load_config(path),
        None => SystemConfig::default(),
    };
    init_logging(common.config.as_deref());

    match cmd {
        Command::Probe(cmd) => super::migrate::probe(cmd),
        Command::Migrate(cmd) => super::migrate::migrate(system_config, cmd),
    }
}

fn load_config(path: &Path) -> SystemConfig {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading '{}': {}", path.display(), e);
            EX_CONFIG.exit()
        },
    };

    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error in config file at '{}': {}", path.display(), e);
            EX_CONFIG.exit()
        },
    }
}

fn init_logging(config_path: Option<&Path>) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log();
        return;
    }

    // log4rs and syslog can't be combined, so a log4rs configuration
    // replaces syslog entirely.
    let log_config_file = config_path
        .and_then(Path::parent)
        .map(|dir| dir.join("logging.toml"));
    if let Some(log_config_file) = log_config_file.filter(|f| f.is_file()) {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            eprintln!(
                "Failed to initialise logging from '{}': {}",
                log_config_file.display(),
                e
            );
            EX_CONFIG.exit();
        }
        return;
    }

    let formatter = syslog::Formatter3164 {
        facility: syslog::Facility::LOG_USER,
        hostname: None,
        process: env!("CARGO_PKG_NAME").to_owned(),
        pid: nix::unistd::getpid().as_raw(),
    };

    match syslog::unix(formatter) {
        Ok(logger) => {
            if log::set_boxed_logger(Box::new(syslog::BasicLogger::new(
                logger,
            )))
            .is_ok()
            {
                log::set_max_level(log::LevelFilter::Info);
            }
        },
        // Still try to do the migration. Failures are reported on stderr
        // regardless of logging.
        Err(e) => eprintln!("Failed to connect to syslog: {}", e),
    }
}
