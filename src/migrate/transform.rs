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

//! Carrying simple settings across the reset of the preference store.

use log::{debug, warn};

use crate::prefs::{PrefStore, PrefType, PrefValue};
use crate::support::error::Error;

/// Copies one preference from the old store to the new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformRule {
    pub source_key: &'static str,
    pub dest_key: &'static str,
    pub pref_type: PrefType,
}

impl TransformRule {
    pub const fn same(key: &'static str, pref_type: PrefType) -> Self {
        TransformRule {
            source_key: key,
            dest_key: key,
            pref_type,
        }
    }

    pub const fn renamed(
        source_key: &'static str,
        dest_key: &'static str,
        pref_type: PrefType,
    ) -> Self {
        TransformRule {
            source_key,
            dest_key,
            pref_type,
        }
    }
}

/// An ordered list of transform rules.
#[derive(Clone, Debug)]
pub struct TransformTable {
    rules: Vec<TransformRule>,
}

/// Values pulled out of a source store by `TransformTable::extract`, waiting
/// to be written into the destination store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedValues {
    values: Vec<(TransformRule, PrefValue)>,
}

impl TransformTable {
    pub fn new(rules: Vec<TransformRule>) -> Self {
        TransformTable { rules }
    }

    /// The settings carried over from a legacy profile.
    pub fn standard() -> Self {
        use PrefType::*;

        Self::new(vec![
            TransformRule::same("signon.SignonFileName", String),
            TransformRule::same("mailnews.headers.showUserAgent", Bool),
            TransformRule::same("mailnews.headers.showOrganization", Bool),
            TransformRule::same("mail.collect_addressbook", String),
            TransformRule::same("mail.collect_email_address_outgoing", Bool),
            TransformRule::same("mail.wrap_long_lines", Bool),
            TransformRule::same("mailnews.customHeaders", String),
            TransformRule::same("mail.default_html_action", Int),
            TransformRule::same("mail.forward_message_mode", Int),
            TransformRule::same("mail.SpellCheckBeforeSend", Bool),
            TransformRule::same("mail.warn_on_send_accel_key", Bool),
            TransformRule::same("mailnews.html_domains", String),
            TransformRule::same("mailnews.plaintext_domains", String),
            TransformRule::same("mail.biff.play_sound", Bool),
            TransformRule::same("mail.biff.play_sound.type", Int),
            TransformRule::same("mail.biff.play_sound.url", String),
            TransformRule::same("mail.biff.show_alert", Bool),
            TransformRule::same("network.proxy.type", Int),
            TransformRule::same("network.proxy.http", String),
            TransformRule::same("network.proxy.http_port", Int),
            TransformRule::same("network.proxy.ftp", String),
            TransformRule::same("network.proxy.ftp_port", Int),
            TransformRule::same("network.proxy.ssl", String),
            TransformRule::same("network.proxy.ssl_port", Int),
            TransformRule::same("network.proxy.socks", String),
            TransformRule::same("network.proxy.socks_port", Int),
            TransformRule::same("network.proxy.no_proxies_on", String),
            TransformRule::same("network.proxy.autoconfig_url", String),
            TransformRule::same("mail.accountmanager.accounts", String),
            TransformRule::same("mail.accountmanager.defaultaccount", String),
            TransformRule::same(
                "mail.accountmanager.localfoldersserver",
                String,
            ),
            TransformRule::same("mail.smtp.defaultserver", String),
            TransformRule::same("mail.smtpservers", String),
            TransformRule::same("msgcompose.font_face", String),
            TransformRule::same("msgcompose.font_size", String),
            TransformRule::same("msgcompose.text_color", String),
            TransformRule::same("msgcompose.background_color", String),
            // The pane layout moved to a new key in the new client; the value
            // keeps its meaning.
            TransformRule::renamed(
                "mail.pane_config",
                "mail.pane_config.dynamic",
                Int,
            ),
        ])
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    /// Read the value of every rule out of `source`.
    ///
    /// Rules whose key is absent are skipped; legacy profiles vary in which
    /// settings they have. A value of the wrong type is logged and skipped.
    pub fn extract(&self, source: &PrefStore) -> StagedValues {
        let mut staged = StagedValues::default();

        for rule in &self.rules {
            match source.get(rule.source_key) {
                Ok(value) if value.pref_type() == rule.pref_type => {
                    staged.values.push((*rule, value.clone()));
                },
                Ok(value) => warn!(
                    "Not carrying over preference: {}",
                    Error::TypeMismatch {
                        key: rule.source_key.to_owned(),
                        expected: rule.pref_type,
                        actual: value.pref_type(),
                    }
                ),
                Err(_) => debug!("{} not set; skipping", rule.source_key),
            }
        }

        staged
    }

    /// Write every staged value into `dest` under its destination key, in
    /// table order.
    pub fn apply(&self, staged: &StagedValues, dest: &mut PrefStore) {
        for &(ref rule, ref value) in &staged.values {
            if let Err(e) = dest.set(rule.dest_key, value.clone()) {
                warn!("Not carrying over preference: {}", e);
            }
        }
    }
}

impl StagedValues {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up the staged value read from `source_key`.
    pub fn get(&self, source_key: &str) -> Option<&PrefValue> {
        self.values
            .iter()
            .find(|&&(ref rule, _)| rule.source_key == source_key)
            .map(|&(_, ref value)| value)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    fn sample_value(pref_type: PrefType, ix: usize) -> PrefValue {
        match pref_type {
            PrefType::String => PrefValue::String(format!("value {}", ix)),
            PrefType::Bool => PrefValue::Bool(0 == ix % 2),
            PrefType::Int => PrefValue::Int(ix as i32 - 7),
        }
    }

    #[test]
    fn every_rule_reproduces_its_value() {
        let table = TransformTable::standard();
        let mut source = PrefStore::new();
        for (ix, rule) in table.rules().iter().enumerate() {
            source
                .set(rule.source_key, sample_value(rule.pref_type, ix))
                .unwrap();
        }

        let staged = table.extract(&source);
        assert_eq!(table.rules().len(), staged.len());

        let mut dest = PrefStore::new();
        table.apply(&staged, &mut dest);

        for (ix, rule) in table.rules().iter().enumerate() {
            assert_eq!(
                &sample_value(rule.pref_type, ix),
                dest.get(rule.dest_key).unwrap(),
                "Wrong value for {}",
                rule.dest_key
            );
        }

        // The renamed rule must not also leave its source key behind
        assert!(!dest.contains("mail.pane_config"));
        assert_eq!(table.rules().len(), dest.len());
    }

    #[test]
    fn pane_config_is_renamed() {
        let table = TransformTable::standard();
        let mut source = PrefStore::new();
        source.set("mail.pane_config", 1.into()).unwrap();

        let mut dest = PrefStore::new();
        table.apply(&table.extract(&source), &mut dest);
        assert_eq!(
            &PrefValue::Int(1),
            dest.get("mail.pane_config.dynamic").unwrap()
        );
        assert_eq!(1, dest.len());
    }

    #[test]
    fn absent_and_mistyped_values_are_skipped() {
        let table = TransformTable::standard();
        let mut source = PrefStore::new();
        source.set("mail.wrap_long_lines", "yes".into()).unwrap();
        source.set("network.proxy.http_port", 3128.into()).unwrap();
        source.set("some.unrelated.pref", true.into()).unwrap();

        let staged = table.extract(&source);
        assert_eq!(1, staged.len());
        assert_eq!(
            Some(&PrefValue::Int(3128)),
            staged.get("network.proxy.http_port")
        );
        assert_eq!(None, staged.get("mail.wrap_long_lines"));
    }

    #[test]
    fn standard_table_has_no_collisions() {
        let table = TransformTable::standard();
        let mut seen = HashSet::new();
        for rule in table.rules() {
            assert!(seen.insert(rule.dest_key), "{} twice", rule.dest_key);
        }

        assert_eq!(
            1,
            table
                .rules()
                .iter()
                .filter(|r| r.source_key != r.dest_key)
                .count()
        );
    }
}
