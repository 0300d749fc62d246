//! The table of geographic timezones users may live in. Computed once at
//! process start and immutable afterwards.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::{Tz, TZ_VARIANTS};
use std::collections::{HashMap, HashSet};

/// Only "Area/Location" identifiers are valid; bare abbreviations such as
/// `EST` are excluded.
#[derive(Debug)]
pub struct ZoneTable {
    zones: Vec<Tz>,
    names: HashSet<&'static str>,
}

impl ZoneTable {
    pub fn new() -> Self {
        let mut zones: Vec<Tz> = TZ_VARIANTS
            .iter()
            .copied()
            .filter(|tz| tz.name().contains('/'))
            .collect();
        zones.sort_by_key(|tz| tz.name());
        let names = zones.iter().map(|tz| tz.name()).collect();
        Self { zones, names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Valid identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.zones.iter().map(|tz| tz.name())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Every zone whose local hour at `at` is exactly `hour` (0-23), mapped
    /// to its local calendar date at that instant.
    pub fn at_hour(&self, hour: u32, at: DateTime<Utc>) -> HashMap<&'static str, NaiveDate> {
        let mut zones = HashMap::new();
        for tz in &self.zones {
            let local = at.with_timezone(tz);
            if local.hour() == hour {
                zones.insert(tz.name(), local.date_naive());
            }
        }
        zones
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::new()
    }
}
