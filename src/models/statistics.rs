// Net Connection - Statistics Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Statistics counter selectors.

use serde::{Deserialize, Serialize};

/// Which connection's counters are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsTarget {
    /// Backed by the preference store.
    Cellular,
    /// Backed by the daemon.
    Wifi,
}

/// Which counter is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsType {
    LastReceived,
    LastSent,
    TotalReceived,
    TotalSent,
}

impl StatisticsType {
    pub const ALL: [StatisticsType; 4] = [
        Self::LastReceived,
        Self::LastSent,
        Self::TotalReceived,
        Self::TotalSent,
    ];

    /// Preference-store key holding the cellular counter.
    pub fn cellular_key(&self) -> &'static str {
        match self {
            Self::LastReceived => "db/dnet/statistics/cellular/lastrcv",
            Self::LastSent => "db/dnet/statistics/cellular/lastsnt",
            Self::TotalReceived => "db/dnet/statistics/cellular/totalrcv",
            Self::TotalSent => "db/dnet/statistics/cellular/totalsnt",
        }
    }

    /// Suffix of the daemon's Wi-Fi statistics methods (`GetWifi<suffix>`).
    pub fn wifi_method_suffix(&self) -> &'static str {
        match self {
            Self::LastReceived => "LastRxBytes",
            Self::LastSent => "LastTxBytes",
            Self::TotalReceived => "TotalRxBytes",
            Self::TotalSent => "TotalTxBytes",
        }
    }
}
