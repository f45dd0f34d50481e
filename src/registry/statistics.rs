// Net Connection - Statistics
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Traffic counters: cellular from the preference store, Wi-Fi from the daemon.

use tracing::info;

use super::{ConnectionContext, ConnectionHandle};
use crate::models::{Result, StatisticsTarget, StatisticsType};

impl ConnectionContext {
    /// Read one traffic counter. Counters never written read as zero.
    pub fn get_statistics(
        &self,
        handle: ConnectionHandle,
        target: StatisticsTarget,
        kind: StatisticsType,
    ) -> Result<u64> {
        self.lock().handles.ensure(handle)?;
        match target {
            StatisticsTarget::Cellular => Ok(self
                .shared
                .preferences
                .get(kind.cellular_key())?
                .unwrap_or(0)),
            StatisticsTarget::Wifi => self.daemon().wifi_statistics(kind),
        }
    }

    /// Zero one traffic counter.
    pub fn reset_statistics(
        &self,
        handle: ConnectionHandle,
        target: StatisticsTarget,
        kind: StatisticsType,
    ) -> Result<()> {
        self.lock().handles.ensure(handle)?;
        match target {
            StatisticsTarget::Cellular => self.shared.preferences.set(kind.cellular_key(), 0)?,
            StatisticsTarget::Wifi => self.daemon().reset_wifi_statistics(kind)?,
        }
        info!(target = ?target, kind = ?kind, "Statistics reset");
        Ok(())
    }
}
