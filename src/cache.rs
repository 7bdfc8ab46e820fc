// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 the wsaa-client contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! File-backed ticket cache.
//!
//! One JSON file per (CUIT, service) pair. Entries are replaced atomically
//! via a temp-file rename so a concurrent reader never observes a partial
//! write, and any entry that cannot be read back is treated as a miss
//! rather than an error: the worst case is a redundant re-issuance.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, WsaaError};
use crate::ticket::LoginTicketResponse;

/// Persistent store of issued tickets, one file per (CUIT, service) pair.
#[derive(Debug, Clone)]
pub struct TicketCache {
    dir: PathBuf,
}

impl TicketCache {
    /// Cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the cache entry for one (CUIT, service) pair.
    ///
    /// Both components are validated by the client before they reach the
    /// cache, which keeps the file name free of path separators.
    pub fn entry_path(&self, cuit: &str, service: &str) -> PathBuf {
        self.dir.join(format!("ta-{}-{}.json", cuit, service))
    }

    /// Load the cached ticket for a pair, if a usable one exists.
    ///
    /// Every failure degrades to a miss: a missing file is the common case,
    /// and a malformed one is logged and skipped so the caller re-issues.
    pub async fn read(&self, cuit: &str, service: &str) -> Option<LoginTicketResponse> {
        let path = self.entry_path(cuit, service);

        match self.read_entry(&path).await {
            Ok(ticket) => Some(ticket),
            Err(WsaaError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("no cached ticket at {}", path.display());
                None
            }
            Err(e) => {
                warn!("ignoring unusable ticket cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn read_entry(&self, path: &Path) -> Result<LoginTicketResponse> {
        let bytes = tokio::fs::read(path).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            WsaaError::cache_corruption(format!("malformed cache entry {}: {}", path.display(), e))
        })
    }

    /// Persist a ticket, atomically replacing any previous entry.
    pub async fn write(
        &self,
        cuit: &str,
        service: &str,
        ticket: &LoginTicketResponse,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.entry_path(cuit, service);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(ticket).map_err(std::io::Error::other)?;

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("cached ticket at {}", path.display());

        Ok(())
    }
}
