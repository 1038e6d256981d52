//! Multi-file session.
//!
//! Holds several independently parsed files, one of which is active. Each
//! file keeps its detected roles and its own coordinate overrides; the
//! timeline configuration is shared. Deriving the active file always starts
//! from scratch.

use serde::Serialize;
use uuid::Uuid;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::config::{Config, DEFAULT_MAX_FILES};
use crate::detect::detect;
use crate::error::{SessionError, SessionResult};
use crate::models::{HeaderRoles, Table, TimelineConfig};
use crate::parser::{parse_bytes_with_limit, MAX_PARSE_WARNINGS};
use crate::timeline::year_domain;
use crate::transform::pipeline::{apply_overrides, derive_features, FeatureSet, FieldOverrides};

/// A file loaded into the session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedFile {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Load timestamp (RFC 3339)
    pub loaded_at: String,
    pub table: Table,
    /// Roles found by header detection
    pub detected: HeaderRoles,
    /// User-chosen coordinate columns
    pub overrides: FieldOverrides,
}

impl LoadedFile {
    /// Detected roles with the overrides applied.
    pub fn roles(&self) -> HeaderRoles {
        let mut roles = self.detected.clone();
        // Overrides are validated when set
        if let Some(lat) = &self.overrides.lat_field {
            roles.lat_field = Some(lat.clone());
        }
        if let Some(lon) = &self.overrides.lon_field {
            roles.lon_field = Some(lon.clone());
        }
        roles
    }
}

/// Features derived for the active file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDerivation {
    pub file_id: String,
    pub roles: HeaderRoles,
    /// Shared timeline with this file's year domain
    pub timeline: TimelineConfig,
    pub features: FeatureSet,
}

/// Session holding up to `max_files` parsed files
pub struct Session {
    max_files: usize,
    max_parse_warnings: usize,
    files: Vec<LoadedFile>,
    active: Option<String>,
    timeline: TimelineConfig,
}

impl Session {
    pub fn new(max_files: usize) -> Self {
        Self {
            max_files,
            max_parse_warnings: MAX_PARSE_WARNINGS,
            files: Vec::new(),
            active: None,
            timeline: TimelineConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_parse_warnings: config.max_parse_warnings,
            ..Self::new(config.max_files)
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Parse raw bytes and add them as a new file. The first file added
    /// becomes active.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> SessionResult<&LoadedFile> {
        self.ensure_capacity()?;
        let table = parse_bytes_with_limit(bytes, self.max_parse_warnings);
        self.add_table(name, table)
    }

    pub fn add_text(&mut self, name: &str, text: &str) -> SessionResult<&LoadedFile> {
        self.add_bytes(name, text.as_bytes())
    }

    /// Add an already parsed table.
    pub fn add_table(&mut self, name: &str, table: Table) -> SessionResult<&LoadedFile> {
        self.ensure_capacity()?;

        if !table.parse_errors.is_empty() {
            log_warning(format!("{}: {} parse warning(s)", name, table.parse_errors.len()));
        }

        let file = LoadedFile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            loaded_at: chrono::Utc::now().to_rfc3339(),
            detected: detect(&table.headers),
            table,
            overrides: FieldOverrides::default(),
        };
        log_success(format!("Loaded {} ({} rows)", file.name, file.table.total_rows));

        if self.active.is_none() {
            self.active = Some(file.id.clone());
        }
        self.files.push(file);

        let index = self.files.len() - 1;
        Ok(&self.files[index])
    }

    /// Remove a file. When it was active, the first remaining file becomes
    /// active.
    pub fn remove(&mut self, id: &str) -> SessionResult<LoadedFile> {
        let index = self.index_of(id)?;
        let file = self.files.remove(index);

        if self.active.as_deref() == Some(id) {
            self.active = self.files.first().map(|f| f.id.clone());
        }
        log_info(format!("Removed {}", file.name));
        Ok(file)
    }

    /// Files in load order.
    pub fn files(&self) -> &[LoadedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LoadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn active(&self) -> Option<&LoadedFile> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    pub fn set_active(&mut self, id: &str) -> SessionResult<()> {
        self.index_of(id)?;
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Set a file's coordinate overrides. Columns must exist in the file;
    /// on error the previous overrides stay in place.
    pub fn set_overrides(&mut self, id: &str, overrides: FieldOverrides) -> SessionResult<()> {
        let index = self.index_of(id)?;
        let file = &mut self.files[index];

        // Validate against a scratch copy
        let mut roles = file.detected.clone();
        apply_overrides(&mut roles, &file.table, &overrides, &file.name)?;

        file.overrides = overrides;
        Ok(())
    }

    pub fn timeline(&self) -> &TimelineConfig {
        &self.timeline
    }

    pub fn set_timeline(&mut self, timeline: TimelineConfig) {
        self.timeline = timeline.normalized();
    }

    /// Derive features for the active file, or `None` without one.
    pub fn derive_active(&self) -> Option<ActiveDerivation> {
        let file = self.active()?;
        let roles = file.roles();

        let domain = year_domain(&file.table.rows, &roles.time, &roles.range);
        let timeline = self.timeline.clone().with_domain(domain);
        let features = derive_features(&file.table.rows, &roles, &timeline);

        Some(ActiveDerivation {
            file_id: file.id.clone(),
            roles,
            timeline,
            features,
        })
    }

    fn ensure_capacity(&self) -> SessionResult<()> {
        if self.files.len() >= self.max_files {
            return Err(SessionError::TooManyFiles {
                limit: self.max_files,
            });
        }
        Ok(())
    }

    fn index_of(&self, id: &str) -> SessionResult<usize> {
        self.files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| SessionError::UnknownFile(id.to_string()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES)
    }
}
