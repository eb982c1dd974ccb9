// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline persistence.
//!
//! A timeline is written as a structured tree (`serde_json::Value`) holding
//! every track, clip and effect together with their automation data. Project
//! files wrap that tree in a versioned RON document.

use crate::error::EngineError;
use crate::parameters::TimelineParameters;
use crate::timeline::Timeline;
use crate::track::{Track, TrackRecord};
use cadence_automation::{refresh_backing_storage, ParameterRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current project file format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Project file extension
pub const PROJECT_FILE_EXTENSION: &str = "cadence";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimelineRecord {
    name: String,
    frame_rate: f64,
    play_head: i64,
    max_duration: i64,
    automation: serde_json::Value,
    #[serde(default)]
    tracks: Vec<TrackRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectFile {
    version: u32,
    timeline: TimelineRecord,
}

impl Timeline {
    fn to_record(&self) -> Result<TimelineRecord, EngineError> {
        Ok(TimelineRecord {
            name: self.name.clone(),
            frame_rate: self.frame_rate,
            play_head: self.play_head(),
            max_duration: self.max_duration(),
            automation: self.automation().serialize()?,
            tracks: self.tracks().map(Track::to_record).collect::<Result<_, _>>()?,
        })
    }

    fn from_record(
        record: &TimelineRecord,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, EngineError> {
        let mut timeline = Timeline::new(record.name.clone());
        timeline.frame_rate = record.frame_rate;
        timeline.set_max_duration(record.max_duration);
        timeline.set_play_head(record.play_head)?;
        timeline.automation_mut().deserialize(&record.automation, registry)?;
        for track in &record.tracks {
            timeline.add_track(Track::from_record(track, registry, params)?);
        }
        refresh_backing_storage(&mut timeline)?;
        Ok(timeline)
    }

    /// Persist the whole hierarchy into a structured tree
    pub fn write_tree(&self) -> Result<serde_json::Value, EngineError> {
        serde_json::to_value(self.to_record()?).map_err(|e| EngineError::Project(e.to_string()))
    }

    /// Rebuild a timeline from a tree written by [`Timeline::write_tree`].
    ///
    /// Every owner's state is refreshed from its static values afterwards.
    pub fn read_tree(
        tree: &serde_json::Value,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, EngineError> {
        let record: TimelineRecord =
            serde_json::from_value(tree.clone()).map_err(|e| EngineError::Project(e.to_string()))?;
        Self::from_record(&record, registry, params)
    }

    /// Save the timeline as a RON project file
    pub fn save_project(&self, path: &Path) -> Result<(), EngineError> {
        let project = ProjectFile {
            version: PROJECT_FORMAT_VERSION,
            timeline: self.to_record()?,
        };
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(&project, config).map_err(|e| EngineError::Project(e.to_string()))?;
        std::fs::write(path, content)?;

        tracing::info!(path = %path.display(), tracks = self.track_count(), "Saved project");
        Ok(())
    }

    /// Load a project file written by [`Timeline::save_project`]
    pub fn load_project(
        path: &Path,
        registry: &ParameterRegistry,
        params: &TimelineParameters,
    ) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let project: ProjectFile = ron::from_str(&content).map_err(|e| {
            tracing::warn!(path = %path.display(), "Failed to parse project: {}", e);
            EngineError::Project(e.to_string())
        })?;

        if project.version > PROJECT_FORMAT_VERSION {
            return Err(EngineError::Project(format!(
                "Project version {} is newer than supported version {}",
                project.version, PROJECT_FORMAT_VERSION
            )));
        }

        let timeline = Self::from_record(&project.timeline, registry, params)?;
        tracing::info!(path = %path.display(), tracks = timeline.track_count(), "Loaded project");
        Ok(timeline)
    }
}
