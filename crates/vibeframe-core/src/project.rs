use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    ids::{EntityKind, IdAllocator},
    model::{
        AspectRatio, Clip, DEFAULT_AUDIO_TRACK_ORDER, DEFAULT_PROJECT_NAME,
        DEFAULT_VIDEO_TRACK_ORDER, Effect, EffectKind, PROJECT_FILE_VERSION, ParamValue,
        ProjectFile, ProjectMeta, ProjectState, ProjectSummary, Source, SourceKind, Track,
        TrackKind,
    },
    time::{TIME_EPSILON, approx_eq, clamp_noise, is_non_negative, is_positive},
};

/// Display name for a reference that no longer resolves.
pub const UNKNOWN_REFERENCE: &str = "unknown";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditError {
    #[error("source not found: {0}")]
    SourceNotFound(String),
    #[error("track not found: {0}")]
    TrackNotFound(String),
    #[error("clip not found: {0}")]
    ClipNotFound(String),
    #[error("invalid {field}: {reason}")]
    InvalidRange { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid project json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported project file version {found} (newest supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("duplicate {kind} id in project file: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("clip {id} has an invalid time window: {reason}")]
    InvalidClip { id: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSourceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub order: i32,
    pub is_muted: bool,
    pub is_locked: bool,
    pub is_visible: bool,
}

impl AddTrackRequest {
    /// Unmuted, unlocked, visible lane layered by the usual order for its kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            order: match kind {
                TrackKind::Video => DEFAULT_VIDEO_TRACK_ORDER,
                TrackKind::Audio => DEFAULT_AUDIO_TRACK_ORDER,
            },
            is_muted: false,
            is_locked: false,
            is_visible: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddClipRequest {
    pub source_id: String,
    pub track_id: String,
    pub start_time: f64,
    pub duration: f64,
    pub source_start_offset: f64,
    pub source_end_offset: f64,
}

impl AddClipRequest {
    /// Places the whole of `source` on `track_id` at `start_time`.
    #[must_use]
    pub fn spanning(source: &Source, track_id: impl Into<String>, start_time: f64) -> Self {
        Self {
            source_id: source.id.clone(),
            track_id: track_id.into(),
            start_time,
            duration: source.duration,
            source_start_offset: 0.0,
            source_end_offset: source.duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEffectRequest {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl AddEffectRequest {
    #[must_use]
    pub fn new(kind: EffectKind, start_time: f64, duration: f64) -> Self {
        Self {
            kind,
            start_time,
            duration,
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A clip together with whatever its references still resolve to.
#[derive(Debug, Clone, Copy)]
pub struct ClipListing<'a> {
    pub clip: &'a Clip,
    pub source: Option<&'a Source>,
    pub track: Option<&'a Track>,
}

impl ClipListing<'_> {
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.source
            .map_or(UNKNOWN_REFERENCE, |source| source.name.as_str())
    }

    #[must_use]
    pub fn track_name(&self) -> &str {
        self.track.map_or(UNKNOWN_REFERENCE, |track| track.name.as_str())
    }

    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.source.is_none() || self.track.is_none()
    }
}

/// The timeline graph and the only surface through which it is edited.
///
/// Every mutation either succeeds completely or returns an [`EditError`] with
/// the graph untouched. Removing a source or track never removes the clips that
/// point at it; those clips stay listable as orphans.
#[derive(Debug, Clone)]
pub struct Project {
    meta: ProjectMeta,
    aspect_ratio: AspectRatio,
    state: ProjectState,
    ids: IdAllocator,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT_NAME)
    }
}

impl Project {
    /// Fresh project seeded with one video and one audio track.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id_allocator(name, IdAllocator::random())
    }

    #[must_use]
    pub fn with_id_allocator(name: impl Into<String>, ids: IdAllocator) -> Self {
        let mut project = Self {
            meta: ProjectMeta::new(name),
            aspect_ratio: AspectRatio::default(),
            state: ProjectState::default(),
            ids,
        };
        project.add_track(AddTrackRequest::new("Video 1", TrackKind::Video));
        project.add_track(AddTrackRequest::new("Audio 1", TrackKind::Audio));
        project
    }

    /// Rebuilds a project from its on-disk document.
    pub fn from_file(file: ProjectFile) -> Result<Self, LoadError> {
        if file.version > PROJECT_FILE_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: file.version,
                supported: PROJECT_FILE_VERSION,
            });
        }

        let state = file.state;
        let duplicate = state
            .sources
            .duplicate_id()
            .map(|id| ("source", id))
            .or_else(|| state.tracks.duplicate_id().map(|id| ("track", id)))
            .or_else(|| state.clips.duplicate_id().map(|id| ("clip", id)));
        if let Some((kind, id)) = duplicate {
            return Err(LoadError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }

        for clip in &state.clips {
            validate_loaded_clip(clip)?;
        }

        Ok(Self {
            meta: file.meta,
            aspect_ratio: file.aspect_ratio,
            state,
            ids: IdAllocator::random(),
        })
    }

    #[must_use]
    pub fn to_file(&self) -> ProjectFile {
        ProjectFile {
            version: PROJECT_FILE_VERSION,
            meta: self.meta.clone(),
            aspect_ratio: self.aspect_ratio,
            state: self.state.clone(),
        }
    }

    /// Swaps the id allocator, e.g. for deterministic ids after a load.
    pub fn set_id_allocator(&mut self, ids: IdAllocator) {
        self.ids = ids;
    }

    #[must_use]
    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    #[instrument(skip(self), fields(project = %self.meta.name, aspect_ratio = %aspect_ratio))]
    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        if self.aspect_ratio == aspect_ratio {
            debug!("aspect ratio unchanged");
            return;
        }
        self.aspect_ratio = aspect_ratio;
        self.touch();
        info!("aspect ratio updated");
    }

    #[instrument(skip(self, name), fields(project = %self.meta.name))]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.meta.name = name.into();
        self.touch();
        info!(name = %self.meta.name, "project renamed");
    }

    #[must_use]
    pub fn get_source(&self, source_id: &str) -> Option<&Source> {
        self.state.sources.get(source_id)
    }

    #[must_use]
    pub fn get_track(&self, track_id: &str) -> Option<&Track> {
        self.state.tracks.get(track_id)
    }

    #[must_use]
    pub fn get_clip(&self, clip_id: &str) -> Option<&Clip> {
        self.state.clips.get(clip_id)
    }

    #[must_use]
    pub fn get_sources(&self) -> &[Source] {
        self.state.sources.as_slice()
    }

    /// Insertion order; see [`Project::tracks_by_layer`] for z-order.
    #[must_use]
    pub fn get_tracks(&self) -> &[Track] {
        self.state.tracks.as_slice()
    }

    #[must_use]
    pub fn get_clips(&self) -> &[Clip] {
        self.state.clips.as_slice()
    }

    #[must_use]
    pub fn get_tracks_by_type(&self, kind: TrackKind) -> Vec<&Track> {
        self.state
            .tracks
            .iter()
            .filter(|track| track.kind == kind)
            .collect()
    }

    /// Tracks from the bottom layer up, ties keeping insertion order.
    #[must_use]
    pub fn tracks_by_layer(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.state.tracks.iter().collect();
        tracks.sort_by_key(|track| track.order);
        tracks
    }

    #[must_use]
    pub fn clips_on_track(&self, track_id: &str) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self
            .state
            .clips
            .iter()
            .filter(|clip| clip.track_id == track_id)
            .collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    /// All clips in playback order, as the render plan consumes them.
    #[must_use]
    pub fn clips_by_start_time(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.state.clips.iter().collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    #[must_use]
    pub fn clip_listing(&self) -> Vec<ClipListing<'_>> {
        self.state
            .clips
            .iter()
            .map(|clip| ClipListing {
                clip,
                source: self.state.sources.get(&clip.source_id),
                track: self.state.tracks.get(&clip.track_id),
            })
            .collect()
    }

    #[must_use]
    pub fn orphaned_clips(&self) -> Vec<&Clip> {
        self.clip_listing()
            .into_iter()
            .filter(ClipListing::is_orphaned)
            .map(|listing| listing.clip)
            .collect()
    }

    #[must_use]
    pub fn get_summary(&self) -> ProjectSummary {
        ProjectSummary {
            clip_count: self.state.clips.len(),
            duration: self
                .state
                .clips
                .iter()
                .map(Clip::end_time)
                .fold(0.0, f64::max),
            aspect_ratio: self.aspect_ratio,
        }
    }

    #[instrument(skip(self, request), fields(project = %self.meta.name, source_name = %request.name, source_kind = request.kind.as_str()))]
    pub fn add_source(&mut self, request: AddSourceRequest) -> Result<Source, EditError> {
        ensure(is_positive(request.duration), "duration", || {
            format!("source duration must be positive, got {}", request.duration)
        })?;

        let id = self
            .ids
            .allocate_unused(EntityKind::Source, |id| self.state.sources.contains(id));
        let source = Source {
            id,
            name: request.name,
            kind: request.kind,
            url: request.url,
            duration: request.duration,
        };

        self.state.sources.insert(source.clone());
        self.touch();
        info!(source_id = %source.id, "source added");
        Ok(source)
    }

    #[instrument(skip(self, request), fields(project = %self.meta.name, track_name = %request.name, track_kind = request.kind.as_str()))]
    pub fn add_track(&mut self, request: AddTrackRequest) -> Track {
        let id = self
            .ids
            .allocate_unused(EntityKind::Track, |id| self.state.tracks.contains(id));
        let track = Track {
            id,
            name: request.name,
            kind: request.kind,
            order: request.order,
            is_muted: request.is_muted,
            is_locked: request.is_locked,
            is_visible: request.is_visible,
        };

        self.state.tracks.insert(track.clone());
        self.touch();
        info!(track_id = %track.id, "track added");
        track
    }

    /// Inserts a clip as given. References are trusted; callers resolve the
    /// source and track first. Only the temporal fields are checked.
    #[instrument(skip(self, request), fields(project = %self.meta.name, source_id = %request.source_id, track_id = %request.track_id))]
    pub fn add_clip(&mut self, request: AddClipRequest) -> Result<Clip, EditError> {
        ensure(is_non_negative(request.start_time), "startTime", || {
            format!("start time must not be negative, got {}", request.start_time)
        })?;
        ensure(is_positive(request.duration), "duration", || {
            format!("clip duration must be positive, got {}", request.duration)
        })?;
        ensure_end_in_range(request.start_time, request.duration)?;
        ensure(
            is_non_negative(request.source_start_offset),
            "sourceStartOffset",
            || {
                format!(
                    "source offset must not be negative, got {}",
                    request.source_start_offset
                )
            },
        )?;
        ensure(
            approx_eq(
                request.source_end_offset - request.source_start_offset,
                request.duration,
            ),
            "sourceEndOffset",
            || {
                format!(
                    "source window {}..{} does not match duration {}",
                    request.source_start_offset, request.source_end_offset, request.duration
                )
            },
        )?;

        let source = self.state.sources.get(&request.source_id);
        if let Some(source) = source {
            ensure_within_source(request.source_end_offset, source)?;
        } else {
            warn!("clip references an unknown source");
        }
        if !self.state.tracks.contains(&request.track_id) {
            warn!("clip references an unknown track");
        }

        let id = self.next_clip_id(None);
        let clip = Clip {
            id,
            source_id: request.source_id,
            track_id: request.track_id,
            start_time: clamp_noise(request.start_time),
            duration: request.duration,
            source_start_offset: clamp_noise(request.source_start_offset),
            source_end_offset: request.source_end_offset,
            effects: Vec::new(),
        };

        self.state.clips.insert(clip.clone());
        self.touch();
        info!(clip_id = %clip.id, "clip added");
        Ok(clip)
    }

    #[instrument(skip(self, request), fields(project = %self.meta.name, clip_id = %clip_id, effect = request.kind.as_str()))]
    pub fn add_effect(
        &mut self,
        clip_id: &str,
        request: AddEffectRequest,
    ) -> Result<Effect, EditError> {
        self.clip_ref(clip_id)?;
        ensure(is_non_negative(request.start_time), "startTime", || {
            format!(
                "effect start must not be negative, got {}",
                request.start_time
            )
        })?;
        ensure(is_positive(request.duration), "duration", || {
            format!("effect duration must be positive, got {}", request.duration)
        })?;
        let non_finite = request.params.iter().find_map(|(key, value)| match value {
            ParamValue::Number(number) if !number.is_finite() => Some((key, *number)),
            _ => None,
        });
        ensure(non_finite.is_none(), "params", || {
            non_finite.map_or_else(String::new, |(key, number)| {
                format!("parameter {key} must be a finite number, got {number}")
            })
        })?;

        let id = self.next_effect_id();
        let effect = Effect {
            id,
            kind: request.kind,
            start_time: clamp_noise(request.start_time),
            duration: request.duration,
            params: request.params,
        };

        let clip = self.clip_mut(clip_id)?;
        clip.effects.push(effect.clone());
        self.touch();
        info!(effect_id = %effect.id, "effect added to clip");
        Ok(effect)
    }

    /// Moves the leading edge to `new_start_time`, consuming (or restoring)
    /// leading media so the remaining frames play where they did before. The
    /// trailing edge stays put and effects stay on the same media.
    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id))]
    pub fn trim_clip_start(
        &mut self,
        clip_id: &str,
        new_start_time: f64,
    ) -> Result<Clip, EditError> {
        let clip = self.clip_ref(clip_id)?;
        ensure(is_non_negative(new_start_time), "startTime", || {
            format!("start time must not be negative, got {new_start_time}")
        })?;

        let delta = new_start_time - clip.start_time;
        let duration = clip.duration - delta;
        let source_start_offset = clip.source_start_offset + delta;
        ensure(is_positive(duration), "startTime", || {
            format!(
                "trimming to {new_start_time} leaves no media before clip end {}",
                clip.end_time()
            )
        })?;
        ensure(is_non_negative(source_start_offset), "startTime", || {
            format!(
                "source has only {} s of media before the clip start",
                clip.source_start_offset
            )
        })?;

        let clip = self.clip_mut(clip_id)?;
        clip.start_time = clamp_noise(new_start_time);
        clip.duration = duration;
        clip.source_start_offset = clamp_noise(source_start_offset);
        shift_effects(&mut clip.effects, delta);
        fit_effects(&mut clip.effects, duration);
        let clip = clip.clone();
        self.touch();
        info!(start_time = clip.start_time, duration = clip.duration, "clip start trimmed");
        Ok(clip)
    }

    /// Sets the clip length, moving only the trailing edge.
    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id))]
    pub fn trim_clip_end(&mut self, clip_id: &str, new_duration: f64) -> Result<Clip, EditError> {
        let clip = self.clip_ref(clip_id)?;
        ensure(is_positive(new_duration), "duration", || {
            format!("clip duration must be positive, got {new_duration}")
        })?;

        let source_end_offset = clip.source_start_offset + new_duration;
        if let Some(source) = self.state.sources.get(&clip.source_id) {
            ensure_within_source(source_end_offset, source)?;
        }

        let clip = self.clip_mut(clip_id)?;
        clip.duration = new_duration;
        clip.source_end_offset = source_end_offset;
        fit_effects(&mut clip.effects, new_duration);
        let clip = clip.clone();
        self.touch();
        info!(duration = clip.duration, "clip end trimmed");
        Ok(clip)
    }

    /// Replaces the clip by two clips meeting at `split_time` (relative to the
    /// clip start). Both halves get fresh ids. Effects stay with the first
    /// half, cut to its length; the second half starts without effects.
    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id))]
    pub fn split_clip(
        &mut self,
        clip_id: &str,
        split_time: f64,
    ) -> Result<(Clip, Clip), EditError> {
        let original = self.clip_ref(clip_id)?.clone();
        ensure(
            is_positive(split_time) && is_positive(original.duration - split_time),
            "splitTime",
            || {
                format!(
                    "split time {split_time} must lie strictly inside 0..{}",
                    original.duration
                )
            },
        )?;

        let first_id = self.next_clip_id(None);
        let second_id = self.next_clip_id(Some(&first_id));

        let mut first_effects = original.effects.clone();
        fit_effects(&mut first_effects, split_time);
        let first = Clip {
            id: first_id,
            duration: split_time,
            source_end_offset: original.source_start_offset + split_time,
            effects: first_effects,
            ..original.clone()
        };
        let second = Clip {
            id: second_id,
            start_time: original.start_time + split_time,
            duration: original.duration - split_time,
            source_start_offset: original.source_start_offset + split_time,
            effects: Vec::new(),
            ..original
        };

        self.state
            .clips
            .replace_with(clip_id, [first.clone(), second.clone()]);
        self.touch();
        info!(first_id = %first.id, second_id = %second.id, "clip split");
        Ok((first, second))
    }

    /// Relocates a clip without touching its length or source window.
    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id, track_id = %new_track_id))]
    pub fn move_clip(
        &mut self,
        clip_id: &str,
        new_track_id: &str,
        new_start_time: f64,
    ) -> Result<Clip, EditError> {
        let clip = self.clip_ref(clip_id)?;
        let track = self.track_ref(new_track_id)?;
        ensure(is_non_negative(new_start_time), "startTime", || {
            format!("start time must not be negative, got {new_start_time}")
        })?;
        ensure_end_in_range(new_start_time, clip.duration)?;
        if let Some(source) = self.state.sources.get(&clip.source_id)
            && !track.kind.accepts(source.kind)
        {
            warn!(
                source_kind = source.kind.as_str(),
                track_kind = track.kind.as_str(),
                "clip moved onto a track of another media kind"
            );
        }

        let clip = self.clip_mut(clip_id)?;
        clip.track_id = new_track_id.to_string();
        clip.start_time = clamp_noise(new_start_time);
        let clip = clip.clone();
        self.touch();
        info!(start_time = clip.start_time, "clip moved");
        Ok(clip)
    }

    /// Copies a clip onto the same track, by default right after the original.
    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id))]
    pub fn duplicate_clip(
        &mut self,
        clip_id: &str,
        start_time: Option<f64>,
    ) -> Result<Clip, EditError> {
        let original = self.clip_ref(clip_id)?.clone();
        let start_time = start_time.unwrap_or_else(|| original.end_time());
        ensure(is_non_negative(start_time), "startTime", || {
            format!("start time must not be negative, got {start_time}")
        })?;
        ensure_end_in_range(start_time, original.duration)?;

        let id = self.next_clip_id(None);
        let mut effects = original.effects.clone();
        for effect in &mut effects {
            effect.id = self.next_effect_id();
        }
        let duplicate = Clip {
            id,
            start_time: clamp_noise(start_time),
            effects,
            ..original
        };

        self.state.clips.insert(duplicate.clone());
        self.touch();
        info!(duplicate_id = %duplicate.id, start_time = duplicate.start_time, "clip duplicated");
        Ok(duplicate)
    }

    #[instrument(skip(self), fields(project = %self.meta.name, clip_id = %clip_id))]
    pub fn remove_clip(&mut self, clip_id: &str) -> bool {
        if self.state.clips.remove(clip_id).is_none() {
            debug!("clip already absent");
            return false;
        }
        self.touch();
        info!("clip removed");
        true
    }

    /// Removes only the track; clips on it become orphans.
    #[instrument(skip(self), fields(project = %self.meta.name, track_id = %track_id))]
    pub fn remove_track(&mut self, track_id: &str) -> bool {
        if self.state.tracks.remove(track_id).is_none() {
            debug!("track already absent");
            return false;
        }
        self.touch();
        let orphans = self
            .state
            .clips
            .iter()
            .filter(|clip| clip.track_id == track_id)
            .count();
        info!(orphaned_clips = orphans, "track removed");
        true
    }

    /// Removes only the source; clips playing it become orphans.
    #[instrument(skip(self), fields(project = %self.meta.name, source_id = %source_id))]
    pub fn remove_source(&mut self, source_id: &str) -> bool {
        if self.state.sources.remove(source_id).is_none() {
            debug!("source already absent");
            return false;
        }
        self.touch();
        let orphans = self
            .state
            .clips
            .iter()
            .filter(|clip| clip.source_id == source_id)
            .count();
        info!(orphaned_clips = orphans, "source removed");
        true
    }

    fn touch(&mut self) {
        self.meta.updated_at = Utc::now();
    }

    fn clip_ref(&self, clip_id: &str) -> Result<&Clip, EditError> {
        self.state
            .clips
            .get(clip_id)
            .ok_or_else(|| not_found(EditError::ClipNotFound(clip_id.to_string())))
    }

    fn clip_mut(&mut self, clip_id: &str) -> Result<&mut Clip, EditError> {
        self.state
            .clips
            .get_mut(clip_id)
            .ok_or_else(|| not_found(EditError::ClipNotFound(clip_id.to_string())))
    }

    fn track_ref(&self, track_id: &str) -> Result<&Track, EditError> {
        self.state
            .tracks
            .get(track_id)
            .ok_or_else(|| not_found(EditError::TrackNotFound(track_id.to_string())))
    }

    fn next_clip_id(&mut self, reserved: Option<&str>) -> String {
        let clips = &self.state.clips;
        self.ids.allocate_unused(EntityKind::Clip, |id| {
            clips.contains(id) || reserved == Some(id)
        })
    }

    fn next_effect_id(&mut self) -> String {
        let clips = &self.state.clips;
        self.ids.allocate_unused(EntityKind::Effect, |id| {
            clips
                .iter()
                .any(|clip| clip.effects.iter().any(|effect| effect.id == id))
        })
    }
}

/// Keeps effects inside `0..duration`: drops those starting at or past the
/// end and shortens those running over it.
fn fit_effects(effects: &mut Vec<Effect>, duration: f64) {
    effects.retain(|effect| is_positive(duration - effect.start_time));
    for effect in effects {
        if effect.end_time() > duration {
            effect.duration = duration - effect.start_time;
        }
    }
}

/// Re-anchors effects after the leading edge moved by `delta` so they stay on
/// the same media. Effects that end before the new edge are dropped; those
/// straddling it are cut at 0.
fn shift_effects(effects: &mut Vec<Effect>, delta: f64) {
    effects.retain(|effect| is_positive(effect.end_time() - delta));
    for effect in effects {
        let start_time = effect.start_time - delta;
        if start_time < 0.0 {
            effect.duration += start_time;
            effect.start_time = 0.0;
        } else {
            effect.start_time = clamp_noise(start_time);
        }
    }
}

/// Temporal checks a loaded clip must pass; the facade never produces a clip
/// that fails them.
fn validate_loaded_clip(clip: &Clip) -> Result<(), LoadError> {
    let reason = if !is_non_negative(clip.start_time) {
        Some(format!("start time {} is negative or not finite", clip.start_time))
    } else if !is_positive(clip.duration) || !clip.end_time().is_finite() {
        Some(format!("duration {} is not positive", clip.duration))
    } else if !is_non_negative(clip.source_start_offset) {
        Some(format!(
            "source offset {} is negative or not finite",
            clip.source_start_offset
        ))
    } else if !approx_eq(clip.source_span(), clip.duration) {
        Some(format!(
            "source window {}..{} does not match duration {}",
            clip.source_start_offset, clip.source_end_offset, clip.duration
        ))
    } else {
        clip.effects
            .iter()
            .find(|effect| {
                !is_non_negative(effect.start_time)
                    || !is_positive(effect.duration)
                    || !effect.end_time().is_finite()
            })
            .map(|effect| format!("effect {} has an invalid range", effect.id))
    };

    match reason {
        Some(reason) => Err(LoadError::InvalidClip {
            id: clip.id.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

fn ensure_end_in_range(start_time: f64, duration: f64) -> Result<(), EditError> {
    ensure((start_time + duration).is_finite(), "startTime", || {
        format!("clip end {start_time} + {duration} is out of range")
    })
}

fn ensure_within_source(source_end_offset: f64, source: &Source) -> Result<(), EditError> {
    ensure(
        source_end_offset <= source.duration + TIME_EPSILON,
        "sourceEndOffset",
        || {
            format!(
                "source window ends at {source_end_offset} but {} is only {} s long",
                source.name, source.duration
            )
        },
    )
}

fn ensure(
    condition: bool,
    field: &'static str,
    reason: impl FnOnce() -> String,
) -> Result<(), EditError> {
    if condition {
        return Ok(());
    }
    let error = EditError::InvalidRange {
        field,
        reason: reason(),
    };
    warn!(%error, "edit rejected");
    Err(error)
}

fn not_found(error: EditError) -> EditError {
    warn!(%error, "edit rejected");
    error
}
