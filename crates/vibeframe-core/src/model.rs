use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Entity, EntityStore};

pub const PROJECT_FILE_VERSION: u32 = 1;
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";
pub const DEFAULT_VIDEO_TRACK_ORDER: i32 = 1;
pub const DEFAULT_AUDIO_TRACK_ORDER: i32 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Audio,
    Image,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

/// A media file or generated asset that clips play a window of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    pub duration: f64,
}

impl Entity for Source {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// Stills are laid out on video lanes.
    #[must_use]
    pub const fn accepts(self, source: SourceKind) -> bool {
        matches!(
            (self, source),
            (Self::Video, SourceKind::Video | SourceKind::Image) | (Self::Audio, SourceKind::Audio)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub order: i32,
    pub is_muted: bool,
    pub is_locked: bool,
    pub is_visible: bool,
}

impl Entity for Track {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A placement of the `[source_start_offset, source_end_offset)` window of a
/// source on a track, starting at `start_time` on the global timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub source_id: String,
    pub track_id: String,
    pub start_time: f64,
    pub duration: f64,
    pub source_start_offset: f64,
    pub source_end_offset: f64,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Clip {
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    #[must_use]
    pub fn source_span(&self) -> f64 {
        self.source_end_offset - self.source_start_offset
    }
}

impl Entity for Clip {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    FadeIn,
    FadeOut,
    Blur,
    Brightness,
    Contrast,
    Saturation,
    Speed,
    Volume,
}

impl EffectKind {
    pub const ALL: [Self; 8] = [
        Self::FadeIn,
        Self::FadeOut,
        Self::Blur,
        Self::Brightness,
        Self::Contrast,
        Self::Saturation,
        Self::Speed,
        Self::Volume,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FadeIn => "fadeIn",
            Self::FadeOut => "fadeOut",
            Self::Blur => "blur",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Speed => "speed",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown effect type: {value}"))
    }
}

/// Scalar effect parameter. Arrays, objects and `null` do not deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ParamValue {
    /// `true`/`false`, then numbers, otherwise text.
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map_or_else(|| Self::Text(raw.to_string()), Self::Number),
        }
    }
}

/// Modifier attached to one clip; `start_time` is relative to the clip start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl Effect {
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Square => "1:1",
        }
    }

    /// Output frame size used when rendering the timeline.
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Landscape => (1920, 1080),
            Self::Portrait => (1080, 1920),
            Self::Square => (1080, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            other => Err(format!("unsupported aspect ratio: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Keys written by other tools, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectMeta {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created_at: now,
            updated_at: now,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectState {
    pub sources: EntityStore<Source>,
    pub tracks: EntityStore<Track>,
    pub clips: EntityStore<Clip>,
}

/// On-disk document, rewritten wholesale on every save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default = "default_file_version")]
    pub version: u32,
    pub meta: ProjectMeta,
    pub aspect_ratio: AspectRatio,
    pub state: ProjectState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub clip_count: usize,
    pub duration: f64,
    pub aspect_ratio: AspectRatio,
}

const fn default_file_version() -> u32 {
    PROJECT_FILE_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_uses_camel_case_field_names() {
        let clip = Clip {
            id: "clip-1".to_string(),
            source_id: "source-1".to_string(),
            track_id: "track-1".to_string(),
            start_time: 0.0,
            duration: 2.0,
            source_start_offset: 1.0,
            source_end_offset: 3.0,
            effects: Vec::new(),
        };

        let value = serde_json::to_value(&clip).expect("clip should serialize");
        assert_eq!(value["sourceId"], "source-1");
        assert_eq!(value["sourceStartOffset"], 1.0);
        assert_eq!(value["sourceEndOffset"], 3.0);
    }

    #[test]
    fn effect_params_reject_nested_values() {
        let valid = r#"{"id":"e","type":"fadeIn","startTime":0,"duration":1,"params":{"curve":"linear","gain":2,"loop":false}}"#;
        let effect: Effect = serde_json::from_str(valid).expect("scalar params should parse");
        assert_eq!(effect.kind, EffectKind::FadeIn);
        assert_eq!(effect.params["gain"], ParamValue::Number(2.0));
        assert_eq!(effect.params["loop"], ParamValue::Bool(false));

        let nested = r#"{"id":"e","type":"blur","startTime":0,"duration":1,"params":{"radius":[1,2]}}"#;
        assert!(serde_json::from_str::<Effect>(nested).is_err());
        let null = r#"{"id":"e","type":"blur","startTime":0,"duration":1,"params":{"radius":null}}"#;
        assert!(serde_json::from_str::<Effect>(null).is_err());
    }

    #[test]
    fn aspect_ratio_serializes_as_ratio_string() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).expect("ratio should serialize"),
            "\"9:16\""
        );
        assert_eq!("1:1".parse::<AspectRatio>(), Ok(AspectRatio::Square));
        assert!("4:3".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::Portrait.dimensions(), (1080, 1920));
    }

    #[test]
    fn effect_kind_parses_case_insensitively() {
        assert_eq!("fadeout".parse::<EffectKind>(), Ok(EffectKind::FadeOut));
        assert!("wobble".parse::<EffectKind>().is_err());
    }

    #[test]
    fn param_values_parse_from_cli_text() {
        assert_eq!(ParamValue::parse_lossy("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse_lossy("0.5"), ParamValue::Number(0.5));
        assert_eq!(
            ParamValue::parse_lossy("ease-in"),
            ParamValue::Text("ease-in".to_string())
        );
    }

    #[test]
    fn image_sources_belong_on_video_tracks() {
        assert!(TrackKind::Video.accepts(SourceKind::Image));
        assert!(!TrackKind::Audio.accepts(SourceKind::Video));
    }
}
