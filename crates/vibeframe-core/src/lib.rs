pub mod config;
pub mod diagnostics;
pub mod fixtures;
pub mod ids;
pub mod model;
pub mod persistence;
pub mod project;
pub mod store;
pub mod time;

pub use config::AppConfig;
pub use diagnostics::{TelemetryGuard, init_tracing};
pub use ids::{EntityKind, IdAllocator};
pub use model::{
    AspectRatio, Clip, Effect, EffectKind, ParamValue, ProjectFile, ProjectMeta, ProjectSummary,
    Source, SourceKind, Track, TrackKind,
};
pub use persistence::{from_json_str, load_project, save_project, to_json_string};
pub use project::{
    AddClipRequest, AddEffectRequest, AddSourceRequest, AddTrackRequest, ClipListing, EditError,
    LoadError, Project,
};
