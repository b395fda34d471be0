use chrono::{DateTime, Utc};

use crate::{
    ids::IdAllocator,
    model::{EffectKind, SourceKind, TrackKind},
    project::{AddClipRequest, AddEffectRequest, AddSourceRequest, Project},
};

/// Deterministic project: a 10 s video clip on `Video 1`, a narration clip on
/// `Audio 1`, and an unused still image source. Ids are sequential.
#[must_use]
pub fn demo_project() -> Project {
    let mut project = Project::with_id_allocator("VibeFrame Demo", IdAllocator::sequential());

    let video_track = project.get_tracks_by_type(TrackKind::Video)[0].id.clone();
    let audio_track = project.get_tracks_by_type(TrackKind::Audio)[0].id.clone();

    let intro = project
        .add_source(AddSourceRequest {
            name: "intro.mp4".to_string(),
            kind: SourceKind::Video,
            url: "media/intro.mp4".to_string(),
            duration: 10.0,
        })
        .expect("fixture video source should be valid");
    let narration = project
        .add_source(AddSourceRequest {
            name: "narration.mp3".to_string(),
            kind: SourceKind::Audio,
            url: "media/narration.mp3".to_string(),
            duration: 12.0,
        })
        .expect("fixture audio source should be valid");
    project
        .add_source(AddSourceRequest {
            name: "logo.png".to_string(),
            kind: SourceKind::Image,
            url: "media/logo.png".to_string(),
            duration: 5.0,
        })
        .expect("fixture image source should be valid");

    let intro_clip = project
        .add_clip(AddClipRequest::spanning(&intro, video_track, 0.0))
        .expect("fixture video clip should be valid");
    project
        .add_clip(AddClipRequest {
            source_id: narration.id,
            track_id: audio_track,
            start_time: 0.0,
            duration: 8.0,
            source_start_offset: 2.0,
            source_end_offset: 10.0,
        })
        .expect("fixture audio clip should be valid");
    project
        .add_effect(
            &intro_clip.id,
            AddEffectRequest::new(EffectKind::FadeIn, 0.0, 1.0).with_param("curve", "linear"),
        )
        .expect("fixture effect should be valid");

    let fixed_timestamp = DateTime::parse_from_rfc3339("2026-02-23T00:00:00Z")
        .expect("fixture timestamp should be valid")
        .with_timezone(&Utc);
    let mut file = project.to_file();
    file.meta.created_at = fixed_timestamp;
    file.meta.updated_at = fixed_timestamp;
    let mut project = Project::from_file(file).expect("fixture file should reload");
    project.set_id_allocator(IdAllocator::sequential());
    project
}
