use vibeframe_core::{
    AddClipRequest, AddEffectRequest, AddSourceRequest, AspectRatio, EditError, EffectKind,
    ParamValue, Project, SourceKind, TrackKind, fixtures::demo_project, from_json_str,
    project::UNKNOWN_REFERENCE, to_json_string,
};

fn video_source(project: &mut Project, duration: f64) -> vibeframe_core::Source {
    project
        .add_source(AddSourceRequest {
            name: "broll.mov".to_string(),
            kind: SourceKind::Video,
            url: "/tmp/broll.mov".to_string(),
            duration,
        })
        .expect("source should be added")
}

#[test]
fn new_project_is_seeded_with_video_and_audio_tracks() {
    let project = Project::new("Launch Teaser");

    assert_eq!(project.meta().name, "Launch Teaser");
    assert_eq!(project.aspect_ratio(), AspectRatio::Landscape);
    assert_eq!(project.get_tracks().len(), 2);

    let video = project.get_tracks_by_type(TrackKind::Video);
    let audio = project.get_tracks_by_type(TrackKind::Audio);
    assert_eq!(video.len(), 1);
    assert_eq!(audio.len(), 1);
    assert_eq!(video[0].order, 1);
    assert_eq!(audio[0].order, 0);
    assert!(video[0].is_visible && !video[0].is_muted && !video[0].is_locked);

    let layers: Vec<TrackKind> = project.tracks_by_layer().iter().map(|track| track.kind).collect();
    assert_eq!(layers, [TrackKind::Audio, TrackKind::Video]);

    let summary = project.get_summary();
    assert_eq!(summary.clip_count, 0);
    assert_eq!(summary.duration, 0.0);
}

#[test]
fn add_source_rejects_non_positive_durations() {
    let mut project = Project::new("Sources");
    for duration in [0.0, -4.0, f64::NAN] {
        let result = project.add_source(AddSourceRequest {
            name: "bad".to_string(),
            kind: SourceKind::Audio,
            url: "bad.wav".to_string(),
            duration,
        });
        assert!(matches!(result, Err(EditError::InvalidRange { field: "duration", .. })));
    }
    assert!(project.get_sources().is_empty());
}

#[test]
fn add_clip_validates_time_window_but_trusts_references() {
    let mut project = Project::new("Clips");
    let source = video_source(&mut project, 8.0);
    let track_id = project.get_tracks_by_type(TrackKind::Video)[0].id.clone();

    let mismatched = AddClipRequest {
        duration: 3.0,
        ..AddClipRequest::spanning(&source, track_id.clone(), 0.0)
    };
    assert!(project.add_clip(mismatched).is_err());

    let past_source_end = AddClipRequest {
        source_start_offset: 6.0,
        source_end_offset: 9.0,
        duration: 3.0,
        ..AddClipRequest::spanning(&source, track_id.clone(), 0.0)
    };
    assert!(project.add_clip(past_source_end).is_err());

    let negative_start = AddClipRequest::spanning(&source, track_id.clone(), -1.0);
    assert!(project.add_clip(negative_start).is_err());
    assert!(project.get_clips().is_empty());

    // unresolved references are the caller's concern
    let dangling = AddClipRequest {
        source_id: "source-elsewhere".to_string(),
        track_id: "track-elsewhere".to_string(),
        start_time: 2.0,
        duration: 1.0,
        source_start_offset: 0.0,
        source_end_offset: 1.0,
    };
    let clip = project.add_clip(dangling).expect("dangling references are accepted");
    assert_eq!(project.orphaned_clips().len(), 1);
    assert_eq!(project.orphaned_clips()[0].id, clip.id);
}

#[test]
fn summary_duration_is_the_timeline_extent() {
    let mut project = Project::new("Extent");
    let source = video_source(&mut project, 5.0);
    let track_id = project.get_tracks_by_type(TrackKind::Video)[0].id.clone();

    project
        .add_clip(AddClipRequest::spanning(&source, track_id.clone(), 12.0))
        .expect("late clip should be added");
    project
        .add_clip(AddClipRequest::spanning(&source, track_id.clone(), 0.0))
        .expect("early clip should be added");

    let summary = project.get_summary();
    assert_eq!(summary.clip_count, 2);
    assert_eq!(summary.duration, 17.0);

    let starts: Vec<f64> = project
        .clips_by_start_time()
        .iter()
        .map(|clip| clip.start_time)
        .collect();
    assert_eq!(starts, [0.0, 12.0]);
    assert_eq!(project.clips_on_track(&track_id).len(), 2);
}

#[test]
fn removing_twice_reports_true_then_false() {
    let mut project = demo_project();
    let clip_id = project.get_clips()[0].id.clone();
    let track_id = project.get_tracks()[0].id.clone();
    let source_id = project.get_sources()[2].id.clone();

    assert!(project.remove_clip(&clip_id));
    assert!(!project.remove_clip(&clip_id));
    assert!(project.remove_track(&track_id));
    assert!(!project.remove_track(&track_id));
    assert!(project.remove_source(&source_id));
    assert!(!project.remove_source(&source_id));
}

#[test]
fn removing_a_track_or_source_leaves_its_clips_listable() {
    let mut project = demo_project();
    let video_track = project.get_tracks_by_type(TrackKind::Video)[0].id.clone();
    let audio_clip = project
        .get_clips()
        .iter()
        .find(|clip| clip.track_id != video_track)
        .expect("fixture has an audio clip")
        .clone();
    let clip_count = project.get_clips().len();

    assert!(project.remove_track(&video_track));
    assert!(project.remove_source(&audio_clip.source_id));

    assert_eq!(project.get_clips().len(), clip_count);
    assert_eq!(project.get_summary().clip_count, clip_count);
    assert_eq!(project.orphaned_clips().len(), 2);

    let listing = project.clip_listing();
    let video_listing = listing
        .iter()
        .find(|entry| entry.clip.track_id == video_track)
        .expect("video clip still listed");
    assert_eq!(video_listing.track_name(), UNKNOWN_REFERENCE);
    assert_eq!(video_listing.source_name(), "intro.mp4");

    let audio_listing = listing
        .iter()
        .find(|entry| entry.clip.id == audio_clip.id)
        .expect("audio clip still listed");
    assert_eq!(audio_listing.source_name(), UNKNOWN_REFERENCE);
    assert_eq!(audio_listing.track_name(), "Audio 1");
}

#[test]
fn orphaned_clips_can_still_be_edited() {
    let mut project = demo_project();
    let clip = project.get_clips()[0].clone();
    assert!(project.remove_source(&clip.source_id));

    let (first, second) = project.split_clip(&clip.id, 3.0).expect("split needs no source");
    let trimmed = project
        .trim_clip_end(&second.id, 2.0)
        .expect("trim end skips the source bound when the source is gone");

    assert_eq!(first.duration, 3.0);
    assert_eq!(trimmed.duration, 2.0);
    assert_eq!(trimmed.source_end_offset, 5.0);
}

#[test]
fn add_effect_attaches_to_existing_clips_only() {
    let mut project = demo_project();
    let clip_id = project.get_clips()[1].id.clone();

    let effect = project
        .add_effect(
            &clip_id,
            AddEffectRequest::new(EffectKind::Speed, 0.5, 2.0)
                .with_param("factor", 1.5)
                .with_param("pitchCorrect", true)
                .with_param("label", "fast"),
        )
        .expect("effect should attach");

    let clip = project.get_clip(&clip_id).expect("clip exists");
    assert_eq!(clip.effects.last(), Some(&effect));
    assert_eq!(effect.params["factor"], ParamValue::Number(1.5));
    assert_eq!(effect.params["pitchCorrect"], ParamValue::Bool(true));

    assert_eq!(
        project.add_effect("clip-missing", AddEffectRequest::new(EffectKind::Blur, 0.0, 1.0)),
        Err(EditError::ClipNotFound("clip-missing".to_string()))
    );
    assert!(
        project
            .add_effect(&clip_id, AddEffectRequest::new(EffectKind::Blur, 0.0, 0.0))
            .is_err()
    );
}

#[test]
fn add_effect_rejects_non_finite_params() {
    let mut project = demo_project();
    let clip_id = project.get_clips()[1].id.clone();
    let effects_before = project.get_clip(&clip_id).map(|clip| clip.effects.clone());

    for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let error = project
            .add_effect(
                &clip_id,
                AddEffectRequest::new(EffectKind::Volume, 0.0, 1.0)
                    .with_param("curve", "linear")
                    .with_param("level", level),
            )
            .expect_err("non-finite level should be rejected");
        assert!(matches!(error, EditError::InvalidRange { field: "params", .. }));
    }
    assert_eq!(project.get_clip(&clip_id).map(|clip| clip.effects.clone()), effects_before);

    project
        .add_effect(
            &clip_id,
            AddEffectRequest::new(EffectKind::Volume, 0.0, 1.0).with_param("level", 0.25),
        )
        .expect("finite level should attach");
    let json = to_json_string(&project).expect("project should serialize");
    let restored = from_json_str(&json).expect("facade-built project should reload");
    assert_eq!(restored.to_file(), project.to_file());
}

#[test]
fn placements_whose_end_overflows_are_rejected() {
    let mut project = Project::new("Overflow");
    let track_id = project.get_tracks_by_type(TrackKind::Video)[0].id.clone();

    let overflowing = AddClipRequest {
        source_id: "source-elsewhere".to_string(),
        track_id: track_id.clone(),
        start_time: f64::MAX,
        duration: f64::MAX,
        source_start_offset: 0.0,
        source_end_offset: f64::MAX,
    };
    let error = project.add_clip(overflowing).expect_err("overflowing end should fail");
    assert!(matches!(error, EditError::InvalidRange { field: "startTime", .. }));
    assert!(project.get_clips().is_empty());

    let clip = project
        .add_clip(AddClipRequest {
            source_id: "source-elsewhere".to_string(),
            track_id: track_id.clone(),
            start_time: 0.0,
            duration: 1e300,
            source_start_offset: 0.0,
            source_end_offset: 1e300,
        })
        .expect("large finite clip is accepted");
    assert!(project.move_clip(&clip.id, &track_id, f64::MAX).is_err());
    assert!(project.duplicate_clip(&clip.id, Some(f64::MAX)).is_err());
    assert!(project.get_summary().duration.is_finite());
}

#[test]
fn aspect_ratio_and_name_updates_touch_metadata() {
    let mut project = demo_project();
    let stamped = project.meta().updated_at;

    project.set_aspect_ratio(AspectRatio::Portrait);
    project.set_name("Vertical Cut");

    assert_eq!(project.get_summary().aspect_ratio, AspectRatio::Portrait);
    assert_eq!(project.meta().name, "Vertical Cut");
    assert_ne!(project.meta().updated_at, stamped);
    assert_eq!(project.meta().created_at, stamped);
}
