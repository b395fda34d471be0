use proptest::prelude::*;
use serde_json::{Value, json};
use vibeframe_core::{
    LoadError, fixtures::demo_project,
    persistence::{from_json_str, load_project},
    time::{approx_eq, is_non_negative, is_positive},
};

const CLIP_TIME_FIELDS: [&str; 4] = ["startTime", "duration", "sourceStartOffset", "sourceEndOffset"];

fn demo_document() -> Value {
    serde_json::to_value(demo_project().to_file()).expect("fixture should serialize")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn random_project_bytes_do_not_panic(raw in prop::collection::vec(any::<u8>(), 0..4096)) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_random.vibe.json");
        std::fs::write(&path, raw).expect("writing random payload should work");

        let loaded = std::panic::catch_unwind(|| load_project(&path).is_ok());
        prop_assert!(loaded.is_ok());
    }

    #[test]
    fn edited_clip_windows_load_only_when_consistent(
        clip_index in 0usize..2,
        field in prop::sample::select(CLIP_TIME_FIELDS.to_vec()),
        value in -20.0f64..20.0,
    ) {
        let mut document = demo_document();
        let clip = &mut document["state"]["clips"][clip_index];
        let clip_id = clip["id"].as_str().map(str::to_string).expect("clip id");
        clip[field] = json!(value);

        match from_json_str(&document.to_string()) {
            Ok(project) => {
                for clip in project.get_clips() {
                    prop_assert!(is_non_negative(clip.start_time));
                    prop_assert!(is_non_negative(clip.source_start_offset));
                    prop_assert!(is_positive(clip.duration));
                    prop_assert!(approx_eq(
                        clip.source_end_offset - clip.source_start_offset,
                        clip.duration
                    ));
                }
            }
            Err(LoadError::InvalidClip { id, .. }) => prop_assert_eq!(id, clip_id),
            Err(other) => prop_assert!(false, "unexpected load error: {other}"),
        }
    }

    #[test]
    fn effects_with_empty_or_negative_ranges_are_rejected(
        duration in -5.0f64..=0.0,
        start_time in -5.0f64..-0.01,
        break_start in any::<bool>(),
    ) {
        let mut document = demo_document();
        let effect = &mut document["state"]["clips"][0]["effects"][0];
        if break_start {
            effect["startTime"] = json!(start_time);
        } else {
            effect["duration"] = json!(duration);
        }

        let result = from_json_str(&document.to_string());
        let is_invalid_clip = matches!(result, Err(LoadError::InvalidClip { .. }));
        prop_assert!(is_invalid_clip);
    }
}
