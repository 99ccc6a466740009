use super::*;

use std::cell::RefCell;

use image::RgbaImage;

use crate::assets::decode::png_data_url;

struct Canned {
    answer: StudioResult<String>,
    seen: RefCell<Vec<ClassificationRequest>>,
}

impl Canned {
    fn ok(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl FrameClassifier for Canned {
    fn classify(&self, request: &ClassificationRequest) -> StudioResult<String> {
        self.seen.borrow_mut().push(request.clone());
        match &self.answer {
            Ok(t) => Ok(t.clone()),
            Err(_) => Err(StudioError::service("connection reset")),
        }
    }
}

fn frames(n: usize) -> Vec<ImageRef> {
    (0..n)
        .map(|i| {
            png_data_url(&RgbaImage::from_pixel(
                16,
                12,
                image::Rgba([i as u8 * 20, 0, 0, 255]),
            ))
            .unwrap()
        })
        .collect()
}

fn small_sheet() -> ContactSheetOpts {
    ContactSheetOpts {
        cell_width: 80,
        ..ContactSheetOpts::default()
    }
}

#[test]
fn blank_intent_falls_back() {
    assert_eq!(effective_intent("   "), DEFAULT_INTENT);
    assert_eq!(effective_intent(" blink "), "blink");
    assert!(build_prompt("").contains("\"movement or talking\""));
    assert!(build_prompt("wave hello").contains("TARGET ACTION: \"wave hello\""));
}

#[test]
fn schema_lists_the_tag_vocabulary() {
    let schema = response_schema();
    assert_eq!(schema["type"], "ARRAY");
    assert_eq!(
        schema["items"]["properties"]["tag"]["enum"],
        serde_json::json!(["idle", "talking", "special"])
    );
    assert_eq!(schema["items"]["required"], serde_json::json!(["index", "tag"]));
}

#[test]
fn parse_is_strict_about_tags() {
    let ok = parse_suggestions(r#"[{"index": 2, "tag": "special"}, {"index": 0, "tag": "idle"}]"#)
        .unwrap();
    assert_eq!(
        ok,
        vec![
            TagSuggestion {
                index: 2,
                tag: FrameTag::Special
            },
            TagSuggestion {
                index: 0,
                tag: FrameTag::Idle
            },
        ]
    );
    assert!(parse_suggestions("").unwrap().is_empty());
    assert!(matches!(
        parse_suggestions(r#"[{"index": 1, "tag": "blinking"}]"#),
        Err(StudioError::Classification(_))
    ));
    assert!(parse_suggestions(r#"{"index": 1}"#).is_err());
}

#[test]
fn curate_sends_sheet_and_parses_answer() {
    let classifier = Canned::ok(r#"[{"index": 1, "tag": "talking"}]"#);
    let out = curate(&frames(3), "talk", &classifier, &small_sheet());
    assert_eq!(
        out,
        vec![TagSuggestion {
            index: 1,
            tag: FrameTag::Talking
        }]
    );

    let seen = classifier.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(&seen[0].sheet_jpeg[..2], &[0xFF, 0xD8]);
    assert!(seen[0].prompt.contains("\"talk\""));
}

#[test]
fn curate_swallows_failures() {
    let broken = Canned {
        answer: Err(StudioError::service("x")),
        seen: RefCell::new(Vec::new()),
    };
    assert!(curate(&frames(2), "", &broken, &small_sheet()).is_empty());

    let garbage = Canned::ok("not json");
    assert!(curate(&frames(2), "", &garbage, &small_sheet()).is_empty());

    let never_called = Canned::ok("[]");
    assert!(curate(&[], "", &never_called, &small_sheet()).is_empty());
    assert!(never_called.seen.borrow().is_empty());

    let bad_frame = Canned::ok("[]");
    let refs = vec![ImageRef::new("data:image/png;base64,AAAA")];
    assert!(curate(&refs, "", &bad_frame, &small_sheet()).is_empty());
}

#[test]
fn apply_replaces_all_tags_and_skips_out_of_range() {
    let mut frames = vec![
        Frame::tagged("a", FrameTag::Idle),
        Frame::new("b"),
        Frame::tagged("c", FrameTag::Special),
    ];
    let applied = apply_suggestions(
        &mut frames,
        &[
            TagSuggestion {
                index: 1,
                tag: FrameTag::Talking,
            },
            TagSuggestion {
                index: 7,
                tag: FrameTag::Idle,
            },
            TagSuggestion {
                index: -1,
                tag: FrameTag::Idle,
            },
        ],
    );
    assert_eq!(applied, 1);
    assert_eq!(frames[0].tag, None);
    assert_eq!(frames[1].tag, Some(FrameTag::Talking));
    assert_eq!(frames[2].tag, None);
}

#[test]
fn preview_prefers_special_then_talking() {
    let mut frames = vec![Frame::new("a"), Frame::new("b")];
    assert_eq!(preferred_preview(&frames), FrameTag::Idle);
    frames[0].tag = Some(FrameTag::Talking);
    assert_eq!(preferred_preview(&frames), FrameTag::Talking);
    frames[1].tag = Some(FrameTag::Special);
    assert_eq!(preferred_preview(&frames), FrameTag::Special);
}
