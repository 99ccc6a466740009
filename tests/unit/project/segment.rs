use super::*;

fn seg_with(tags: &[Option<FrameTag>]) -> Segment {
    let mut s = Segment::new("s", "S");
    s.frames = tags
        .iter()
        .enumerate()
        .map(|(i, t)| Frame {
            url: ImageRef::new(format!("f{i}.png")),
            tag: *t,
        })
        .collect();
    s
}

#[test]
fn tag_roles_map_explicitly() {
    assert_eq!(FrameTag::Idle.role(), Some(ActionRole::Idle));
    assert_eq!(FrameTag::Talking.role(), Some(ActionRole::Talking));
    assert_eq!(FrameTag::Special.role(), None);
}

#[test]
fn tags_parse_and_serialize_lowercase() {
    assert_eq!("Special".parse::<FrameTag>().unwrap(), FrameTag::Special);
    assert!("blink".parse::<FrameTag>().is_err());
    let json = serde_json::to_string(&Frame::tagged("a.png", FrameTag::Talking)).unwrap();
    assert_eq!(json, r#"{"url":"a.png","tag":"talking"}"#);
    let untagged = serde_json::to_string(&Frame::new("b.png")).unwrap();
    assert_eq!(untagged, r#"{"url":"b.png"}"#);
}

#[test]
fn clone_untagged_copies_urls_in_order_and_clears_tags() {
    let mut src = seg_with(&[Some(FrameTag::Idle), None, Some(FrameTag::Special)]);
    src.source_video = Some(PathBuf::from("clip.mp4"));
    src.action_intent = "blink".to_string();

    let copy = src.clone_untagged("c", "Copy");
    assert_eq!(copy.id, "c");
    assert_eq!(copy.source_video, src.source_video);
    assert!(copy.action_intent.is_empty());
    assert_eq!(copy.frames.len(), 3);
    for (a, b) in copy.frames.iter().zip(&src.frames) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.tag, None);
    }
}

#[test]
fn tagged_urls_keep_frame_order() {
    let s = seg_with(&[None, Some(FrameTag::Talking), None, Some(FrameTag::Idle)]);
    let urls: Vec<_> = s.tagged_urls().iter().map(|u| u.to_string()).collect();
    assert_eq!(urls, vec!["f1.png", "f3.png"]);
    assert_eq!(s.urls_with_tag(FrameTag::Idle).len(), 1);
    assert!(s.has_tagged_frames());
}

#[test]
fn dominant_role_ignores_special_frames() {
    assert_eq!(seg_with(&[Some(FrameTag::Special)]).dominant_role(), None);
    assert_eq!(
        seg_with(&[Some(FrameTag::Idle), Some(FrameTag::Idle), Some(FrameTag::Talking)])
            .dominant_role(),
        Some(ActionRole::Idle)
    );
    assert_eq!(
        seg_with(&[Some(FrameTag::Idle), Some(FrameTag::Talking)]).dominant_role(),
        Some(ActionRole::Talking)
    );
}
