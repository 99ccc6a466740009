use super::*;

#[test]
fn parses_multi_action_pack() {
    let c = Character::from_json(
        r#"{"id":"p1","name":"Hero","actions":[
            {"name":"Blink","frames":["a.png","b.png"]},
            {"name":"Talk","frames":["c.png"]}
        ],"defaultTalkingAction":"Talk"}"#,
    )
    .unwrap();
    assert_eq!(c.id, "p1");
    assert_eq!(c.actions.len(), 2);
    assert_eq!(c.idle_action_name(), Some("Blink"));
    assert_eq!(c.talking_action_name(), Some("Talk"));
    assert_eq!(c.action("Blink").unwrap().frames.len(), 2);
}

#[test]
fn legacy_character_maps_to_two_named_actions() {
    let c = Character::from_json(r#"{"name":"Old","idle":["i.png"],"talking":["t1.png","t2.png"]}"#)
        .unwrap();
    assert_eq!(c.name, "Old");
    assert!(!c.id.is_empty());
    assert_eq!(c.actions[0].name, LEGACY_IDLE_ACTION);
    assert_eq!(c.actions[1].name, LEGACY_TALKING_ACTION);
    assert_eq!(c.actions[1].frames.len(), 2);
    assert_eq!(c.talking_action_name(), Some(LEGACY_TALKING_ACTION));
}

#[test]
fn unknown_or_empty_shapes_are_invalid_assets() {
    for text in [
        r#"{"frames":["a.png"]}"#,
        r#"{"actions":[]}"#,
        r#"[1,2,3]"#,
        "not json",
    ] {
        assert!(
            matches!(Character::from_json(text), Err(StudioError::InvalidAssetFormat(_))),
            "{text}"
        );
    }
}

#[test]
fn single_action_defaults_to_it_for_both_roles() {
    let c = Character::from_json(r#"{"actions":[{"name":"Only","frames":["x.png"]}]}"#).unwrap();
    assert_eq!(c.name, "Action Pack");
    assert_eq!(c.idle_action_name(), Some("Only"));
    assert_eq!(c.talking_action_name(), Some("Only"));
}

#[test]
fn unknown_declared_default_falls_back_to_position() {
    let c = Character::from_json(
        r#"{"actions":[{"name":"A","frames":[]},{"name":"B","frames":[]}],
            "defaultIdleAction":"Missing"}"#,
    )
    .unwrap();
    assert_eq!(c.idle_action_name(), Some("A"));
}

#[test]
fn scene_config_round_trips_bit_identically() {
    let scene = SceneConfig {
        char_position: Point::new(12.345678901234567, -0.1),
        char_scale: 0.7000000000000001,
        bg_position: Point::new(-3.0, 1e-9),
        bg_scale: 1.3,
        background_image: Some(ImageRef::new("data:image/png;base64,AAAA")),
        bg_music_data: Some("UklGRg==".to_string()),
        bg_music_name: Some("theme.mp3".to_string()),
    };
    let c = Character {
        id: "x".to_string(),
        name: "Scene".to_string(),
        timestamp: Some(1),
        actions: vec![CharacterAction {
            name: "Idle".to_string(),
            frames: vec![ImageRef::new("i.png")],
        }],
        default_idle_action: None,
        default_talking_action: None,
        scene_config: Some(scene.clone()),
    };

    let json = c.to_json_pretty().unwrap();
    assert!(json.contains("\"charPosition\""));
    assert!(json.contains("\"bgMusicName\""));

    let back = Character::from_json(&json).unwrap();
    let got = back.scene_config.unwrap();
    assert_eq!(got.char_position.x.to_bits(), scene.char_position.x.to_bits());
    assert_eq!(got.char_scale.to_bits(), scene.char_scale.to_bits());
    assert_eq!(got.bg_position.y.to_bits(), scene.bg_position.y.to_bits());
    assert_eq!(got, scene);
}
