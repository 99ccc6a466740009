use super::*;

#[test]
fn fps_rejects_zero_and_reports_frame_duration() {
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(0, 1).is_err());

    let fps = Fps::new(30000, 1001).unwrap();
    assert!((fps.frame_duration_secs() - 1001.0 / 30000.0).abs() < 1e-12);
    assert!((fps.frames_to_secs(30) - 1.001).abs() < 1e-9);
}

#[test]
fn rgb_hex_parsing_accepts_optional_hash() {
    assert_eq!(Rgb8::from_hex("#ffffff").unwrap(), Rgb8::WHITE);
    assert_eq!(Rgb8::from_hex("00ff10").unwrap(), Rgb8::new(0, 255, 16));
    assert!(Rgb8::from_hex("fff").is_err());
    assert!(Rgb8::from_hex("gg0000").is_err());
    assert!(Rgb8::from_hex("+f+f+f").is_err());
    assert!(Rgb8::from_hex("#+fffff").is_err());
}

#[test]
fn image_ref_kinds_and_display() {
    let inline = ImageRef::new("data:image/png;base64,AAAA");
    assert!(inline.is_data_url());
    assert!(!inline.is_remote());
    assert_eq!(inline.to_string(), "data:image/png;base64,<26 bytes>");

    let remote = ImageRef::from("https://example.com/a.png");
    assert!(remote.is_remote());
    assert_eq!(remote.to_string(), "https://example.com/a.png");
}

#[test]
fn image_ref_serializes_as_plain_string() {
    let r = ImageRef::new("frames/0001.png");
    assert_eq!(serde_json::to_string(&r).unwrap(), "\"frames/0001.png\"");
    let back: ImageRef = serde_json::from_str("\"frames/0001.png\"").unwrap();
    assert_eq!(back, r);
}
