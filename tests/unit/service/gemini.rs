use super::*;

use image::RgbaImage;

use crate::assets::decode::png_data_url;

#[test]
fn blank_prompts_fall_back() {
    let opts = ServiceOpts::default();
    let text_only = image_request_body("  ", None, &opts);
    assert_eq!(
        text_only["contents"][0]["parts"][0]["text"],
        DEFAULT_TEXT_PROMPT
    );

    let edit = image_request_body("", Some(("image/png", "QUJD")), &opts);
    let parts = &edit["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["text"], DEFAULT_EDIT_PROMPT);
}

#[test]
fn image_size_only_sent_for_pro_model() {
    let mut opts = ServiceOpts {
        aspect_ratio: AspectRatio::Landscape16x9,
        image_size: ImageSize::K2,
        ..ServiceOpts::default()
    };
    let flash = image_request_body("a cat", None, &opts);
    let cfg = &flash["generationConfig"]["imageConfig"];
    assert_eq!(cfg["aspectRatio"], "16:9");
    assert!(cfg.get("imageSize").is_none());

    opts.image_model = ImageModel::Pro;
    let pro = image_request_body("a cat", None, &opts);
    assert_eq!(pro["generationConfig"]["imageConfig"]["imageSize"], "2K");
}

#[test]
fn classify_body_carries_sheet_and_schema() {
    let req = ClassificationRequest {
        sheet_jpeg: vec![1, 2, 3],
        prompt: "tag these".to_string(),
        response_schema: json!({"type": "ARRAY"}),
    };
    let body = classify_request_body(&req);
    assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "AQID");
    assert_eq!(body["contents"][0]["parts"][1]["text"], "tag these");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
}

#[test]
fn speech_body_names_voice() {
    let body = speech_request_body("hello", "Kore");
    assert_eq!(
        body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
        "Kore"
    );
    assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
}

#[test]
fn auth_failures_are_distinguished() {
    assert!(map_error_response(401, "").is_auth());
    assert!(map_error_response(403, "{}").is_auth());
    assert!(
        map_error_response(404, r#"{"error":{"message":"Requested entity was not found."}}"#)
            .is_auth()
    );
    match map_error_response(500, r#"{"error":{"message":"overloaded"}}"#) {
        StudioError::Service(m) => assert_eq!(m, "HTTP 500: overloaded"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        StudioError::auth().to_string(),
        "authentication error: API_KEY_EXPIRED_OR_INVALID"
    );
}

#[test]
fn responses_yield_image_text_and_speech() {
    let image = r#"{"candidates":[{"content":{"parts":[
        {"text":"here you go"},
        {"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}
    ]}}]}"#;
    let url = image_from_response(image).unwrap();
    assert_eq!(url.as_str(), "data:image/png;base64,iVBORw==");
    assert_eq!(text_from_response(image).unwrap(), "here you go");

    let speech = r#"{"candidates":[{"content":{"parts":[
        {"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AEAAwA=="}}
    ]}}]}"#;
    let clip = speech_from_response(speech).unwrap();
    assert_eq!(clip.sample_rate, 24_000);
    assert_eq!(clip.samples, vec![0.5, -0.5]);

    assert!(matches!(
        image_from_response(r#"{"candidates":[]}"#),
        Err(StudioError::Service(_))
    ));
    assert!(image_from_response(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#).is_err());
    assert!(image_from_response("<html>").is_err());
}

#[test]
fn inline_source_is_reencoded_as_png() {
    let src = png_data_url(&RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]))).unwrap();
    let (mime, data) = inline_png(&src).unwrap();
    assert_eq!(mime, "image/png");
    assert!(data.starts_with("iVBORw0KGgo"));
}

#[test]
fn enums_parse_from_cli_strings() {
    assert_eq!("pro".parse::<ImageModel>().unwrap(), ImageModel::Pro);
    assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait9x16);
    assert_eq!("4k".parse::<ImageSize>().unwrap(), ImageSize::K4);
    assert!("5:4".parse::<AspectRatio>().is_err());
    assert_eq!(
        serde_json::to_string(&ImageModel::Pro).unwrap(),
        "\"gemini-3-pro-image-preview\""
    );
}

#[test]
fn client_requires_a_key() {
    assert!(
        GeminiClient::new("  ", ServiceOpts::default())
            .unwrap_err()
            .is_auth()
    );
    let client = GeminiClient::new("k", ServiceOpts::default()).unwrap();
    assert_eq!(
        client.endpoint("gemini-3-pro-preview"),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
    );
}

#[test]
fn talking_prompt_asks_for_three_by_three() {
    assert!(talking_sheet_prompt().contains("3x3"));
}
