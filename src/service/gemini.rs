//! Client for the Gemini `generateContent` endpoint.
//!
//! Three calls are used: image generation/editing, contact-sheet classification (behind
//! [`FrameClassifier`]) and speech synthesis. The endpoint is treated as an opaque service; the
//! crate only builds request bodies, extracts the first useful part of the answer, and maps the
//! expired-key failure to [`StudioError::Auth`].

use anyhow::Context;
use serde_json::{Value, json};

use crate::assets::data_url::{encode_base64, encode_data_url};
use crate::assets::decode::{encode_png, load_image};
use crate::curation::bridge::{ClassificationRequest, FrameClassifier};
use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::grid::slice_image_ref;
use crate::media::audio::{SpeechClip, decode_speech};

/// Public Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Prompt used for text-only generation when the user prompt is blank.
pub const DEFAULT_TEXT_PROMPT: &str = "A beautiful creative artwork";

/// Prompt used for image edits when the user prompt is blank.
pub const DEFAULT_EDIT_PROMPT: &str = "Improve and enhance this image based on its content.";

/// Message the service returns for revoked or unknown keys.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Image generation models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImageModel {
    /// Fast default model.
    #[default]
    #[serde(rename = "gemini-2.5-flash-image")]
    Flash,
    /// Higher quality model; supports [`ImageSize`].
    #[serde(rename = "gemini-3-pro-image-preview")]
    Pro,
}

impl ImageModel {
    /// Model id as used in the endpoint path.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }

    /// Only the pro model accepts an explicit output size.
    pub fn supports_image_size(self) -> bool {
        matches!(self, Self::Pro)
    }
}

impl std::str::FromStr for ImageModel {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gemini-2.5-flash-image" | "flash" => Ok(Self::Flash),
            "gemini-3-pro-image-preview" | "pro" => Ok(Self::Pro),
            other => Err(StudioError::validation(format!("unknown image model '{other}'"))),
        }
    }
}

/// Output aspect ratio of generated images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    /// `1:1`
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// `3:4`
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// `4:3`
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// `9:16`
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// `16:9`
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    /// Wire form, e.g. `16:9`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Square,
            Self::Portrait3x4,
            Self::Landscape4x3,
            Self::Portrait9x16,
            Self::Landscape16x9,
        ]
        .into_iter()
        .find(|a| a.as_str() == s.trim())
        .ok_or_else(|| StudioError::validation(format!("unknown aspect ratio '{s}'")))
    }
}

/// Output resolution class of the pro image model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImageSize {
    /// About 1024 px on the long edge.
    #[default]
    #[serde(rename = "1K")]
    K1,
    /// About 2048 px.
    #[serde(rename = "2K")]
    K2,
    /// About 4096 px.
    #[serde(rename = "4K")]
    K4,
}

impl ImageSize {
    /// Wire form, e.g. `2K`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::K1 => "1K",
            Self::K2 => "2K",
            Self::K4 => "4K",
        }
    }
}

impl std::str::FromStr for ImageSize {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::K1),
            "2K" => Ok(Self::K2),
            "4K" => Ok(Self::K4),
            other => Err(StudioError::validation(format!("unknown image size '{other}'"))),
        }
    }
}

/// Service endpoints and model selection.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServiceOpts {
    /// API root; model endpoints are `{base_url}/models/{model}:generateContent`.
    pub base_url: String,
    /// Model for [`GeminiClient::generate_image`].
    pub image_model: ImageModel,
    /// Aspect ratio of generated images.
    pub aspect_ratio: AspectRatio,
    /// Output size; only sent for [`ImageModel::Pro`].
    pub image_size: ImageSize,
    /// Vision model used for frame classification.
    pub classify_model: String,
    /// Speech synthesis model.
    pub tts_model: String,
    /// Prebuilt voice name.
    pub voice: String,
}

impl Default for ServiceOpts {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: ImageModel::Flash,
            aspect_ratio: AspectRatio::Square,
            image_size: ImageSize::K1,
            classify_model: "gemini-3-pro-preview".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
        }
    }
}

/// Prompt for a 3x3 mouth-animation sprite sheet of the reference character.
pub fn talking_sheet_prompt() -> &'static str {
    "Create a professional 3x3 sprite sheet for character mouth animation.
CHARACTER STABILITY (MANDATORY):
- The head, eyes, nose and shoulders must stay in exactly the same position in all 9 frames.
- Treat the head as fixed in place. No head movement is allowed.
ANIMATION:
- Only the mouth and chin move.
- Sequence: frame 1 closed, then the remaining frames step through fluid lip-sync opening and closing.
GRID RULES:
- Exactly a 3x3 grid. No margins, borders or gutters between cells.
- The background is one solid flat color, identical across all cells.
Aspect ratio: 1:1. Single image."
}

/// API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .into_iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Inline PNG payload `(mime, base64)` for a source image reference.
pub fn inline_png(source: &ImageRef) -> StudioResult<(String, String)> {
    let png = encode_png(&load_image(source)?)?;
    Ok(("image/png".to_string(), encode_base64(&png)))
}

/// Body of an image generation call; `source` is an inline `(mime, base64)` payload for edits.
pub fn image_request_body(prompt: &str, source: Option<(&str, &str)>, opts: &ServiceOpts) -> Value {
    let contents = match source {
        Some((mime, data)) => {
            let text = match prompt.trim() {
                "" => DEFAULT_EDIT_PROMPT,
                p => p,
            };
            json!([{ "parts": [
                { "inlineData": { "mimeType": mime, "data": data } },
                { "text": text },
            ]}])
        }
        None => {
            let text = match prompt.trim() {
                "" => DEFAULT_TEXT_PROMPT,
                p => p,
            };
            json!([{ "parts": [{ "text": text }] }])
        }
    };

    let mut image_config = json!({ "aspectRatio": opts.aspect_ratio.as_str() });
    if opts.image_model.supports_image_size() {
        image_config["imageSize"] = json!(opts.image_size.as_str());
    }
    json!({
        "contents": contents,
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": image_config,
        },
    })
}

/// Body of a contact-sheet classification call.
pub fn classify_request_body(request: &ClassificationRequest) -> Value {
    json!({
        "contents": [{ "parts": [
            { "inlineData": { "mimeType": "image/jpeg", "data": encode_base64(&request.sheet_jpeg) } },
            { "text": request.prompt },
        ]}],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
        },
    })
}

/// Body of a speech synthesis call.
pub fn speech_request_body(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } },
            },
        },
    })
}

/// Map a failed HTTP exchange to a studio error.
pub fn map_error_response(status: u16, body: &str) -> StudioError {
    if status == 401 || status == 403 || body.contains(ENTITY_NOT_FOUND) {
        return StudioError::auth();
    }
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect());
    StudioError::service(format!("HTTP {status}: {message}"))
}

#[derive(Debug, serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, serde::Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> StudioResult<&[Part]> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .ok_or_else(|| StudioError::service("no response from the model"))
    }

    fn first_inline(&self) -> StudioResult<&InlineData> {
        self.parts()?
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| StudioError::service("no inline data in the response"))
    }

    fn text(&self) -> StudioResult<String> {
        Ok(self
            .parts()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>())
    }
}

/// Extract the first inline image of a raw response body as a PNG data URL.
pub fn image_from_response(body: &str) -> StudioResult<ImageRef> {
    let resp = parse_response(body)?;
    let inline = resp.first_inline()?;
    let bytes = crate::assets::data_url::decode_base64(&inline.data)?;
    Ok(ImageRef::new(encode_data_url("image/png", &bytes)))
}

/// Extract the first inline audio part of a raw response body.
pub fn speech_from_response(body: &str) -> StudioResult<SpeechClip> {
    let resp = parse_response(body)?;
    let inline = resp.first_inline()?;
    tracing::debug!(mime = ?inline.mime_type, "speech payload");
    decode_speech(&crate::assets::data_url::decode_base64(&inline.data)?)
}

/// Concatenated text parts of a raw response body.
pub fn text_from_response(body: &str) -> StudioResult<String> {
    parse_response(body)?.text()
}

fn parse_response(body: &str) -> StudioResult<GenerateResponse> {
    serde_json::from_str(body)
        .map_err(|e| StudioError::service(format!("malformed service response: {e}")))
}

/// Blocking Gemini client. No timeout or retry is applied.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    opts: ServiceOpts,
}

impl GeminiClient {
    /// Client with an explicit API key; a blank key is an auth error.
    pub fn new(api_key: impl Into<String>, opts: ServiceOpts) -> StudioResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StudioError::auth());
        }
        let http = reqwest::blocking::Client::builder()
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            api_key,
            opts,
        })
    }

    /// Client keyed from the environment; a missing key is an auth error.
    pub fn from_env(opts: ServiceOpts) -> StudioResult<Self> {
        let key = api_key_from_env().ok_or_else(StudioError::auth)?;
        Self::new(key, opts)
    }

    /// Options the client was built with.
    pub fn opts(&self) -> &ServiceOpts {
        &self.opts
    }

    /// Generate an image from `prompt`, or edit `source` when given.
    #[tracing::instrument(skip(self, source), fields(model = self.opts.image_model.as_str()))]
    pub fn generate_image(&self, prompt: &str, source: Option<&ImageRef>) -> StudioResult<ImageRef> {
        let inline = source.map(inline_png).transpose()?;
        let body = image_request_body(
            prompt,
            inline.as_ref().map(|(m, d)| (m.as_str(), d.as_str())),
            &self.opts,
        );
        let text = self.post(self.opts.image_model.as_str(), &body)?;
        image_from_response(&text)
    }

    /// Generate a 3x3 mouth-animation sheet of `character` and slice it into 9 frames.
    pub fn generate_talking_frames(&self, character: &ImageRef) -> StudioResult<Vec<ImageRef>> {
        let sheet = self.generate_image(talking_sheet_prompt(), Some(character))?;
        slice_image_ref(&sheet, 3, 3)
    }

    /// Synthesize `text` with the configured voice.
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub fn synthesize_speech(&self, text: &str) -> StudioResult<SpeechClip> {
        if text.trim().is_empty() {
            return Err(StudioError::validation("nothing to say"));
        }
        let body = speech_request_body(text, &self.opts.voice);
        let resp = self.post(&self.opts.tts_model, &body)?;
        speech_from_response(&resp)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            self.opts.base_url.trim_end_matches('/')
        )
    }

    fn post(&self, model: &str, body: &Value) -> StudioResult<String> {
        let url = self.endpoint(model);
        tracing::debug!(%url, "calling generative service");
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| StudioError::service(format!("request to {model} failed: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| StudioError::service(format!("reading {model} response: {e}")))?;
        if !status.is_success() {
            return Err(map_error_response(status.as_u16(), &text));
        }
        Ok(text)
    }
}

impl FrameClassifier for GeminiClient {
    fn classify(&self, request: &ClassificationRequest) -> StudioResult<String> {
        let body = classify_request_body(request);
        let resp = self.post(&self.opts.classify_model, &body)?;
        text_from_response(&resp)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/gemini.rs"]
mod tests;
