//! AI-assisted frame curation.
//!
//! All frames of a segment are tiled into one numbered contact sheet, which is sent together with
//! an instruction and a fixed response schema to a [`FrameClassifier`]. The classifier answers
//! with `(index, tag)` pairs that are mapped back onto the frames.

use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::grid::{ContactSheetOpts, compose_contact_sheet_refs};
use crate::project::segment::{Frame, FrameTag};

/// Intent used when the user leaves the target action blank.
pub const DEFAULT_INTENT: &str = "movement or talking";

/// One classification request: the encoded contact sheet plus instructions.
#[derive(Clone, Debug)]
pub struct ClassificationRequest {
    /// JPEG-encoded contact sheet.
    pub sheet_jpeg: Vec<u8>,
    /// Instruction text.
    pub prompt: String,
    /// JSON schema the answer must follow.
    pub response_schema: serde_json::Value,
}

/// External vision model that tags contact-sheet cells.
pub trait FrameClassifier {
    /// Submit `request` and return the raw JSON answer text.
    fn classify(&self, request: &ClassificationRequest) -> StudioResult<String>;
}

/// A tag proposed for the frame at `index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TagSuggestion {
    /// Frame position as printed on the contact sheet badge.
    pub index: i64,
    /// Proposed tag.
    pub tag: FrameTag,
}

/// Resolve a user intent, falling back to [`DEFAULT_INTENT`] when blank.
pub fn effective_intent(intent: &str) -> &str {
    let trimmed = intent.trim();
    if trimmed.is_empty() {
        DEFAULT_INTENT
    } else {
        trimmed
    }
}

/// Instruction sent alongside the contact sheet.
pub fn build_prompt(intent: &str) -> String {
    let intent = effective_intent(intent);
    format!(
        r#"Task: Analyze this contact sheet of video frames (each numbered by a yellow index badge) and extract animation states.

TARGET ACTION: "{intent}"

GOAL: Extract the 'special' sequence that represents the target action from start to finish.
The character should be seen leaving a neutral state, performing the action, and returning to neutral.

STRICT INSTRUCTIONS:
1. "idle": Pick 3-5 frames where the character is completely static and neutral (eyes open, mouth closed).
2. "special": Pick the CONTIGUOUS RANGE of frames that make up the target action.
   - For blinking, include the frames where the eyes are CLOSING, FULLY CLOSED and OPENING.
   - A frame that looks exactly like an idle frame is not 'special' unless it is the very first or last frame of the transition.
   - If the pupil or iris is clearly visible, the eye is NOT closed.
   - Capture the whole arc: Normal -> [Start -> Peak -> Return] -> Normal. The bracketed part is 'special'.
3. "talking": Frames with distinct mouth movement.

OUTPUT:
Return a JSON array of objects with the frame "index" and its "tag".
Example: [{{"index": 4, "tag": "special"}}, {{"index": 5, "tag": "special"}}]"#
    )
}

/// Schema of the classifier answer: an array of `{index: integer, tag: idle|talking|special}`.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "index": { "type": "INTEGER" },
                "tag": {
                    "type": "STRING",
                    "enum": FrameTag::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                },
            },
            "required": ["index", "tag"],
        },
    })
}

/// Parse the classifier answer. Blank text is an empty answer.
pub fn parse_suggestions(text: &str) -> StudioResult<Vec<TagSuggestion>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
        .map_err(|e| StudioError::classification(format!("unexpected classifier answer: {e}")))
}

/// Build the request for `frames`, classify it, and parse the answer.
pub fn try_curate<C: FrameClassifier + ?Sized>(
    frames: &[ImageRef],
    intent: &str,
    classifier: &C,
    opts: &ContactSheetOpts,
) -> StudioResult<Vec<TagSuggestion>> {
    let sheet = compose_contact_sheet_refs(frames, opts)
        .map_err(|e| StudioError::classification(format!("contact sheet: {e}")))?;
    let request = ClassificationRequest {
        sheet_jpeg: sheet.to_jpeg(opts.jpeg_quality)?,
        prompt: build_prompt(intent),
        response_schema: response_schema(),
    };
    tracing::debug!(
        bytes = request.sheet_jpeg.len(),
        rows = sheet.rows,
        "contact sheet ready"
    );
    let text = classifier.classify(&request)?;
    parse_suggestions(&text)
}

/// Ask `classifier` to tag `frames` for `intent`.
///
/// Never fails: any sheet, transport or parse error is logged and yields no suggestions.
#[tracing::instrument(skip(frames, classifier, opts), fields(count = frames.len()))]
pub fn curate<C: FrameClassifier + ?Sized>(
    frames: &[ImageRef],
    intent: &str,
    classifier: &C,
    opts: &ContactSheetOpts,
) -> Vec<TagSuggestion> {
    match try_curate(frames, intent, classifier, opts) {
        Ok(suggestions) => {
            tracing::info!(suggestions = suggestions.len(), "frames curated");
            suggestions
        }
        Err(e) => {
            tracing::warn!(error = %e, "frame curation failed");
            Vec::new()
        }
    }
}

/// Replace every tag in `frames` with `suggestions`; returns how many were applied.
///
/// Suggestions pointing outside `frames` are ignored. For duplicates, the last one wins.
pub fn apply_suggestions(frames: &mut [Frame], suggestions: &[TagSuggestion]) -> usize {
    for f in frames.iter_mut() {
        f.tag = None;
    }
    let mut applied = 0;
    for s in suggestions {
        if let Ok(i) = usize::try_from(s.index)
            && let Some(f) = frames.get_mut(i)
        {
            f.tag = Some(s.tag);
            applied += 1;
        }
    }
    applied
}

/// Tag to preview after curation: special if any frame is special, else talking, else idle.
pub fn preferred_preview(frames: &[Frame]) -> FrameTag {
    let has = |t: FrameTag| frames.iter().any(|f| f.tag == Some(t));
    if has(FrameTag::Special) {
        FrameTag::Special
    } else if has(FrameTag::Talking) {
        FrameTag::Talking
    } else {
        FrameTag::Idle
    }
}

#[cfg(test)]
#[path = "../../tests/unit/curation/bridge.rs"]
mod tests;
