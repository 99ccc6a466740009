use std::path::PathBuf;

use crate::foundation::core::ImageRef;
use crate::foundation::error::StudioError;

/// Semantic tag attached to a frame while sampling and curating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameTag {
    /// Neutral, static pose.
    Idle,
    /// Distinct mouth movement.
    Talking,
    /// Part of the contiguous arc of the segment's target action.
    Special,
}

impl FrameTag {
    /// All tags, in vocabulary order.
    pub const ALL: [Self; 3] = [Self::Idle, Self::Talking, Self::Special];

    /// Wire name of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Talking => "talking",
            Self::Special => "special",
        }
    }

    /// Playback role this tag contributes to when a segment is exported.
    ///
    /// `Special` frames carry no playback role.
    pub fn role(self) -> Option<ActionRole> {
        match self {
            Self::Idle => Some(ActionRole::Idle),
            Self::Talking => Some(ActionRole::Talking),
            Self::Special => None,
        }
    }
}

impl std::str::FromStr for FrameTag {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StudioError::validation(format!("unknown frame tag '{s}'")))
    }
}

impl std::fmt::Display for FrameTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role an action plays at playback time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionRole {
    /// Looped while no speech plays.
    Idle,
    /// Driven by speech amplitude.
    Talking,
}

/// One extracted or imported frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    /// Image reference; never mutated after creation.
    pub url: ImageRef,
    /// Optional semantic tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<FrameTag>,
}

impl Frame {
    /// Untagged frame.
    pub fn new(url: impl Into<ImageRef>) -> Self {
        Self {
            url: url.into(),
            tag: None,
        }
    }

    /// Frame with a tag.
    pub fn tagged(url: impl Into<ImageRef>, tag: FrameTag) -> Self {
        Self {
            url: url.into(),
            tag: Some(tag),
        }
    }
}

/// A named, independently curated stretch of source material.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Store-unique identifier.
    pub id: String,
    /// Display name; becomes the exported action name.
    pub name: String,
    /// Source video, absent for imported segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_video: Option<PathBuf>,
    /// Frames in temporal order.
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Free-text description of the target action used by curation.
    #[serde(default)]
    pub action_intent: String,
    /// Set while frames are being extracted.
    #[serde(default)]
    pub is_processing: bool,
    /// Set while curation runs.
    #[serde(default)]
    pub is_curating: bool,
    /// Extraction progress, 0-100.
    #[serde(default)]
    pub progress: u8,
    /// `true` when created by a pack import.
    #[serde(default)]
    pub imported: bool,
}

impl Segment {
    /// Empty segment with no source video.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_video: None,
            frames: Vec::new(),
            action_intent: String::new(),
            is_processing: false,
            is_curating: false,
            progress: 0,
            imported: false,
        }
    }

    /// Copy of this segment's video and frame URLs under a new identity, with every tag cleared.
    pub fn clone_untagged(&self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut seg = Self::new(id, name);
        seg.source_video = self.source_video.clone();
        seg.frames = self.frames.iter().map(|f| Frame::new(f.url.clone())).collect();
        seg
    }

    /// URLs of every tagged frame, in frame order.
    pub fn tagged_urls(&self) -> Vec<ImageRef> {
        self.frames
            .iter()
            .filter(|f| f.tag.is_some())
            .map(|f| f.url.clone())
            .collect()
    }

    /// URLs of frames carrying `tag`, in frame order.
    pub fn urls_with_tag(&self, tag: FrameTag) -> Vec<ImageRef> {
        self.frames
            .iter()
            .filter(|f| f.tag == Some(tag))
            .map(|f| f.url.clone())
            .collect()
    }

    /// Number of frames carrying `tag`.
    pub fn count_tag(&self, tag: FrameTag) -> usize {
        self.frames.iter().filter(|f| f.tag == Some(tag)).count()
    }

    /// `true` if at least one frame is tagged.
    pub fn has_tagged_frames(&self) -> bool {
        self.frames.iter().any(|f| f.tag.is_some())
    }

    /// Playback role implied by the segment's tags: the role of the most common role-bearing
    /// tag, ties resolved toward talking.
    pub fn dominant_role(&self) -> Option<ActionRole> {
        let idle = self.count_tag(FrameTag::Idle);
        let talking = self.count_tag(FrameTag::Talking);
        match (idle, talking) {
            (0, 0) => None,
            (i, t) if t >= i => FrameTag::Talking.role(),
            _ => FrameTag::Idle.role(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/segment.rs"]
mod tests;
