use std::path::PathBuf;

use crate::assets::decode::png_data_url;
use crate::curation::bridge::{FrameClassifier, apply_suggestions, curate, preferred_preview};
use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};
use crate::imaging::grid::ContactSheetOpts;
use crate::media::sampler::extract_frames;
use crate::media::video::VideoSurface;
use crate::project::pack::{Character, CharacterAction, LegacyAction, now_millis};
use crate::project::segment::{ActionRole, Frame, FrameTag, Segment};

/// Identifier of the segment every new store starts with.
pub const DEFAULT_SEGMENT_ID: &str = "default";
/// Name of the segment every new store starts with.
pub const DEFAULT_SEGMENT_NAME: &str = "Base";
/// Name given to multi-action exports.
pub const EXPORT_PACK_NAME: &str = "Character Action Pack";

#[derive(serde::Deserialize)]
struct ImportAction {
    #[serde(default)]
    name: Option<String>,
    frames: Vec<ImageRef>,
}

#[derive(serde::Deserialize)]
struct ImportPack {
    actions: Vec<ImportAction>,
}

#[derive(serde::Deserialize)]
struct ImportSingle {
    #[serde(default)]
    name: Option<String>,
    frames: Vec<ImageRef>,
}

/// Ordered segments plus the active selection.
///
/// Holds at least one segment at all times; every mutation goes through a method so that
/// failures leave the store unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    active: String,
    next_id: u64,
}

impl Default for SegmentStore {
    fn default() -> Self {
        Self {
            segments: vec![Segment::new(DEFAULT_SEGMENT_ID, DEFAULT_SEGMENT_NAME)],
            active: DEFAULT_SEGMENT_ID.to_string(),
            next_id: 1,
        }
    }
}

impl SegmentStore {
    /// Store holding the single default segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments in display order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Id of the selected segment.
    pub fn active_id(&self) -> &str {
        &self.active
    }

    /// The selected segment.
    pub fn active(&self) -> &Segment {
        self.segments
            .iter()
            .find(|s| s.id == self.active)
            .unwrap_or(&self.segments[0])
    }

    /// Segment by id.
    pub fn get(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// `true` while the store holds only one untouched segment: no frames and no video.
    pub fn is_pristine(&self) -> bool {
        matches!(
            self.segments.as_slice(),
            [only] if only.frames.is_empty() && only.source_video.is_none()
        )
    }

    /// Append a new segment and make it active.
    ///
    /// With `clone_from_active`, and when the active segment has frames, the new segment copies
    /// its source video and frame URLs with every tag cleared; otherwise it starts empty.
    pub fn add_segment(&mut self, clone_from_active: bool) -> &Segment {
        let id = self.fresh_id("segment");
        let name = format!("Action {}", self.segments.len() + 1);
        let source = self.active();
        let seg = if clone_from_active && !source.frames.is_empty() {
            source.clone_untagged(id, name)
        } else {
            Segment::new(id, name)
        };
        tracing::debug!(id = %seg.id, frames = seg.frames.len(), "segment added");
        self.active = seg.id.clone();
        self.segments.push(seg);
        &self.segments[self.segments.len() - 1]
    }

    /// Remove a segment. The last remaining segment cannot be removed.
    ///
    /// Removing the active segment activates the first remaining one.
    pub fn remove_segment(&mut self, id: &str) -> StudioResult<Segment> {
        if self.segments.len() <= 1 {
            return Err(StudioError::validation("cannot remove the last segment"));
        }
        let idx = self.index_of(id)?;
        let removed = self.segments.remove(idx);
        if self.active == removed.id {
            self.active = self.segments[0].id.clone();
        }
        Ok(removed)
    }

    /// Select a segment.
    pub fn set_active(&mut self, id: &str) -> StudioResult<()> {
        let idx = self.index_of(id)?;
        self.active = self.segments[idx].id.clone();
        Ok(())
    }

    /// Change a segment's display name.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> StudioResult<()> {
        self.segment_mut(id)?.name = name.into();
        Ok(())
    }

    /// Change the action description used when curating a segment.
    pub fn set_intent(&mut self, id: &str, intent: impl Into<String>) -> StudioResult<()> {
        self.segment_mut(id)?.action_intent = intent.into();
        Ok(())
    }

    /// Attach or detach a segment's source video.
    pub fn set_source_video(&mut self, id: &str, path: Option<PathBuf>) -> StudioResult<()> {
        self.segment_mut(id)?.source_video = path;
        Ok(())
    }

    /// Select or deselect a frame: a tagged frame loses its tag, an untagged one becomes special.
    pub fn toggle_tag(&mut self, id: &str, index: usize) -> StudioResult<Option<FrameTag>> {
        let frame = self.frame_mut(id, index)?;
        frame.tag = match frame.tag {
            Some(_) => None,
            None => Some(FrameTag::Special),
        };
        Ok(frame.tag)
    }

    /// Set or clear the tag of one frame.
    pub fn set_tag(&mut self, id: &str, index: usize, tag: Option<FrameTag>) -> StudioResult<()> {
        self.frame_mut(id, index)?.tag = tag;
        Ok(())
    }

    /// Import a multi-action pack or a single `{frames}` action from JSON text.
    pub fn import_pack_json(&mut self, text: &str) -> StudioResult<usize> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| StudioError::invalid_asset(format!("not JSON: {e}")))?;
        self.import_pack(value)
    }

    /// Import a multi-action pack (`{actions: [{name, frames}]}`) or a single action
    /// (`{name?, frames}`).
    ///
    /// Each action becomes an imported segment with every frame tagged special. A pristine
    /// store is replaced, otherwise the segments are appended; the first imported segment
    /// becomes active. Returns the number of imported segments.
    pub fn import_pack(&mut self, value: serde_json::Value) -> StudioResult<usize> {
        let actions: Vec<(String, Vec<ImageRef>)> =
            if let Ok(pack) = serde_json::from_value::<ImportPack>(value.clone()) {
                pack.actions
                    .into_iter()
                    .enumerate()
                    .map(|(i, a)| (a.name.unwrap_or_else(|| format!("Imported {i}")), a.frames))
                    .collect()
            } else if let Ok(single) = serde_json::from_value::<ImportSingle>(value) {
                vec![(
                    single.name.unwrap_or_else(|| "Imported Action".to_string()),
                    single.frames,
                )]
            } else {
                return Err(StudioError::invalid_asset(
                    "expected an action pack or a single action with frames",
                ));
            };
        if actions.is_empty() {
            return Err(StudioError::invalid_asset("file contains no actions"));
        }

        let imported: Vec<Segment> = actions
            .into_iter()
            .map(|(name, urls)| {
                let mut seg = Segment::new(self.fresh_id("imported"), name);
                seg.frames = urls
                    .into_iter()
                    .map(|u| Frame::tagged(u, FrameTag::Special))
                    .collect();
                seg.imported = true;
                seg
            })
            .collect();

        let count = imported.len();
        self.active = imported[0].id.clone();
        if self.is_pristine() {
            self.segments = imported;
        } else {
            self.segments.extend(imported);
        }
        tracing::info!(segments = count, "imported action pack");
        Ok(count)
    }

    /// Export every segment with tagged frames as one action pack.
    ///
    /// Default idle/talking actions are the first segments whose tags are dominated by idle or
    /// talking frames.
    pub fn export_all(&self) -> StudioResult<Character> {
        let exported: Vec<&Segment> = self
            .segments
            .iter()
            .filter(|s| s.has_tagged_frames())
            .collect();
        if exported.is_empty() {
            return Err(StudioError::nothing_to_export(
                "no segment has selected frames",
            ));
        }

        let default_for = |role: ActionRole| {
            exported
                .iter()
                .find(|s| s.dominant_role() == Some(role))
                .map(|s| s.name.clone())
        };
        let now = now_millis();
        Ok(Character {
            id: now.to_string(),
            name: EXPORT_PACK_NAME.to_string(),
            timestamp: Some(now),
            default_idle_action: default_for(ActionRole::Idle),
            default_talking_action: default_for(ActionRole::Talking),
            actions: exported
                .iter()
                .map(|s| CharacterAction {
                    name: s.name.clone(),
                    frames: s.tagged_urls(),
                })
                .collect(),
            scene_config: None,
        })
    }

    /// Export the active segment's tagged frames as a single legacy action.
    pub fn export_active(&self) -> LegacyAction {
        let seg = self.active();
        LegacyAction {
            id: seg.id.clone(),
            name: seg.name.clone(),
            timestamp: now_millis(),
            frames: seg.tagged_urls(),
        }
    }

    /// Replace a segment's frames with `frame_count` stills sampled from `video`.
    ///
    /// Progress is mirrored into the segment and forwarded to `on_progress`. On failure the
    /// existing frames and progress are kept. The processing flag is cleared either way.
    pub fn extract_into<V, F>(
        &mut self,
        id: &str,
        video: &mut V,
        frame_count: u32,
        mut on_progress: F,
    ) -> StudioResult<usize>
    where
        V: VideoSurface + ?Sized,
        F: FnMut(u8),
    {
        let idx = self.index_of(id)?;
        let seg = &mut self.segments[idx];
        let prev_progress = seg.progress;
        seg.is_processing = true;
        seg.progress = 0;

        let result = extract_frames(video, frame_count, |p| {
            seg.progress = p;
            on_progress(p);
        })
        .and_then(|images| {
            images
                .iter()
                .map(|img| png_data_url(img).map(Frame::new))
                .collect::<StudioResult<Vec<_>>>()
        });

        seg.is_processing = false;
        let frames = match result {
            Ok(frames) => frames,
            Err(e) => {
                seg.progress = prev_progress;
                return Err(e);
            }
        };
        let n = frames.len();
        seg.frames = frames;
        Ok(n)
    }

    /// Curate a segment's frames with `classifier` and return the tag to preview next.
    ///
    /// Existing tags are always replaced; a failed classification leaves the segment untagged.
    pub fn curate_segment<C: FrameClassifier + ?Sized>(
        &mut self,
        id: &str,
        classifier: &C,
        opts: &ContactSheetOpts,
    ) -> StudioResult<FrameTag> {
        let idx = self.index_of(id)?;
        let seg = &mut self.segments[idx];
        if seg.frames.is_empty() {
            return Err(StudioError::validation("segment has no frames to curate"));
        }
        seg.is_curating = true;
        let urls: Vec<ImageRef> = seg.frames.iter().map(|f| f.url.clone()).collect();
        let suggestions = curate(&urls, &seg.action_intent, classifier, opts);
        apply_suggestions(&mut seg.frames, &suggestions);
        seg.is_curating = false;
        Ok(preferred_preview(&seg.frames))
    }

    /// Frames to preview for `tag`, with the fallback talking -> special -> idle when the
    /// requested tag has no frames. Returns the tag actually used.
    pub fn preview_sequence(
        &self,
        id: &str,
        tag: FrameTag,
    ) -> StudioResult<(FrameTag, Vec<ImageRef>)> {
        let seg = self
            .get(id)
            .ok_or_else(|| StudioError::validation(format!("unknown segment '{id}'")))?;
        let mut current = tag;
        loop {
            let urls = seg.urls_with_tag(current);
            if !urls.is_empty() {
                return Ok((current, urls));
            }
            current = match current {
                FrameTag::Talking if seg.count_tag(FrameTag::Special) > 0 => FrameTag::Special,
                FrameTag::Special if seg.count_tag(FrameTag::Idle) > 0 => FrameTag::Idle,
                _ => return Ok((tag, Vec::new())),
            };
        }
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        loop {
            let id = format!("{prefix}-{}", self.next_id);
            self.next_id += 1;
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn index_of(&self, id: &str) -> StudioResult<usize> {
        self.segments
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StudioError::validation(format!("unknown segment '{id}'")))
    }

    fn segment_mut(&mut self, id: &str) -> StudioResult<&mut Segment> {
        let idx = self.index_of(id)?;
        Ok(&mut self.segments[idx])
    }

    fn frame_mut(&mut self, id: &str, index: usize) -> StudioResult<&mut Frame> {
        let seg = self.segment_mut(id)?;
        let len = seg.frames.len();
        seg.frames.get_mut(index).ok_or_else(|| {
            StudioError::validation(format!("frame {index} out of range (segment has {len})"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/store.rs"]
mod tests;
