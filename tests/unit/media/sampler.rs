use super::*;

/// Surface whose captured frame encodes the seek time in its red channel.
struct FakeVideo {
    duration: f64,
    pos: f64,
    seeks: Vec<f64>,
    fail_capture_at: Option<usize>,
}

impl FakeVideo {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            pos: 0.0,
            seeks: Vec::new(),
            fail_capture_at: None,
        }
    }
}

impl VideoSurface for FakeVideo {
    fn duration_sec(&self) -> f64 {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (2, 2)
    }

    fn seek(&mut self, time_sec: f64) -> StudioResult<()> {
        self.pos = time_sec;
        self.seeks.push(time_sec);
        Ok(())
    }

    fn capture(&mut self) -> StudioResult<RgbaImage> {
        if self.fail_capture_at == Some(self.seeks.len() - 1) {
            return Err(StudioError::decode("boom"));
        }
        let r = (self.pos * 10.0) as u8;
        Ok(RgbaImage::from_pixel(2, 2, image::Rgba([r, 0, 0, 255])))
    }
}

#[test]
fn extracts_evenly_spaced_frames_in_order() {
    let mut v = FakeVideo::new(10.0);
    let mut progress = Vec::new();
    let frames = extract_frames(&mut v, 4, |p| progress.push(p)).unwrap();

    assert_eq!(frames.len(), 4);
    assert_eq!(v.seeks, vec![0.0, 2.5, 5.0, 7.5]);
    assert_eq!(frames[1].get_pixel(0, 0)[0], 25);
    assert_eq!(progress, vec![25, 50, 75, 100]);
}

#[test]
fn progress_rounds_to_nearest_percent() {
    assert_eq!(progress_percent(0, 3), 33);
    assert_eq!(progress_percent(1, 3), 67);
    assert_eq!(progress_percent(2, 3), 100);
}

#[test]
fn seek_times_increase_monotonically() {
    let times = sample_times(3.0, 60).unwrap();
    assert_eq!(times.len(), 60);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    assert!((times[1] - 0.05).abs() < 1e-12);
}

#[test]
fn unusable_duration_is_a_decode_error() {
    for d in [0.0, f64::NAN, f64::INFINITY, -1.0] {
        let mut v = FakeVideo::new(d);
        assert!(matches!(
            extract_frames(&mut v, 3, |_| {}),
            Err(StudioError::Decode(_))
        ));
    }
}

#[test]
fn zero_frame_count_is_rejected() {
    let mut v = FakeVideo::new(1.0);
    assert!(matches!(
        extract_frames(&mut v, 0, |_| {}),
        Err(StudioError::Validation(_))
    ));
}

#[test]
fn capture_failure_aborts_with_decode_error() {
    let mut v = FakeVideo::new(1.0);
    v.fail_capture_at = Some(2);
    let mut last = 0;
    let err = extract_frames(&mut v, 5, |p| last = p).unwrap_err();
    assert!(matches!(err, StudioError::Decode(_)));
    assert_eq!(last, 40);
}
