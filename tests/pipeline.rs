//! End-to-end pipeline tests.
//!
//! These drive [`GifConverter`] with an in-memory frame sampler so every
//! scenario runs without real video files or FFmpeg.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gifwrap::{
    AssemblyOptions, ConvertOptions, DisposalMethod, FrameSampler, GifConverter, GifWrapError,
    GraphicControlFlags, JpegCodec, MediaOpener, PipelineStage, ProgressCallback, ProgressInfo,
    StillCodec, TransformOptions, assemble, find_graphic_control, patch_first_disposal,
    recompress_frames,
};
use image::{DynamicImage, Rgb, RgbImage};

#[derive(Clone, Copy)]
enum SampleBehavior {
    DecodeAll,
    DropAll,
    DropEvenIndices,
}

struct StubOpener {
    duration: Duration,
    behavior: SampleBehavior,
    recorded: Arc<Mutex<Vec<Duration>>>,
    fail_open: bool,
}

impl StubOpener {
    fn new(duration: Duration) -> Self {
        Self {
            duration,
            behavior: SampleBehavior::DecodeAll,
            recorded: Arc::new(Mutex::new(Vec::new())),
            fail_open: false,
        }
    }

    fn with_behavior(mut self, behavior: SampleBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl MediaOpener for StubOpener {
    type Sampler = StubSampler;

    fn open(&self, source: &Path) -> Result<StubSampler, GifWrapError> {
        if self.fail_open {
            return Err(GifWrapError::MediaOpen {
                path: source.to_path_buf(),
                reason: "synthetic open failure".to_string(),
            });
        }
        Ok(StubSampler {
            duration: self.duration,
            behavior: self.behavior,
            recorded: Arc::clone(&self.recorded),
            next_index: 0,
        })
    }
}

struct StubSampler {
    duration: Duration,
    behavior: SampleBehavior,
    recorded: Arc<Mutex<Vec<Duration>>>,
    next_index: u64,
}

impl FrameSampler for StubSampler {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (64, 36)
    }

    async fn sample_at(&mut self, timestamp: Duration) -> Option<DynamicImage> {
        self.recorded
            .lock()
            .expect("timestamp recorder lock")
            .push(timestamp);
        let index = self.next_index;
        self.next_index += 1;
        match self.behavior {
            SampleBehavior::DropAll => None,
            SampleBehavior::DropEvenIndices if index % 2 == 0 => None,
            _ => Some(test_frame(index)),
        }
    }
}

fn test_frame(index: u64) -> DynamicImage {
    let shade = (index * 5 % 256) as u8;
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 36, Rgb([shade, 128, 255 - shade])))
}

fn write_source(directory: &Path, name: &str) -> PathBuf {
    let path = directory.join(name);
    fs::write(&path, b"stand-in for a video clip").expect("failed to write source stub");
    path
}

/// A codec that drops every frame it is given.
struct RejectingCodec;

impl StillCodec for RejectingCodec {
    fn recompress(&self, _image: &DynamicImage, _quality: f32) -> Option<DynamicImage> {
        None
    }
}

#[tokio::test]
async fn schedule_drives_sampling_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let opener = StubOpener::new(Duration::from_secs(3));
    let recorded = Arc::clone(&opener.recorded);
    let converter = GifConverter::new(opener);

    let report = converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    // 3 seconds at the default 15 fps: 45 timestamps, i/15 apart.
    let recorded = recorded.lock().expect("timestamp recorder lock");
    assert_eq!(recorded.len(), 45);
    for (index, timestamp) in recorded.iter().enumerate() {
        assert_eq!(*timestamp, Duration::from_secs_f64(index as f64 / 15.0));
    }

    assert_eq!(report.frames_requested, 45);
    assert_eq!(report.frames_sampled, 45);
    assert_eq!(report.frames_encoded, 45);
    assert_eq!(report.output_path, destination.join("clip.gif"));

    let bytes = fs::read(&report.output_path).expect("output file should exist");
    assert_eq!(&bytes[..6], b"GIF89a");
}

#[tokio::test]
async fn sampler_yielding_nothing_fails_with_decode_unavailable() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let opener = StubOpener::new(Duration::from_secs(1)).with_behavior(SampleBehavior::DropAll);
    let converter = GifConverter::new(opener);

    let error = converter
        .convert(&source, &destination)
        .await
        .expect_err("conversion should fail");
    assert!(matches!(error, GifWrapError::DecodeUnavailable));

    assert!(
        !destination.join("clip.gif").exists(),
        "no output file may be left behind on failure",
    );
    assert!(
        !source.exists(),
        "the copied-in source clip is removed even when the job fails",
    );
}

#[tokio::test]
async fn disposal_is_patched_into_the_first_frame_only() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    // 1 second at 2 fps: exactly two frames.
    let opener = StubOpener::new(Duration::from_secs(1));
    let converter = GifConverter::new(opener)
        .with_options(ConvertOptions::new().with_frame_rate(2.0));

    let report = converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");
    let actual = fs::read(&report.output_path).expect("output file should exist");

    // Rebuild the unpatched stream from the same frames the stub sampler
    // produced; the pipeline output must be that stream with exactly the
    // first packed-fields byte rewritten.
    let raw_frames = vec![test_frame(0), test_frame(1)];
    let encoded = recompress_frames(&raw_frames, &JpegCodec, &TransformOptions::default());
    let assembly = AssemblyOptions::new().with_loop_count(0).with_frame_delay_cs(50);
    let unpatched = assemble(&encoded, &assembly).expect("reference assembly should succeed");

    let expected = patch_first_disposal(&unpatched, DisposalMethod::BACKGROUND);
    assert_eq!(actual, expected, "pipeline output should be the patched assembly");

    let first = find_graphic_control(&actual, 0).expect("first GCE");
    assert_eq!(
        GraphicControlFlags::new(actual[first + 3]).disposal_method(),
        2,
        "first frame must carry the requested disposal",
    );

    let changed: Vec<usize> = unpatched
        .iter()
        .zip(actual.iter())
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(
        changed,
        vec![first + 3],
        "every byte after the first packed-fields byte is untouched",
    );
}

#[tokio::test]
async fn sub_frame_schedule_fails_before_any_sampling() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let opener = StubOpener::new(Duration::from_secs_f64(0.05));
    let recorded = Arc::clone(&opener.recorded);
    let converter = GifConverter::new(opener);

    let error = converter
        .convert(&source, &destination)
        .await
        .expect_err("conversion should fail");
    assert!(matches!(error, GifWrapError::InvalidFrameCount { .. }));
    assert!(
        recorded.lock().expect("timestamp recorder lock").is_empty(),
        "the sampler must never be invoked for an empty schedule",
    );
}

#[tokio::test]
async fn nested_destination_directories_are_created() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("deeply").join("nested").join("gifs");

    let converter = GifConverter::new(StubOpener::new(Duration::from_secs(1)));
    let report = converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    assert!(report.output_path.starts_with(&destination));
    assert!(report.output_path.exists());
}

#[tokio::test]
async fn remove_source_can_be_disabled() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let converter = GifConverter::new(StubOpener::new(Duration::from_secs(1)))
        .with_options(ConvertOptions::new().with_remove_source(false));
    converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    assert!(source.exists(), "the source clip must be kept when asked to");
}

#[tokio::test]
async fn source_is_removed_on_success_by_default() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let converter = GifConverter::new(StubOpener::new(Duration::from_secs(1)));
    converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    assert!(!source.exists());
}

#[tokio::test]
async fn staged_intermediate_gif_does_not_survive() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let converter = GifConverter::new(StubOpener::new(Duration::from_secs(1)));
    converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    assert!(destination.join("clip.gif").exists());
    assert!(
        !destination.join("clip.gif.part").exists(),
        "the unpatched staging file is removed once the job ends",
    );
}

#[tokio::test]
async fn open_failure_surfaces_and_still_cleans_up() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let converter =
        GifConverter::new(StubOpener::new(Duration::from_secs(1)).failing_open());
    let error = converter
        .convert(&source, &destination)
        .await
        .expect_err("conversion should fail");

    assert!(matches!(error, GifWrapError::MediaOpen { .. }));
    assert!(!source.exists(), "cleanup still runs when open fails");
}

#[tokio::test]
async fn dropped_frames_are_tolerated_and_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    // 2 seconds at 10 fps: 20 samples, even indices fail to decode.
    let opener =
        StubOpener::new(Duration::from_secs(2)).with_behavior(SampleBehavior::DropEvenIndices);
    let converter = GifConverter::new(opener)
        .with_options(ConvertOptions::new().with_frame_rate(10.0));

    let report = converter
        .convert(&source, &destination)
        .await
        .expect("conversion should tolerate dropped frames");

    assert_eq!(report.frames_requested, 20);
    assert_eq!(report.frames_sampled, 10);
    assert_eq!(report.frames_encoded, 10);
}

#[tokio::test]
async fn codec_dropping_every_frame_is_an_encode_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let converter =
        GifConverter::new(StubOpener::new(Duration::from_secs(1))).with_codec(RejectingCodec);
    let error = converter
        .convert(&source, &destination)
        .await
        .expect_err("conversion should fail");

    assert!(matches!(error, GifWrapError::GifEncodeFailed(_)));
    let message = error.to_string();
    assert!(
        message.contains("recompression"),
        "error should blame recompression: {message}",
    );
}

struct RecordingProgress {
    events: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.events.lock().expect("events lock").push(info.clone());
    }
}

#[tokio::test]
async fn progress_reports_stages_in_pipeline_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = write_source(temp.path(), "clip.mov");
    let destination = temp.path().join("gifs");

    let progress = Arc::new(RecordingProgress {
        events: Mutex::new(Vec::new()),
    });
    let converter = GifConverter::new(StubOpener::new(Duration::from_secs(1))).with_options(
        ConvertOptions::new()
            .with_frame_rate(5.0)
            .with_progress(progress.clone()),
    );

    converter
        .convert(&source, &destination)
        .await
        .expect("conversion should succeed");

    let events = progress.events.lock().expect("events lock");
    let sampling_updates: Vec<u64> = events
        .iter()
        .filter(|info| info.stage == PipelineStage::Sampling)
        .map(|info| info.current)
        .collect();
    assert_eq!(sampling_updates, (1..=5).collect::<Vec<u64>>());

    let stage_order: Vec<PipelineStage> = events
        .iter()
        .map(|info| info.stage)
        .filter({
            // Keep the first occurrence of each stage.
            let mut seen = Vec::new();
            move |stage| {
                if seen.contains(stage) {
                    false
                } else {
                    seen.push(*stage);
                    true
                }
            }
        })
        .collect();
    assert_eq!(
        stage_order,
        vec![
            PipelineStage::Sampling,
            PipelineStage::Transforming,
            PipelineStage::Assembling,
            PipelineStage::Patching,
            PipelineStage::Persisting,
        ],
    );
}

#[tokio::test]
async fn concurrent_jobs_share_a_destination() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source_a = write_source(temp.path(), "first.mov");
    let source_b = write_source(temp.path(), "second.mov");
    let destination = temp.path().join("gifs");

    let converter_a = GifConverter::new(StubOpener::new(Duration::from_secs(1)));
    let converter_b = GifConverter::new(StubOpener::new(Duration::from_secs(1)));

    let (first, second) = tokio::join!(
        converter_a.convert(&source_a, &destination),
        converter_b.convert(&source_b, &destination),
    );

    let first = first.expect("first conversion should succeed");
    let second = second.expect("second conversion should succeed");
    assert_eq!(first.output_path, destination.join("first.gif"));
    assert_eq!(second.output_path, destination.join("second.gif"));
    assert!(first.output_path.exists());
    assert!(second.output_path.exists());
}
