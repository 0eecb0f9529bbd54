//! Text recognizer adapter tests.

mod common;

use std::sync::Arc;

use common::{ScriptedRecognizer, SequenceRecognizer};
use image::{DynamicImage, RgbImage};
use scenereel::{
    BoundingBox, Charset, Detection, NullRecognizer, RecognitionOptions, SceneReelError,
    SceneTextReader, TesseractRecognizer, TextRecognizer,
};

fn blank() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(32, 16))
}

// ── Filtering and joining ──────────────────────────────────────────

#[test]
fn detections_join_in_emission_order() {
    let reader = SceneTextReader::new(
        Arc::new(ScriptedRecognizer::new(&["Hello", "World"])),
        Charset::Ascii,
    );
    assert_eq!(reader.read(&blank()).unwrap(), "Hello World");
}

#[test]
fn non_ascii_detections_are_dropped() {
    let reader = SceneTextReader::new(
        Arc::new(ScriptedRecognizer::new(&["Café", "OPEN", "日本", "24/7"])),
        Charset::Ascii,
    );
    assert_eq!(reader.read(&blank()).unwrap(), "OPEN 24/7");
}

#[test]
fn any_charset_keeps_everything() {
    let reader = SceneTextReader::new(
        Arc::new(ScriptedRecognizer::new(&["Café", "OPEN"])),
        Charset::Any,
    );
    assert_eq!(reader.read(&blank()).unwrap(), "Café OPEN");
}

#[test]
fn nothing_detected_is_empty_not_error() {
    let reader = SceneTextReader::new(Arc::new(NullRecognizer), Charset::Ascii);
    assert_eq!(reader.read(&blank()).unwrap(), "");

    let reader = SceneTextReader::new(
        Arc::new(ScriptedRecognizer::new(&["ñ"])),
        Charset::Ascii,
    );
    assert_eq!(reader.read(&blank()).unwrap(), "");
}

#[test]
fn confidence_and_geometry_are_ignored() {
    let reader = SceneTextReader::new(Arc::new(NullRecognizer), Charset::Ascii);
    let detections = [
        Detection::new("low", BoundingBox::default(), 0.01),
        Detection::new(
            "far",
            BoundingBox { left: 900, top: 900, width: 1, height: 1 },
            1.0,
        ),
    ];
    assert_eq!(reader.join(&detections), "low far");
}

#[test]
fn engine_failure_propagates() {
    let reader = SceneTextReader::new(
        Arc::new(SequenceRecognizer::new(vec![None])),
        Charset::Ascii,
    );
    assert!(matches!(
        reader.read(&blank()),
        Err(SceneReelError::RecognitionError(_))
    ));
}

#[test]
fn ascii_charset_accepts_tabs_and_spaces() {
    assert!(Charset::Ascii.accepts("a b\tc"));
    assert!(!Charset::Ascii.accepts("line\nbreak"));
    assert!(!Charset::Ascii.accepts("naïve"));
}

// ── Tesseract ──────────────────────────────────────────────────────

const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t360\t-1\t
4\t1\t1\t1\t1\t0\t100\t300\t200\t20\t-1\t
5\t1\t1\t1\t1\t1\t100\t300\t80\t20\t96.5\tBREAKING
5\t1\t1\t1\t1\t2\t190\t302\t110\t18\t91.5\tNEWS
5\t1\t2\t1\t1\t1\t20\t20\t40\t12\t80\tLIVE
5\t1\t2\t1\t1\t2\t70\t20\t40\t12\t-1\t
5\t1\t3\t1\t1\t1\t5\t5\t10\t10\t55\t
";

#[test]
fn tsv_words_group_into_lines() {
    let detections = TesseractRecognizer::detections_from_tsv(TSV);
    let texts: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(texts, vec!["BREAKING NEWS", "LIVE"]);

    assert_eq!(
        detections[0].bounds,
        BoundingBox { left: 100, top: 300, width: 200, height: 20 }
    );
    assert!((detections[0].confidence - 0.94).abs() < 1e-4);
    assert!((detections[1].confidence - 0.80).abs() < 1e-4);
}

#[test]
fn tsv_without_words_has_no_detections() {
    let header = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n";
    assert!(TesseractRecognizer::detections_from_tsv(header).is_empty());
    assert!(TesseractRecognizer::detections_from_tsv("").is_empty());
}

#[test]
fn missing_engine_is_tool_not_found() {
    let options = RecognitionOptions::new().with_command("scenereel-no-such-ocr-engine");
    match TesseractRecognizer::new(options) {
        Err(SceneReelError::ToolNotFound { tool, .. }) => {
            assert_eq!(tool, "scenereel-no-such-ocr-engine");
        }
        other => panic!("Expected ToolNotFound, got: {other:?}"),
    }
}

#[test]
fn recognition_options_defaults() {
    let options = RecognitionOptions::default();
    assert_eq!(options.language, "eng");
    assert_eq!(options.page_segmentation_mode, 11);
}

#[test]
fn extreme_tsv_geometry_saturates() {
    let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
5\t1\t1\t1\t1\t1\t4294967290\t4294967290\t100\t100\t90\tEDGE
5\t1\t1\t1\t1\t2\t10\t10\t20\t20\t90\tCASE
";
    let detections = TesseractRecognizer::detections_from_tsv(tsv);
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].text, "EDGE CASE");
    assert_eq!(
        detections[0].bounds,
        BoundingBox { left: 10, top: 10, width: u32::MAX - 10, height: u32::MAX - 10 }
    );
}

/// Writes a stand-in engine that answers `--version` and then fails every
/// recognition without reading its input.
#[cfg(unix)]
fn failing_engine(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-tesseract");
    std::fs::write(
        &path,
        "#!/bin/sh\n\
         if [ \"$1\" = \"--version\" ]; then echo 'tesseract 5.3.0'; exit 0; fi\n\
         echo \"Failed loading language 'xx'\" >&2\n\
         exit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn engine_exiting_early_reports_its_error() {
    let dir = tempfile::tempdir().unwrap();
    let options = RecognitionOptions::new()
        .with_command(failing_engine(dir.path()))
        .with_language("xx");
    let engine = TesseractRecognizer::new(options).unwrap();
    assert_eq!(engine.version(), "tesseract 5.3.0");

    // Noisy enough that the PNG outgrows the pipe buffer.
    let noisy = RgbImage::from_fn(512, 512, |x, y| {
        let v = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)) as u8;
        image::Rgb([v, v.rotate_left(3), v.rotate_left(5)])
    });
    match engine.recognize(&DynamicImage::ImageRgb8(noisy)) {
        Err(SceneReelError::RecognitionError(message)) => {
            assert!(message.contains("Failed loading language"), "message: {message}");
        }
        other => panic!("Expected RecognitionError, got: {other:?}"),
    }
}
