//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::fs;
use std::path::Path;

use serialforge_core::{
    normalize, ArtifactExporter, ArtifactKind, ExportError, GeneratorConfig, IssuanceRequest,
    IssuanceSession, NamingConvention, PipelineError, SerialNumberGenerator, SerialPolicy,
    SymbolEncoder, SymbolImage,
};

fn decode(symbol: &SymbolImage) -> String {
    let raster = symbol.raster();
    let (w, h) = raster.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        if raster.get_pixel(x as u32, y as u32)[0] < 128 { 0 } else { 255 }
    });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    let (_, content) = grids[0].decode().unwrap();
    content
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn session_with(naming: NamingConvention) -> IssuanceSession {
    IssuanceSession::new(GeneratorConfig {
        naming,
        ..GeneratorConfig::default()
    })
}

#[test]
fn invariant_deterministic_policy_is_reproducible() {
    let gen = SerialNumberGenerator::new(SerialPolicy::Deterministic);

    let a = gen.generate("Widget", "A1", "010125").unwrap();
    let b = gen.generate("Widget", "A1", "010125").unwrap();

    // Content-derived, so fixed across runs and machines
    assert_eq!(a.as_str(), "SN-010125-6974");
    assert_eq!(a, b);
}

#[test]
fn invariant_randomized_policy_keeps_date_varies_block() {
    let gen = SerialNumberGenerator::new(SerialPolicy::Randomized);

    let serials: Vec<_> = (0..5)
        .map(|_| gen.generate("Widget", "A1", "010125").unwrap())
        .collect();

    for sn in &serials {
        assert!(sn.as_str().starts_with("SN-"));
        assert!(sn.as_str().ends_with("010125"));
        assert_eq!(sn.numeric_component().len(), 6);
    }
    // Five identical 1-in-10000 salts would be astronomically unlikely
    assert!(serials.iter().any(|sn| sn != &serials[0]));
}

#[test]
fn invariant_date_normalization() {
    assert_eq!(normalize("290224", false).unwrap(), "290224");
    assert!(normalize("999999", false).is_err());
    assert!(normalize("010125 ", false).is_err());
}

#[test]
fn invariant_symbol_round_trips() {
    let encoder = SymbolEncoder::default();

    for payload in ["SN-010125-6974", "SN-906974010125", "SN-311299-0001"] {
        let symbol = encoder.encode(payload).unwrap();
        assert_eq!(symbol.dimensions(), (150, 150));
        assert_eq!(decode(&symbol), payload);
    }
}

#[test]
fn invariant_generate_validates_before_deriving() {
    let mut session = IssuanceSession::default();

    let err = session
        .generate(&IssuanceRequest::new("", "A1", ""))
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingFields(_)));
    assert!(session.current().is_none());
}

#[test]
fn invariant_export_precondition_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = SymbolEncoder::default().encode("SN-010125-6974").unwrap();
    let exporter = ArtifactExporter::default();

    let err = exporter
        .export("", "A1", "SN-010125-6974", &symbol, dir.path())
        .unwrap_err();
    assert!(matches!(err, ExportError::Precondition));
    assert_eq!(err.to_string(), "Missing info or SN not generated!");

    let err = exporter
        .export("Widget", "A1", "", &symbol, dir.path())
        .unwrap_err();
    assert!(matches!(err, ExportError::Precondition));

    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn invariant_export_without_generation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let session = IssuanceSession::default();

    let err = session.export(Some(dir.path())).unwrap_err();
    assert!(matches!(err, PipelineError::Export(ExportError::Precondition)));
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn invariant_export_writes_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = IssuanceSession::default();
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();

    let bundle = session.export(Some(dir.path())).unwrap();
    assert_eq!(bundle.artifacts.len(), 3);

    let text = bundle.path_of(ArtifactKind::SerialText).unwrap();
    assert_eq!(text, dir.path().join("SN-Widget-A1.txt"));
    assert_eq!(fs::read_to_string(text).unwrap(), "SN-010125-6974");

    let png = image::open(dir.path().join("QR-Widget-A1.png")).unwrap().to_luma8();
    let bmp = image::open(dir.path().join("QR-Widget-A1.bmp")).unwrap().to_luma8();
    assert_eq!(png.dimensions(), (150, 150));
    assert_eq!(png.as_raw(), bmp.as_raw());
    assert_eq!(png.as_raw(), session.current().unwrap().symbol.raster().as_raw());
}

#[test]
fn invariant_serial_naming_convention() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_with(NamingConvention::Serial);
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();
    session.export(Some(dir.path())).unwrap();

    for ext in ["txt", "png", "bmp"] {
        assert!(dir.path().join(format!("Widget_SN-010125-6974.{ext}")).is_file());
    }
}

#[test]
fn invariant_export_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = IssuanceSession::default();
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();

    let first = session.export(Some(dir.path())).unwrap();
    let second = session.export(Some(dir.path())).unwrap();

    assert_eq!(file_count(dir.path()), 3);
    for (a, b) in first.artifacts.iter().zip(&second.artifacts) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.sha256, b.sha256);
    }
}

#[test]
fn invariant_export_overwrites_with_new_serial() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = IssuanceSession::default();

    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();
    session.export(Some(dir.path())).unwrap();

    session
        .generate(&IssuanceRequest::new("Widget", "A1", "020125"))
        .unwrap();
    session.export(Some(dir.path())).unwrap();

    let text = fs::read_to_string(dir.path().join("SN-Widget-A1.txt")).unwrap();
    assert_eq!(text, "SN-020125-6974");
    assert_eq!(file_count(dir.path()), 3);
}

#[test]
fn invariant_export_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("labels").join("2025").join("batch-7");
    let mut session = IssuanceSession::default();
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();

    session.export(Some(nested.as_path())).unwrap();
    assert_eq!(file_count(&nested), 3);
}

#[test]
fn invariant_failed_export_keeps_issuance_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"").unwrap();

    let mut session = IssuanceSession::default();
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();

    let err = session.export(Some(blocker.join("out").as_path())).unwrap_err();
    assert!(matches!(err, PipelineError::Export(ExportError::CreateDir { .. })));
    assert!(err.to_string().starts_with("Error creating directory: "));

    // Retry without regenerating
    let bundle = session.export(Some(dir.path())).unwrap();
    assert_eq!(bundle.serial_number, "SN-010125-6974");
}

#[test]
fn invariant_text_failure_aborts_before_images() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("SN-Widget-A1.txt")).unwrap();
    let symbol = SymbolEncoder::default().encode("SN-010125-6974").unwrap();

    let err = ArtifactExporter::default()
        .export("Widget", "A1", "SN-010125-6974", &symbol, dir.path())
        .unwrap_err();

    assert!(matches!(err, ExportError::WriteSerial { .. }));
    assert!(!dir.path().join("QR-Widget-A1.png").exists());
    assert!(!dir.path().join("QR-Widget-A1.bmp").exists());
}

#[test]
fn invariant_image_failure_keeps_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("QR-Widget-A1.png")).unwrap();
    let symbol = SymbolEncoder::default().encode("SN-010125-6974").unwrap();

    let err = ArtifactExporter::default()
        .export("Widget", "A1", "SN-010125-6974", &symbol, dir.path())
        .unwrap_err();

    assert!(matches!(err, ExportError::WriteSymbol { .. }));
    assert!(err.to_string().starts_with("Error saving QR files: "));
    assert_eq!(
        fs::read_to_string(dir.path().join("SN-Widget-A1.txt")).unwrap(),
        "SN-010125-6974"
    );
}

#[test]
fn invariant_blank_target_uses_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = IssuanceSession::new(GeneratorConfig {
        save_directory: Some(dir.path().join("default")),
        ..GeneratorConfig::default()
    });
    session
        .generate(&IssuanceRequest::new("Widget", "A1", "010125"))
        .unwrap();

    let bundle = session.export(Some(Path::new(""))).unwrap();
    assert_eq!(bundle.directory, dir.path().join("default"));
    assert_eq!(file_count(&bundle.directory), 3);
}

