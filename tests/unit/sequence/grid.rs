use super::*;
use crate::sequence::naming::LabelPosition;

fn fixture(name: &str, files: &[(&str, u8)]) -> (PathBuf, PathBuf) {
    let root = PathBuf::from("target").join("unit_grid").join(name);
    let _ = std::fs::remove_dir_all(&root);
    let input = root.join("plate");
    std::fs::create_dir_all(&input).unwrap();
    for (file, shade) in files {
        image::RgbImage::from_pixel(4, 3, image::Rgb([*shade, *shade, *shade]))
            .save(input.join(file))
            .unwrap();
    }
    let output = root.join("out");
    std::fs::create_dir_all(&output).unwrap();
    (input, output)
}

fn short_names(columns: u32, rows: u32) -> GridOptions {
    GridOptions {
        shape: GridShape::new(columns, rows).unwrap(),
        naming: NamingRule {
            label: LabelPosition::FromStemEnd(2),
            suffix_trim: 1,
            ..NamingRule::default()
        },
        exclusions: ExclusionFilter::default(),
    }
}

fn run(input: &Path, output: &Path, opts: GridOptions) -> Vec<SequenceEvent> {
    GridSequencer::new(input, output, opts)
        .unwrap()
        .collect::<MergeResult<Vec<_>>>()
        .unwrap()
}

fn exported(events: &[SequenceEvent]) -> Vec<PathBuf> {
    events
        .iter()
        .filter_map(|e| match e {
            SequenceEvent::Exported { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

fn warnings(events: &[SequenceEvent]) -> Vec<SequenceWarning> {
    events
        .iter()
        .filter_map(|e| match e {
            SequenceEvent::Warning(w) => Some(w.clone()),
            _ => None,
        })
        .collect()
}

fn visits(events: &[SequenceEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SequenceEvent::Visited { .. }))
        .count()
}

#[test]
fn two_labels_flush_two_composites() {
    let (input, output) = fixture(
        "two_labels",
        &[
            ("sample_A1.tif", 10),
            ("sample_A2.tif", 20),
            ("sample_B1.tif", 30),
            ("sample_B2.tif", 40),
        ],
    );
    let events = run(&input, &output, short_names(2, 1));

    assert_eq!(visits(&events), 4);
    assert!(warnings(&events).is_empty());
    let out_dir = output.join("plate_out");
    assert_eq!(
        exported(&events),
        vec![
            out_dir.join("sample_A_grid.png"),
            out_dir.join("sample_B_grid.png")
        ]
    );

    let a = load_image(&out_dir.join("sample_A_grid.png")).unwrap();
    assert_eq!((a.width, a.height), (8, 3));
    assert_eq!(a.pixel(0, 0), Some([10, 10, 10]));
    assert_eq!(a.pixel(7, 2), Some([20, 20, 20]));
}

#[test]
fn flush_is_emitted_after_the_boundary_visit() {
    let (input, output) = fixture(
        "ordering",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_B1.png", 3), ("s_B2.png", 4)],
    );
    let events = run(&input, &output, short_names(2, 1));

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            SequenceEvent::Visited { .. } => "visit",
            SequenceEvent::Exported { .. } => "export",
            SequenceEvent::Warning(_) => "warn",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["visit", "visit", "visit", "export", "visit", "export"]
    );
}

#[test]
fn mismatched_label_inside_a_group_is_skipped_with_a_warning() {
    let (input, output) = fixture(
        "label_mismatch",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_B3.png", 3)],
    );
    let events = run(&input, &output, short_names(2, 1));

    assert_eq!(visits(&events), 3);
    assert_eq!(
        warnings(&events),
        vec![SequenceWarning::LabelMismatch {
            name: "s_B3.png".to_string(),
            expected: 'A',
            found: 'B',
        }]
    );
    assert_eq!(exported(&events).len(), 1);
}

#[test]
fn wrong_group_size_is_reported_not_exported() {
    let (input, output) = fixture(
        "grid_mismatch",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_A3.png", 3)],
    );
    let events = run(&input, &output, short_names(2, 2));

    assert!(exported(&events).is_empty());
    assert_eq!(
        warnings(&events),
        vec![SequenceWarning::GridMismatch {
            output: "s_A_grid".to_string(),
            images: 3,
            expected: 4,
        }]
    );
    assert!(!output.join("plate_out").join("s_A_grid.png").exists());
}

#[test]
fn oversized_group_is_truncated_to_the_grid() {
    let (input, output) = fixture(
        "truncate",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_A3.png", 3)],
    );
    let events = run(&input, &output, short_names(2, 1));

    assert_eq!(exported(&events).len(), 1);
    assert!(matches!(
        warnings(&events).as_slice(),
        [SequenceWarning::GroupTruncated {
            images: 3,
            kept: 2,
            ..
        }]
    ));
}

#[test]
fn trailing_single_image_is_not_flushed() {
    let (input, output) = fixture(
        "trailing",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_B1.png", 3)],
    );
    let events = run(&input, &output, short_names(2, 1));

    assert_eq!(exported(&events).len(), 1);
    assert_eq!(
        warnings(&events),
        vec![SequenceWarning::UndersizedGroup {
            output: "s_B_grid".to_string()
        }]
    );
}

#[test]
fn short_names_are_skipped() {
    let (input, output) = fixture("malformed", &[("x.png", 1), ("s_A1.png", 2), ("s_A2.png", 3)]);
    let events = run(&input, &output, short_names(2, 1));

    assert_eq!(visits(&events), 3);
    assert_eq!(
        warnings(&events),
        vec![SequenceWarning::MalformedName {
            name: "x.png".to_string()
        }]
    );
    assert_eq!(exported(&events).len(), 1);
}

#[test]
fn thumbnails_are_not_visited() {
    let (input, output) = fixture(
        "thumbs",
        &[("s_A1.png", 1), ("s_A1_Thumb.png", 9), ("s_A2.png", 2)],
    );
    let events = run(&input, &output, short_names(2, 1));
    assert_eq!(visits(&events), 2);
    assert_eq!(exported(&events).len(), 1);
}

#[test]
fn rerun_produces_identical_output_names() {
    let (input, output) = fixture(
        "idempotent",
        &[("s_A1.png", 1), ("s_A2.png", 2), ("s_B1.png", 3), ("s_B2.png", 4)],
    );
    let first = exported(&run(&input, &output, short_names(2, 1)));
    let second = exported(&run(&input, &output, short_names(2, 1)));
    assert_eq!(first, second);
}

#[test]
fn unreadable_image_ends_the_sequence() {
    let (input, output) = fixture("corrupt", &[("s_A1.png", 1)]);
    std::fs::write(input.join("s_A2.png"), b"not a png").unwrap();
    std::fs::write(input.join("s_A3.png"), b"never reached").unwrap();

    let items: Vec<_> = GridSequencer::new(&input, &output, short_names(2, 1))
        .unwrap()
        .collect();

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok());
    assert!(items[1].is_ok());
    assert!(items[2].is_err());
}

#[test]
fn zero_sized_grid_is_rejected_up_front() {
    let (input, output) = fixture("zero_grid", &[("s_A1.png", 1)]);
    let opts = GridOptions {
        shape: GridShape {
            columns: 0,
            rows: 2,
        },
        ..short_names(1, 1)
    };
    assert!(GridSequencer::new(&input, &output, opts).is_err());
}
