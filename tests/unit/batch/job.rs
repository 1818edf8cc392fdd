use super::*;

fn root(name: &str) -> PathBuf {
    let root = PathBuf::from("target").join("unit_job").join(name);
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("out")).unwrap();
    root
}

fn write_png(path: &Path, shade: u8) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(3, 2, image::Rgb([shade, shade, shade]))
        .save(path)
        .unwrap();
}

fn plate(root: &Path) -> PathBuf {
    let input = root.join("plate");
    for well in ["A01", "B01"] {
        for site in 1..=4 {
            write_png(&input.join(format!("plate_{well}_w{site}.png")), site * 10);
        }
    }
    input
}

fn series(root: &Path) -> PathBuf {
    let input = root.join("series");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("series.HTD"), b"control").unwrap();
    for tp in ["TimePoint_1", "TimePoint_2"] {
        write_png(&input.join(tp).join("site_a.png"), 50);
        write_png(&input.join(tp).join("site_b.png"), 150);
    }
    input
}

#[test]
fn auto_mode_runs_the_grid_sequencer_with_default_naming() {
    let root = root("auto_grid");
    let input = plate(&root);
    let job = MergeJob::new(&input, root.join("out"));

    let mut seen = Vec::new();
    let summary = run_job(&job, |e| seen.push(e.clone())).unwrap();

    assert_eq!(
        summary,
        JobSummary {
            kind: LayoutKind::Grid,
            files_visited: 8,
            exported: 2,
            warnings: 0,
        }
    );
    let out = root.join("out").join("plate_out");
    assert!(out.join("plate_A01_grid.png").is_file());
    assert!(out.join("plate_B01_grid.png").is_file());
    assert_eq!(seen.len(), 10);
}

#[test]
fn auto_mode_runs_the_stack_sequencer() {
    let root = root("auto_stack");
    let input = series(&root);
    let job = MergeJob::new(&input, root.join("out"));

    let prepared = prepare_job(&job).unwrap();
    assert_eq!(prepared.kind(), LayoutKind::Stack);
    assert_eq!(prepared.total(), 4);

    let summary = prepared.run(|_| {}).unwrap();
    assert_eq!(summary.files_visited, 4);
    assert_eq!(summary.exported, 2);
    let out = root.join("out").join("series_out");
    assert!(out.join("site_a_stack.gif").is_file());
    assert!(out.join("site_b_stack.gif").is_file());
}

#[test]
fn forced_mode_must_match_the_layout() {
    let root = root("forced_mismatch");
    let input = plate(&root);
    let job = MergeJob {
        mode: ModeSelection::Stack,
        ..MergeJob::new(&input, root.join("out"))
    };
    assert!(matches!(prepare_job(&job), Err(MergeError::Validation(_))));
    assert!(!root.join("out").join("plate_out").exists());
}

#[test]
fn forced_mode_matching_the_layout_runs() {
    let root = root("forced_match");
    let input = plate(&root);
    let job = MergeJob {
        mode: ModeSelection::Grid,
        ..MergeJob::new(&input, root.join("out"))
    };
    assert_eq!(run_job(&job, |_| {}).unwrap().exported, 2);
}

#[test]
fn output_must_be_an_existing_directory() {
    let root = root("missing_output");
    let input = plate(&root);
    let job = MergeJob::new(&input, root.join("nope"));
    assert!(matches!(prepare_job(&job), Err(MergeError::Validation(_))));
}

#[test]
fn unrecognized_input_is_refused() {
    let root = root("unrecognized");
    let input = root.join("notes");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("readme.txt"), b"hello").unwrap();

    let job = MergeJob::new(&input, root.join("out"));
    assert!(matches!(
        run_job(&job, |_| {}),
        Err(MergeError::UnrecognizedLayout { .. })
    ));
    assert!(!root.join("out").join("notes_out").exists());
}
