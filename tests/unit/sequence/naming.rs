use super::*;

#[test]
fn default_rule_reads_well_row_from_plate_names() {
    let rule = NamingRule::default();
    assert_eq!(rule.label("exp01_B02_w1.tif"), Some('B'));
    assert!(rule.starts_group("exp01_B02_w1.tif"));
    assert!(!rule.starts_group("exp01_B02_w2.tif"));
    assert_eq!(rule.grid_output_name("exp01_B02_w1.tif"), "exp01_B02_grid");
}

#[test]
fn short_names_have_no_label() {
    let rule = NamingRule::default();
    assert_eq!(rule.label("a1.tif"), None);
    assert_eq!(
        NamingRule {
            label: LabelPosition::FromStemEnd(0),
            ..NamingRule::default()
        }
        .label("anything.tif"),
        None
    );
}

#[test]
fn delimiter_position_counts_from_the_end() {
    let last = NamingRule {
        label: LabelPosition::AfterDelimiter {
            delimiter: '_',
            occurrence: 1,
        },
        ..NamingRule::default()
    };
    assert_eq!(last.label("sample_A1.tif"), Some('A'));
    assert_eq!(last.label("nodelimiter.tif"), None);

    let second = NamingRule {
        label: LabelPosition::AfterDelimiter {
            delimiter: '_',
            occurrence: 2,
        },
        ..NamingRule::default()
    };
    assert_eq!(second.label("exp_C03_w1.tif"), Some('C'));
}

#[test]
fn stem_strips_only_the_final_extension() {
    assert_eq!(stem("a.b.tif"), "a.b");
    assert_eq!(stem("noext"), "noext");
    assert_eq!(stem(".hidden"), ".hidden");
}

#[test]
fn output_names() {
    let rule = NamingRule {
        suffix_trim: 1,
        ..NamingRule::default()
    };
    assert_eq!(rule.grid_output_name("sample_A1.tif"), "sample_A_grid");
    assert_eq!(rule.stack_output_name("frame1.tif"), "frame1_stack");
    assert_eq!(
        NamingRule {
            suffix_trim: 50,
            ..NamingRule::default()
        }
        .grid_output_name("x1.tif"),
        "_grid"
    );
}

#[test]
fn rule_deserializes_with_defaults() {
    let rule: NamingRule = serde_json::from_str(
        r#"{
            "label": { "after_delimiter": { "delimiter": "_", "occurrence": 1 } },
            "suffix_trim": 1
        }"#,
    )
    .unwrap();
    assert_eq!(rule.first_ordinal, '1');
    assert_eq!(rule.grid_tag, "_grid");
    assert_eq!(rule.label("s_B2.png"), Some('B'));

    let pos: LabelPosition = serde_json::from_str(r#"{ "from_stem_end": 2 }"#).unwrap();
    assert_eq!(pos, LabelPosition::FromStemEnd(2));
}
