//! Invariant-style properties of the merge.

mod common;

use common::{component_file, Scenario};

const IMPORTS: &str = "import { A } from \"m\"; // plasmic-import: 7/component\n";
const MARKUP: &str = r#"<div className={rh.clsRoot()}>hello</div>"#;

#[tokio::test]
async fn merging_a_version_with_itself_is_identity() {
    let merged = Scenario {
        new_markup: MARKUP,
        edited_markup: MARKUP,
        base_markup: MARKUP,
        new_uuids: &[("Root", "u1")],
        base_uuids: &[("Root", "u1")],
        new_imports: IMPORTS,
        edited_imports: IMPORTS,
    }
    .run()
    .await;
    // The fixture is in printer-normal form, so the only change is the
    // revision bump.
    let expected = component_file(IMPORTS, MARKUP, 2);
    assert_eq!(merged, expected);
}

#[tokio::test]
async fn merge_is_deterministic() {
    let scenario = Scenario {
        new_markup: r#"<div className={rh.clsRoot2()}>hello<span className={rh.clsS()}>s</span></div>"#,
        edited_markup: r#"<div className={rh.clsRoot()} id="mine">hello{extra}<span className={rh.clsS()}>s</span></div>"#,
        base_markup: r#"<div className={rh.clsRoot()}>hello<span className={rh.clsS()}>s</span></div>"#,
        new_uuids: &[("Root2", "u1"), ("S", "u2")],
        base_uuids: &[("Root", "u1"), ("S", "u2")],
        new_imports: "",
        edited_imports: "",
    };
    let first = scenario.run().await;
    let second = scenario.run().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn rename_leaves_no_stale_helper_references() {
    let merged = Scenario {
        new_markup: r#"rh.showX2() && <div {...rh.propsX2()}>t</div>"#,
        edited_markup: r#"rh.showX() && <div {...rh.propsX()} onClick={(e) => rh.onXClick(e)}>t</div>"#,
        base_markup: r#"rh.showX() && <div {...rh.propsX()}>t</div>"#,
        new_uuids: &[("X2", "u1")],
        base_uuids: &[("X", "u1")],
        new_imports: "",
        edited_imports: "",
    }
    .run()
    .await;
    for stale in ["rh.propsX(", "rh.showX(", "rh.onXClick"] {
        assert!(!merged.contains(stale), "stale reference {stale} in:\n{merged}");
    }
    assert!(merged.contains("rh.showX2()"));
    assert!(merged.contains("{...rh.propsX2()}"));
    assert!(merged.contains("rh.onX2Click"));
}

#[tokio::test]
async fn no_developer_edits_yields_new_markup() {
    // Tool-preserving: developer made no edits, so the markup tracks the
    // new version entirely.
    let merged = Scenario::markup_only(
        r#"<div className={rh.clsRoot()} role="main">fresh</div>"#,
        r#"<div className={rh.clsRoot()}>stale</div>"#,
        r#"<div className={rh.clsRoot()}>stale</div>"#,
        &[("Root", "u1")],
    )
    .run()
    .await;
    // Tool-added attributes land ahead of the managed class attribute.
    assert!(merged.contains(r#"<div role="main" className={rh.clsRoot()}>fresh</div>"#));
    assert!(!merged.contains("stale"));
}

#[tokio::test]
async fn no_tool_changes_preserves_all_developer_edits() {
    // Developer-preserving: base ≡ new, so every developer addition
    // survives untouched.
    let base = r#"<div className={rh.clsRoot()}>body</div>"#;
    let merged = Scenario::markup_only(
        base,
        r#"<div className={rh.clsRoot()} id="x" onClick={go}>body{note}</div>"#,
        base,
        &[("Root", "u1")],
    )
    .run()
    .await;
    assert!(merged.contains(r#"id="x""#));
    assert!(merged.contains("onClick={go}"));
    assert!(merged.contains("{note}"));
    assert!(merged.contains("body"));
}

#[tokio::test]
async fn managed_region_is_copied_from_new_file() {
    // The fixture's managed region is identical across versions, so this
    // exercises the copy path end to end; the marker pair must survive.
    let merged = Scenario::markup_only(MARKUP, MARKUP, MARKUP, &[("Root", "u1")])
        .run()
        .await;
    assert!(merged.contains("// plasmic-managed-start"));
    assert!(merged.contains("// plasmic-managed-end"));
    assert!(merged.contains("plasmic-managed-jsx/2"));
}

#[tokio::test]
async fn merged_managed_imports_are_sorted_and_deduplicated() {
    let markup = r#"<div className={rh.clsRoot()}>x</div>"#;
    let merged = Scenario {
        new_markup: markup,
        edited_markup: markup,
        base_markup: markup,
        new_uuids: &[("Root", "u1")],
        base_uuids: &[("Root", "u1")],
        new_imports: concat!(
            "import { P } from \"p\"; // plasmic-import: b/render\n",
            "import { Q } from \"q\"; // plasmic-import: a\n",
        ),
        edited_imports: concat!(
            "import { Q } from \"q\"; // plasmic-import: a\n",
            "import { R } from \"r\"; // plasmic-import: a/css\n",
        ),
    }
    .run()
    .await;
    let a = merged.find("plasmic-import: a\n").or_else(|| merged.find("plasmic-import: a")).unwrap();
    let a_css = merged.find("plasmic-import: a/css").unwrap();
    let b_render = merged.find("plasmic-import: b/render").unwrap();
    assert!(a < a_css && a_css < b_render, "imports out of order:\n{merged}");
    assert_eq!(merged.matches("import { Q } from \"q\"").count(), 1);
}
