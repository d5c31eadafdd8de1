//! Saving and restoring the index between sessions.

use std::fs;

use unitscope::hir::SCHEMA_VERSION;
use unitscope::project::ProjectError;

use crate::helpers::sources::{UNIT2, UNIT3};
use crate::helpers::workspace::{Workspace, offset_of};

#[test]
fn test_snapshot_restores_into_new_session() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let snapshot = ws.path("index.json");
    let first = ws.host(&["Unit2.pas"]);
    first.save_index(&snapshot).unwrap();

    let mut second = unitscope::AnalysisHost::new();
    let unit2 = second.mark_seed(ws.path("Unit2.pas"));
    assert_eq!(second.load_index(&snapshot).unwrap(), 2);
    assert_ne!(first.session_id(), second.session_id());

    let analysis = second.analysis();
    let record = analysis
        .resolve("TThing", unit2, offset_of(UNIT2, "TThing", 0))
        .into_record()
        .expect("resolved from restored index");
    assert_eq!(Some(record.file), analysis.file_id(ws.path("Unit3.pas")));
}

#[test]
fn test_changed_file_is_re_extracted() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let snapshot = ws.path("index.json");
    ws.host(&["Unit2.pas"]).save_index(&snapshot).unwrap();
    ws.write("Unit3.pas", &UNIT3.replace("TThing", "TWidget"));

    let mut host = unitscope::AnalysisHost::new();
    host.mark_seed(ws.path("Unit2.pas"));
    host.load_index(&snapshot).unwrap();
    let analysis = host.analysis();
    assert!(analysis.find_all_by_name("TThing").is_empty());
    assert_eq!(analysis.find_all_by_name("TWidget").len(), 1);
}

#[test]
fn test_other_schema_version_rejected() {
    let ws = Workspace::new(&[]);
    let snapshot = ws.path("index.json");
    fs::write(&snapshot, format!(r#"{{"schema_version": {}, "files": []}}"#, SCHEMA_VERSION + 1)).unwrap();

    let mut host = unitscope::AnalysisHost::new();
    assert!(matches!(host.load_index(&snapshot), Err(ProjectError::SchemaMismatch { .. })));
}
