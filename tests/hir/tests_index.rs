//! Definition index contents as seen through the host.

use crate::helpers::sources::{UNIT2, UNIT3};
use crate::helpers::workspace::{Workspace, offset_of};

#[test]
fn test_every_record_is_findable_by_name() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit3 = ws.file(&host, "Unit3.pas");

    let analysis = host.analysis();
    let records = analysis.index().records_in_file(unit3).to_vec();
    assert!(!records.is_empty());
    for record in &records {
        let found = analysis.find_all_by_name(&record.name);
        assert!(
            found.iter().any(|r| *r == record),
            "{} missing from find_all_by_name",
            record.name
        );
    }
}

#[test]
fn test_removed_file_leaves_no_records() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    assert!(!host.analysis().find_all_by_name("TThing").is_empty());

    assert!(host.remove_file(ws.path("Unit3.pas")));
    let analysis = host.analysis();
    assert!(analysis.find_all_by_name("TThing").is_empty());
    assert!(analysis.find_all_by_name("Name").is_empty());
}

#[test]
fn test_names_are_case_insensitive() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let analysis = host.analysis();
    assert_eq!(analysis.find_all_by_name("tthing").len(), 1);
    assert_eq!(analysis.find_all_by_name("TTHING").len(), 1);
}

#[test]
fn test_repeated_resolution_is_stable() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let at = offset_of(UNIT2, "TThing", 0);

    let analysis = host.analysis();
    let first = analysis.resolve("TThing", unit2, at);
    for _ in 0..3 {
        assert_eq!(analysis.resolve("TThing", unit2, at), first);
    }
    assert!(first.is_found());
}

#[test]
fn test_edit_replaces_file_records() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);

    let renamed = UNIT3.replace("TThing", "TWidget");
    host.set_file_text(ws.path("Unit3.pas"), renamed.as_str());
    let analysis = host.analysis();
    assert!(analysis.find_all_by_name("TThing").is_empty());
    assert_eq!(analysis.find_all_by_name("TWidget").len(), 1);
}
