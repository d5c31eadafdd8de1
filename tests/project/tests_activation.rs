//! Which files a seed activates, and how edits move the closure.

use unitscope::hir::ResolveResult;
use unitscope::project::WorkspaceConfig;

use crate::helpers::sources::{ORPHAN, UNIT2, UNIT3};
use crate::helpers::workspace::{Workspace, offset_of};

#[test]
fn test_seed_activates_used_unit() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3), ("Orphan.pas", ORPHAN)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let unit3 = ws.file(&host, "Unit3.pas");
    let orphan = ws.file(&host, "Orphan.pas");

    let analysis = host.analysis();
    assert!(analysis.is_active(unit2));
    assert!(analysis.is_active(unit3));
    assert!(!analysis.is_active(orphan));
    assert!(analysis.is_inactive(orphan));

    let record = analysis
        .resolve("TThing", unit2, offset_of(UNIT2, "TThing", 0))
        .into_record()
        .expect("TThing from Unit3");
    assert_eq!(record.file, unit3);
}

#[test]
fn test_inactive_files_searched_on_request() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3), ("Orphan.pas", ORPHAN)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let analysis = host.analysis();

    assert!(analysis.find_all_by_name("TOrphan").is_empty());
    let found = analysis.find_all_by_name_or_inactive("TOrphan");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].unit, "Orphan");
    // active hits are returned without touching inactive files
    assert_eq!(analysis.find_all_by_name_or_inactive("TThing").len(), 1);
}

#[test]
fn test_adding_uses_activates_unit() {
    let before = "unit Unit2; interface var Current: TThing; implementation end.";
    let ws = Workspace::new(&[("Unit2.pas", before), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let unit3 = ws.file(&host, "Unit3.pas");
    assert!(!host.is_active(unit3));
    assert_eq!(
        host.analysis().resolve("TThing", unit2, offset_of(before, "TThing", 0)),
        ResolveResult::NotFound
    );

    host.set_file_text(ws.path("Unit2.pas"), UNIT2);
    let analysis = host.analysis();
    assert!(analysis.is_active(unit3));
    assert!(analysis.resolve("TThing", unit2, offset_of(UNIT2, "TThing", 0)).is_found());
}

#[test]
fn test_dropping_uses_deactivates_unit() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit3 = ws.file(&host, "Unit3.pas");
    assert!(host.is_active(unit3));

    host.set_file_text(ws.path("Unit2.pas"), "unit Unit2; interface implementation end.");
    let analysis = host.analysis();
    assert!(!analysis.is_active(unit3));
    assert!(analysis.find_all_by_name("TThing").is_empty());
}

#[test]
fn test_uses_cycle_terminates() {
    let a = "unit A; interface uses B; implementation end.";
    let b = "unit B; interface implementation uses A; end.";
    let ws = Workspace::new(&[("A.pas", a), ("B.pas", b)]);
    let host = ws.host(&["A.pas"]);
    assert_eq!(host.active_files().len(), 2);
}

#[test]
fn test_extra_source_path_searched_recursively() {
    let ws = Workspace::new(&[
        ("app/Unit2.pas", UNIT2),
        ("vendor/deep/Unit3.pas", UNIT3),
    ]);
    let config = WorkspaceConfig::default().with_extra_source_path(ws.path("vendor"));
    let host = ws.host_with(config, &["app/Unit2.pas"]);
    let unit3 = ws.file(&host, "vendor/deep/Unit3.pas");
    assert!(host.is_active(unit3));
}

#[test]
fn test_uses_in_path_resolves_relative_to_user() {
    let user = "program App; uses Unit3 in 'lib\\Unit3.pas'; begin end.";
    let ws = Workspace::new(&[("App.dpr", user), ("lib/Unit3.pas", UNIT3)]);
    let host = ws.host(&["App.dpr"]);
    let unit3 = ws.file(&host, "lib/Unit3.pas");
    assert!(host.is_active(unit3));
}

#[test]
fn test_parse_uses_for_inactive_file() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3), ("Orphan.pas", ORPHAN)]);
    let mut host = ws.host(&["Unit3.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let analysis = host.analysis();

    assert!(!analysis.is_active(unit2));
    let uses = analysis.parse_uses(unit2).expect("readable");
    assert_eq!(uses.unit_name.as_deref(), Some("Unit2"));
    assert_eq!(uses.interface_uses.len(), 1);
    assert_eq!(uses.interface_uses[0].name, "Unit3");
}
