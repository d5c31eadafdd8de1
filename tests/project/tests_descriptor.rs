//! Project descriptors: explicit files, search paths, nested descriptors.

use unitscope::project::{MemoryDescriptors, ProjectDescriptor};

use crate::helpers::sources::{UNIT2, UNIT3};
use crate::helpers::workspace::Workspace;

const APP: &str = "program App;

uses Unit2;

begin
end.
";

#[test]
fn test_descriptor_files_and_search_paths() {
    let ws = Workspace::new(&[("App.dpr", APP), ("src/Unit2.pas", UNIT2), ("lib/Unit3.pas", UNIT3)]);
    let root = ProjectDescriptor::at(ws.path("App.dproj"))
        .with_file("App.dpr")
        .with_search_path("src")
        .with_nested("lib/Lib.dproj");
    let mut source = MemoryDescriptors::new();
    source.insert(ProjectDescriptor::at(ws.path("lib/Lib.dproj")).with_search_path("."));

    let mut host = unitscope::AnalysisHost::new();
    host.set_project(root, &source);
    host.refresh();

    for name in ["App.dpr", "src/Unit2.pas", "lib/Unit3.pas"] {
        let file = ws.file(&host, name);
        assert!(host.is_active(file), "{name} should be active");
    }
    assert!(host.is_tracked_descriptor(&ws.path("lib/Lib.dproj")));
    assert!(!host.is_tracked_descriptor(&ws.path("Other.dproj")));
}

#[test]
fn test_missing_nested_descriptor_is_skipped() {
    let ws = Workspace::new(&[("App.dpr", APP), ("src/Unit2.pas", UNIT2)]);
    let root = ProjectDescriptor::at(ws.path("App.dproj"))
        .with_file("App.dpr")
        .with_search_path("src")
        .with_nested("Gone.dproj");

    let mut host = unitscope::AnalysisHost::new();
    host.set_project(root, &MemoryDescriptors::new());
    host.refresh();
    let unit2 = ws.file(&host, "src/Unit2.pas");
    assert!(host.is_active(unit2));
}

#[test]
fn test_add_root_directory_is_searched() {
    let ws = Workspace::new(&[("App.dpr", APP), ("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = unitscope::AnalysisHost::new();
    host.add_root(ws.path("App.dpr"));
    host.refresh();
    assert_eq!(host.active_files().len(), 3);
}
