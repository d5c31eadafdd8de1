//! File diagnostics through the analysis snapshot.

use unitscope::hir::{Severity, codes};

use crate::helpers::sources::{UNIT2, UNIT3};
use crate::helpers::workspace::Workspace;

#[test]
fn test_clean_file_has_no_diagnostics() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    assert!(host.analysis().file_diagnostics(unit2).is_empty());
}

#[test]
fn test_missing_uses_reported() {
    let user = "unit A;

interface

var
  X: TThing;

implementation

uses Unit3;

end.
";
    let ws = Workspace::new(&[("A.pas", user), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");

    let diagnostics = host.analysis().file_diagnostics(a);
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.code.as_deref(), Some(codes::MISSING_USES));
    assert!(diagnostic.message.contains("Unit3"), "{}", diagnostic.message);
    assert_eq!(diagnostic.start_line, 5);
}

#[test]
fn test_inactive_file_has_no_diagnostics() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit3.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    assert!(host.analysis().file_diagnostics(unit2).is_empty());
}
