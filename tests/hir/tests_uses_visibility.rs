//! Cross-unit resolution filtered by uses clauses.

use unitscope::hir::{ResolveResult, UsesSection};

use crate::helpers::sources::UNIT3;
use crate::helpers::workspace::{Workspace, offset_of};

const IFACE_USER: &str = "unit A;

interface

uses Unit3;

var
  X: TThing;

implementation

var
  Y: TThing;

end.
";

const IMPL_USER: &str = "unit A;

interface

var
  X: TThing;

implementation

uses Unit3;

var
  Y: TThing;

end.
";

#[test]
fn test_interface_uses_reach_both_sections() {
    let ws = Workspace::new(&[("A.pas", IFACE_USER), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");
    let analysis = host.analysis();

    let iface = analysis.resolve("TThing", a, offset_of(IFACE_USER, "TThing", 0));
    let imp = analysis.resolve("TThing", a, offset_of(IFACE_USER, "TThing", 1));
    assert_eq!(iface.record().map(|r| r.unit.as_str()), Some("Unit3"));
    assert_eq!(imp.record().map(|r| r.unit.as_str()), Some("Unit3"));
}

#[test]
fn test_implementation_uses_missing_from_interface() {
    let ws = Workspace::new(&[("A.pas", IMPL_USER), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");
    let analysis = host.analysis();

    match analysis.resolve("TThing", a, offset_of(IMPL_USER, "TThing", 0)) {
        ResolveResult::MissingUses {
            unit,
            section,
            candidates,
        } => {
            assert_eq!(unit, "Unit3");
            assert_eq!(section, UsesSection::Interface);
            assert_eq!(candidates.len(), 1);
        }
        other => panic!("expected MissingUses, got {other:?}"),
    }
    assert!(analysis.resolve("TThing", a, offset_of(IMPL_USER, "TThing", 1)).is_found());
}

#[test]
fn test_two_used_units_are_ambiguous() {
    let b1 = "unit B1; interface type T = class end; implementation end.";
    let b2 = "unit B2; interface type T = record end; implementation end.";
    let user = "unit A; interface uses B1, B2; var V: T; implementation end.";
    let ws = Workspace::new(&[("A.pas", user), ("B1.pas", b1), ("B2.pas", b2)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");
    let analysis = host.analysis();

    let result = analysis.resolve("T", a, offset_of(user, "T;", 0));
    assert_eq!(result, ResolveResult::Ambiguous(vec!["B1".into(), "B2".into()]));
}

#[test]
fn test_implementation_declarations_stay_private() {
    let hidden = "unit B; interface implementation type THidden = class end; end.";
    let user = "unit A; interface uses B; var V: THidden; implementation end.";
    let ws = Workspace::new(&[("A.pas", user), ("B.pas", hidden)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");
    let analysis = host.analysis();

    assert_eq!(
        analysis.resolve("THidden", a, offset_of(user, "THidden", 0)),
        ResolveResult::NotFound
    );
}

#[test]
fn test_program_uses_visible_everywhere() {
    let program = "program App;

uses Unit3;

var
  Main: TThing;

begin
end.
";
    let ws = Workspace::new(&[("App.dpr", program), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["App.dpr"]);
    let app = ws.file(&host, "App.dpr");
    let analysis = host.analysis();
    assert!(analysis.resolve("TThing", app, offset_of(program, "TThing", 0)).is_found());
}
