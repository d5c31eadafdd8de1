//! Go to definition tests for the IDE layer.

use unitscope::hir::DefKind;
use unitscope::TextSize;

use crate::helpers::sources::{CLIENT, SHAPES, UNIT2, UNIT3};
use crate::helpers::workspace::{Workspace, offset_of};

// =============================================================================
// GOTO DEFINITION - BASIC
// =============================================================================

#[test]
fn test_goto_type_in_used_unit() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let unit3 = ws.file(&host, "Unit3.pas");
    let analysis = host.analysis();

    // inside the identifier, not at its start
    let at = offset_of(UNIT2, "TThing", 0) + TextSize::from(3);
    let result = analysis.goto_definition(unit2, at);
    assert_eq!(result.targets.len(), 1);
    let target = &result.targets[0];
    assert_eq!(target.name, "TThing");
    assert_eq!(target.file, unit3);
    assert_eq!(target.kind, DefKind::Type);
    assert_eq!(target.range.start(), offset_of(UNIT3, "TThing", 0));
}

#[test]
fn test_goto_on_keyword_is_empty() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = ws.host(&["Unit2.pas"]);
    let unit2 = ws.file(&host, "Unit2.pas");
    let analysis = host.analysis();
    assert!(analysis.goto_definition(unit2, offset_of(UNIT2, "interface", 0)).is_empty());
}

// =============================================================================
// GOTO DEFINITION - MEMBERS AND AMBIGUITY
// =============================================================================

#[test]
fn test_goto_member_of_chain() {
    let ws = Workspace::new(&[("Shapes.pas", SHAPES), ("Client.pas", CLIENT)]);
    let mut host = ws.host(&["Client.pas"]);
    let client = ws.file(&host, "Client.pas");
    let shapes = ws.file(&host, "Shapes.pas");
    let analysis = host.analysis();

    let at = offset_of(CLIENT, "Width := 4", 0);
    let result = analysis.goto_definition(client, at);
    assert_eq!(result.targets.len(), 1);
    assert_eq!(result.targets[0].file, shapes);
    assert_eq!(result.targets[0].range.start(), offset_of(SHAPES, "Width", 0));
}

#[test]
fn test_goto_invisible_member_is_empty() {
    let ws = Workspace::new(&[("Shapes.pas", SHAPES), ("Client.pas", CLIENT)]);
    let mut host = ws.host(&["Client.pas"]);
    let client = ws.file(&host, "Client.pas");
    let analysis = host.analysis();
    assert!(
        analysis
            .goto_definition(client, offset_of(CLIENT, "FSecret", 0))
            .is_empty()
    );
}

#[test]
fn test_goto_ambiguous_lists_every_candidate() {
    let b1 = "unit B1; interface type T = class end; implementation end.";
    let b2 = "unit B2; interface type T = record end; implementation end.";
    let user = "unit A; interface uses B1, B2; var V: T; implementation end.";
    let ws = Workspace::new(&[("A.pas", user), ("B1.pas", b1), ("B2.pas", b2)]);
    let mut host = ws.host(&["A.pas"]);
    let a = ws.file(&host, "A.pas");
    let analysis = host.analysis();

    let result = analysis.goto_definition(a, offset_of(user, "T;", 0));
    let mut units: Vec<&str> = result.targets.iter().map(|t| t.unit.as_str()).collect();
    units.sort();
    assert_eq!(units, vec!["B1", "B2"]);
}
