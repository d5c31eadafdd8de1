//! Member chains across units: private, protected and public members.

use rstest::rstest;
use unitscope::ChainResult;

use crate::helpers::sources::{CLIENT, SHAPES};
use crate::helpers::workspace::{Workspace, offset_of};

fn workspace() -> Workspace {
    Workspace::new(&[("Shapes.pas", SHAPES), ("Client.pas", CLIENT)])
}

#[test]
fn test_private_member_visible_in_declaring_unit() {
    let ws = workspace();
    let mut host = ws.host(&["Shapes.pas"]);
    let shapes = ws.file(&host, "Shapes.pas");
    let analysis = host.analysis();

    let at = offset_of(SHAPES, "Shared.FSecret", 0);
    let result = analysis.resolve_chain(&["Shared", "FSecret"], shapes, at);
    assert_eq!(result.record().map(|r| r.name.as_str()), Some("FSecret"));
}

#[rstest]
#[case("Self.FCount", &["Self", "FCount"], true)]
#[case("Self.Width", &["Self", "Width"], true)]
#[case("S.FCount", &["S", "FCount"], false)]
#[case("S.FSecret", &["S", "FSecret"], false)]
#[case("S.Width", &["S", "Width"], true)]
fn test_access_from_another_unit(#[case] needle: &str, #[case] chain: &[&str], #[case] visible: bool) {
    let ws = workspace();
    let mut host = ws.host(&["Client.pas"]);
    let client = ws.file(&host, "Client.pas");
    let analysis = host.analysis();

    let result = analysis.resolve_chain(chain, client, offset_of(CLIENT, needle, 0));
    match result {
        ChainResult::Resolved(record) => {
            assert!(visible, "{needle} should not resolve, got {}", record.name);
            assert_eq!(record.unit, "Shapes");
            assert_eq!(record.owner.as_deref(), Some("TShape"));
        }
        ChainResult::Unresolved => assert!(!visible, "{needle} should resolve"),
    }
}

#[test]
fn test_unknown_head_is_unresolved() {
    let ws = workspace();
    let mut host = ws.host(&["Client.pas"]);
    let client = ws.file(&host, "Client.pas");
    let analysis = host.analysis();

    let at = offset_of(CLIENT, "S.Width", 0);
    assert_eq!(analysis.resolve_chain(&["Nobody", "Width"], client, at), ChainResult::Unresolved);
}
