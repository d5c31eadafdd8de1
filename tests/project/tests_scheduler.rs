//! Background activation through the host.

use std::time::Duration;

use unitscope::AnalysisHost;
use unitscope::project::WorkspaceConfig;

use crate::helpers::sources::{ORPHAN, UNIT2, UNIT3};
use crate::helpers::workspace::{Workspace, offset_of};

const WAIT: Duration = Duration::from_secs(10);

fn background_host() -> AnalysisHost {
    AnalysisHost::with_background_activation(
        WorkspaceConfig::default().with_debounce(Duration::from_millis(200)),
    )
}

#[test]
fn test_background_activation_applies() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = background_host();
    let unit2 = host.mark_seed(ws.path("Unit2.pas"));
    assert!(host.wait_for_activation(WAIT));

    let analysis = host.analysis();
    assert!(analysis.resolve("TThing", unit2, offset_of(UNIT2, "TThing", 0)).is_found());
}

#[test]
fn test_burst_of_changes_coalesces() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3), ("Orphan.pas", ORPHAN)]);
    let mut host = background_host();
    host.mark_seed(ws.path("Unit2.pas"));
    host.mark_seed(ws.path("Orphan.pas"));
    host.set_file_text(ws.path("Scratch.pas"), "unit Scratch; interface implementation end.");
    host.mark_seed(ws.path("Scratch.pas"));
    assert!(host.wait_for_activation(WAIT));

    assert_eq!(host.activation_runs(), 1);
    assert_eq!(host.active_files().len(), 4);
}

#[test]
fn test_queries_before_activation_see_previous_state() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = AnalysisHost::with_background_activation(
        WorkspaceConfig::default().with_debounce(Duration::from_secs(5)),
    );
    host.mark_seed(ws.path("Unit2.pas"));
    // still debouncing: nothing is active yet
    assert!(host.analysis().find_all_by_name("TThing").is_empty());
}

#[test]
fn test_search_directories_walked_by_the_run() {
    let ws = Workspace::new(&[("Unit2.pas", UNIT2), ("Unit3.pas", UNIT3)]);
    let mut host = AnalysisHost::with_background_activation(
        WorkspaceConfig::default().with_debounce(Duration::from_millis(300)),
    );
    host.mark_seed(ws.path("Unit2.pas"));
    // the seed's siblings are not registered on the calling thread
    assert!(host.file_id(ws.path("Unit3.pas")).is_none());

    assert!(host.wait_for_activation(WAIT));
    let unit3 = host.file_id(ws.path("Unit3.pas")).unwrap();
    assert!(host.is_active(unit3));
}
