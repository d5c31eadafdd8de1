//! Unit names with and without scope prefixes.

use std::path::Path;

use rstest::rstest;
use unitscope::base::FileId;
use unitscope::hir::UnitResolver;
use unitscope::project::WorkspaceConfig;

use crate::helpers::workspace::{Workspace, offset_of};

const SYSUTILS: &str = "unit System.SysUtils;

interface

type
  TFormatSettings = record
    DecimalSeparator: Char;
  end;

implementation

end.
";

#[rstest]
#[case("SysUtils")]
#[case("System.SysUtils")]
#[case("sysutils")]
fn test_alias_forms_reach_one_file(#[case] name: &str) {
    let mut units = UnitResolver::new();
    units.set_aliases(["System"]);
    units.add_candidate(FileId::new(0), Path::new("/rtl/System.SysUtils.pas"));
    units.add_candidate(FileId::new(1), Path::new("/app/Main.pas"));
    assert_eq!(units.resolve(name), Some(FileId::new(0)));
}

#[test]
fn test_unaliased_short_name_not_found() {
    let mut units = UnitResolver::new();
    units.add_candidate(FileId::new(0), Path::new("/rtl/System.SysUtils.pas"));
    assert_eq!(units.resolve("SysUtils"), None);
}

#[test]
fn test_short_uses_activates_scoped_unit() {
    let user = "unit Main; interface uses SysUtils; var F: TFormatSettings; implementation end.";
    let ws = Workspace::new(&[("Main.pas", user), ("System.SysUtils.pas", SYSUTILS)]);
    let config = WorkspaceConfig::default().with_scope_name_aliases(["System"]);
    let mut host = ws.host_with(config, &["Main.pas"]);
    let main = ws.file(&host, "Main.pas");

    let analysis = host.analysis();
    let record = analysis
        .resolve("TFormatSettings", main, offset_of(user, "TFormatSettings", 0))
        .into_record()
        .expect("resolved through alias");
    assert_eq!(record.unit, "System.SysUtils");
}

#[test]
fn test_alias_change_applies_at_runtime() {
    let user = "unit Main; interface uses SysUtils; var F: TFormatSettings; implementation end.";
    let ws = Workspace::new(&[("Main.pas", user), ("System.SysUtils.pas", SYSUTILS)]);
    let mut host = ws.host(&["Main.pas"]);
    let main = ws.file(&host, "Main.pas");
    let at = offset_of(user, "TFormatSettings", 0);
    assert!(!host.analysis().resolve("TFormatSettings", main, at).is_found());

    host.set_config(WorkspaceConfig::default().with_scope_name_aliases(["System"]));
    assert!(host.analysis().resolve("TFormatSettings", main, at).is_found());
}
