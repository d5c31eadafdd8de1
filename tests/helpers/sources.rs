//! Common unit sources for tests.

/// Declares `TThing` in its interface.
pub const UNIT3: &str = "unit Unit3;

interface

type
  TThing = class
  public
    Name: string;
  end;

implementation

end.
";

/// Uses `Unit3` from its interface.
pub const UNIT2: &str = "unit Unit2;

interface

uses Unit3;

var
  Current: TThing;

implementation

end.
";

/// Never used by anything.
pub const ORPHAN: &str = "unit Orphan;

interface

type
  TOrphan = record
    Lonely: Boolean;
  end;

implementation

end.
";

/// A class with one member of each visibility.
pub const SHAPES: &str = "unit Shapes;

interface

type
  TShape = class
  private
    FSecret: Integer;
  protected
    FCount: Integer;
  public
    Width: Integer;
  end;

var
  Shared: TShape;

implementation

procedure Peek;
begin
  Shared.FSecret := 1;
end;

end.
";

/// Imports `Shapes`: a descendant and an unrelated class.
pub const CLIENT: &str = "unit Client;

interface

uses Shapes;

type
  TSquare = class(TShape)
  public
    procedure Grow;
  end;

  TStranger = class
  public
    procedure Poke(S: TShape);
  end;

implementation

procedure TSquare.Grow;
begin
  Self.FCount := 1;
  Self.Width := 2;
end;

procedure TStranger.Poke(S: TShape);
begin
  S.FCount := 2;
  S.FSecret := 3;
  S.Width := 4;
end;

end.
";
