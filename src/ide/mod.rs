//! IDE features: high-level APIs for editor handlers.
//!
//! This module sits between the name-resolution model (HIR) and whatever
//! serves editor requests. Each query corresponds to one request.
//!
//! ## Usage
//!
//! The recommended way to use this module is through `AnalysisHost`:
//!
//! ```ignore
//! use unitscope::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new();
//! let file = host.mark_seed("/proj/Main.pas");
//!
//! let analysis = host.analysis();
//! let targets = analysis.goto_definition(file, offset);
//! ```

mod analysis;
mod goto;

pub use analysis::{Analysis, AnalysisHost};
pub use goto::{GotoResult, GotoTarget, goto_definition};
