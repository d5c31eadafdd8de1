//! Extraction context — cursor, output buffers and pending attributes.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::FileId;
use crate::hir::records::{
    AttributeDef, AttributeTarget, DefinitionData, DefinitionRecord, ParseSkip, Section,
    VariableKind, Visibility,
};
use crate::parser::{Token, TokenCursor};

/// An attribute seen in brackets, waiting for the declaration it decorates.
pub(super) struct PendingAttribute {
    pub name: SmolStr,
    pub range: TextRange,
    pub extent: TextRange,
    pub raw_args: Option<SmolStr>,
}

/// Extraction state passed through all extraction functions.
pub(super) struct ExtractionContext<'t, 'a> {
    pub file: FileId,
    pub unit: SmolStr,
    pub text: &'a str,
    pub cursor: TokenCursor<'t, 'a>,
    pub section: Section,
    pub records: Vec<DefinitionRecord>,
    pub call_arg_ranges: Vec<TextRange>,
    pub skipped: Vec<ParseSkip>,
    pub pending_attributes: Vec<PendingAttribute>,
}

impl<'t, 'a> ExtractionContext<'t, 'a> {
    pub fn new(file: FileId, unit: SmolStr, text: &'a str, tokens: &'t [Token<'a>], section: Section) -> Self {
        Self {
            file,
            unit,
            text,
            cursor: TokenCursor::new(tokens),
            section,
            records: Vec::new(),
            call_arg_ranges: Vec::new(),
            skipped: Vec::new(),
            pending_attributes: Vec::new(),
        }
    }

    /// Token at absolute index `idx`.
    pub fn token(&self, idx: usize) -> Option<&'t Token<'a>> {
        self.cursor.tokens().get(idx)
    }

    /// Range from the token at `start` to the end of the last consumed token.
    pub fn extent_from(&self, start: usize) -> TextRange {
        let begin = self.token(start).map_or(TextSize::from(0), |t| t.offset);
        TextRange::new(begin, self.cursor.prev_end().max(begin))
    }

    /// Push a record and attach any pending attributes to it.
    /// Returns the record's index.
    pub fn push(
        &mut self,
        name: &Token<'_>,
        extent: TextRange,
        visibility: Visibility,
        owner: Option<SmolStr>,
        mut data: DefinitionData,
    ) -> usize {
        let name_text = SmolStr::new(name.ident_text());
        if !self.pending_attributes.is_empty() {
            let target_kind = match &data {
                DefinitionData::Type(_) => AttributeTarget::Type,
                DefinitionData::Routine(_) => AttributeTarget::Routine,
                DefinitionData::Property(_) => AttributeTarget::Property,
                DefinitionData::Variable(v) if v.kind == VariableKind::Field => AttributeTarget::Field,
                _ => AttributeTarget::Unknown,
            };
            let pending = std::mem::take(&mut self.pending_attributes);
            if let DefinitionData::Type(t) = &mut data {
                t.attributes.extend(pending.iter().map(|a| a.name.clone()));
            }
            for attr in pending {
                self.records.push(DefinitionRecord {
                    name: attr.name,
                    file: self.file,
                    unit: self.unit.clone(),
                    range: attr.range,
                    extent: attr.extent,
                    section: self.section,
                    visibility,
                    owner: owner.clone(),
                    data: DefinitionData::Attribute(AttributeDef {
                        raw_args: attr.raw_args,
                        target: Some(name_text.clone()),
                        target_kind,
                    }),
                });
            }
        }
        self.records.push(DefinitionRecord {
            name: name_text,
            file: self.file,
            unit: self.unit.clone(),
            range: name.range(),
            extent,
            section: self.section,
            visibility,
            owner,
            data,
        });
        self.records.len() - 1
    }

    /// Record that the tokens from `start` up to the cursor were skipped.
    pub fn skip_from(&mut self, start: usize, context: &'static str) {
        let range = self.extent_from(start);
        tracing::debug!(
            "[EXTRACT] {}: skipped {:?} in {} ({})",
            self.unit,
            range,
            context,
            self.file
        );
        self.skipped.push(ParseSkip {
            range,
            context: SmolStr::new_static(context),
        });
    }

    /// Recover at the next statement boundary, recording the skipped run.
    pub fn recover(&mut self, context: &'static str) {
        let start = self.cursor.pos();
        self.cursor.skip_past_semicolon();
        if self.cursor.pos() == start {
            self.cursor.bump();
        }
        self.skip_from(start, context);
    }

    /// Drop attributes that never found a declaration.
    pub fn discard_attributes(&mut self) {
        self.pending_attributes.clear();
    }
}

/// Join an owner path and a name with a dot.
pub(super) fn child_path(owner: Option<&str>, name: &str) -> SmolStr {
    match owner {
        Some(owner) if !owner.is_empty() => SmolStr::new(format!("{}.{}", owner, name)),
        _ => SmolStr::new(name),
    }
}
