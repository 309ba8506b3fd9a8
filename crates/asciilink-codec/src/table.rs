use std::collections::HashMap;

use crate::error::{CodecError, Result};

/// Immutable, bijective label ↔ code table for an enumeration field.
///
/// Every code is exactly `width` ASCII characters. Codes and labels are
/// unique; both are checked when the table is built, never later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    width: usize,
    entries: Vec<(String, String)>,
    by_label: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl EnumTable {
    /// Build a table from `(label, code)` pairs, in declaration order.
    pub fn new<L, C>(width: usize, entries: impl IntoIterator<Item = (L, C)>) -> Result<Self>
    where
        L: Into<String>,
        C: Into<String>,
    {
        if width == 0 {
            return Err(CodecError::ZeroWidth);
        }

        let mut table = Self {
            width,
            entries: Vec::new(),
            by_label: HashMap::new(),
            by_code: HashMap::new(),
        };

        for (label, code) in entries {
            let (label, code) = (label.into(), code.into());
            if !code.is_ascii() {
                return Err(CodecError::NonAscii { text: code });
            }
            if code.len() != width {
                return Err(CodecError::CodeWidthMismatch { code, width });
            }
            if table.by_code.contains_key(&code) {
                return Err(CodecError::DuplicateCode { code });
            }
            if table.by_label.contains_key(&label) {
                return Err(CodecError::DuplicateLabel { label });
            }

            let index = table.entries.len();
            table.by_label.insert(label.clone(), index);
            table.by_code.insert(code.clone(), index);
            table.entries.push((label, code));
        }

        Ok(table)
    }

    /// Width of every code in the table.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Forward lookup.
    pub fn code(&self, label: &str) -> Result<&str> {
        self.by_label
            .get(label)
            .map(|&i| self.entries[i].1.as_str())
            .ok_or_else(|| CodecError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Reverse lookup.
    pub fn label(&self, code: &str) -> Result<&str> {
        self.by_code
            .get(code)
            .map(|&i| self.entries[i].0.as_str())
            .ok_or_else(|| CodecError::UnknownCode {
                code: code.to_string(),
            })
    }

    /// `(label, code)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, code)| (label.as_str(), code.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
