/*!
# Symbol Table

Symbols produced by the front end together with their raw platform
attributes. A symbol knows its containing scope (member → type → assembly),
the property/event it belongs to (for accessors) and the interface members
it implements. Contracts are derived from this table in [`crate::contract`].
*/

pub mod well_known;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::Span;

pub use well_known::{declare_platform_check_api, PlatformCheckApi};

/// Identity of a symbol within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Assembly,
    Type,
    Method,
    Constructor,
    Property,
    Field,
    Event,
    /// Property or event accessor; see [`Symbol::associated`].
    Accessor,
    LocalFunction,
}

/// Kind of a platform attribute as written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Supported,
    Unsupported,
    Obsoleted,
    SupportedGuard,
    UnsupportedGuard,
}

/// One raw platform attribute, e.g. `[SupportedOSPlatform("Windows10.0")]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAttribute {
    pub kind: AttributeKind,
    /// Raw `<platformName><optionalVersion>` string.
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl PlatformAttribute {
    pub fn new(kind: AttributeKind, platform: impl Into<String>) -> Self {
        Self {
            kind,
            platform: platform.into(),
            message: None,
            url: None,
            span: Span::zero(),
        }
    }

    pub fn supported(platform: impl Into<String>) -> Self {
        Self::new(AttributeKind::Supported, platform)
    }

    pub fn unsupported(platform: impl Into<String>) -> Self {
        Self::new(AttributeKind::Unsupported, platform)
    }

    pub fn obsoleted(platform: impl Into<String>) -> Self {
        Self::new(AttributeKind::Obsoleted, platform)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Fully qualified for types, simple for members.
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing: Option<SymbolId>,
    /// Property or event owning an accessor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated: Option<SymbolId>,
    /// Interface members implemented (explicitly or implicitly) by this member.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<SymbolId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<PlatformAttribute>,
    /// Source file of the declaration, used to place attribute diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// All symbols of one compilation, addressable by [`SymbolId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_id: HashMap<SymbolId, usize>,
    types_by_name: HashMap<String, SymbolId>,
    /// One past the highest id seen; may exceed `u32::MAX`.
    next_id: u64,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn insert(&mut self, symbol: Symbol) {
        if symbol.kind == SymbolKind::Type {
            self.types_by_name.insert(symbol.name.clone(), symbol.id);
        }
        self.next_id = self.next_id.max(u64::from(symbol.id.0) + 1);
        self.by_id.insert(symbol.id, self.symbols.len());
        self.symbols.push(symbol);
    }

    /// Next free id. Once ids past the highest loaded one are exhausted, the
    /// lowest unused id is taken instead.
    fn fresh_id(&self) -> SymbolId {
        if let Ok(id) = u32::try_from(self.next_id) {
            return SymbolId(id);
        }
        (0..=u32::MAX)
            .map(SymbolId)
            .find(|id| !self.by_id.contains_key(id))
            .unwrap_or(SymbolId(u32::MAX))
    }

    /// Adds a symbol with a fresh id.
    pub fn add_symbol(
        &mut self,
        name: impl Into<String>,
        kind: SymbolKind,
        containing: Option<SymbolId>,
    ) -> SymbolId {
        let id = self.fresh_id();
        self.insert(Symbol {
            id,
            name: name.into(),
            kind,
            containing,
            associated: None,
            implements: Vec::new(),
            attributes: Vec::new(),
            file: None,
        });
        id
    }

    pub fn add_attribute(&mut self, id: SymbolId, attribute: PlatformAttribute) {
        if let Some(symbol) = self.get_mut(id) {
            symbol.attributes.push(attribute);
        }
    }

    pub fn set_associated(&mut self, accessor: SymbolId, owner: SymbolId) {
        if let Some(symbol) = self.get_mut(accessor) {
            symbol.associated = Some(owner);
        }
    }

    pub fn add_implements(&mut self, member: SymbolId, interface_member: SymbolId) {
        if let Some(symbol) = self.get_mut(member) {
            symbol.implements.push(interface_member);
        }
    }

    pub fn set_file(&mut self, id: SymbolId, file: impl Into<String>) {
        if let Some(symbol) = self.get_mut(id) {
            symbol.file = Some(file.into());
        }
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.by_id.get(&id).map(|&index| &self.symbols[index])
    }

    fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        let index = *self.by_id.get(&id)?;
        self.symbols.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn find_type(&self, qualified_name: &str) -> Option<SymbolId> {
        self.types_by_name.get(qualified_name).copied()
    }

    /// Members of `type_id` named `name` (all overloads).
    pub fn find_members<'a>(&'a self, type_id: SymbolId, name: &'a str) -> impl Iterator<Item = SymbolId> + 'a {
        self.symbols
            .iter()
            .filter(move |s| s.containing == Some(type_id) && s.name == name)
            .map(|s| s.id)
    }

    pub fn find_member(&self, type_id: SymbolId, name: &str) -> Option<SymbolId> {
        self.find_members(type_id, name).next()
    }

    /// Containing symbols from the nearest outwards, excluding `id` itself.
    pub fn containing_chain(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|s| s.containing);
        while let Some(next) = current {
            if chain.contains(&next) || next == id {
                break;
            }
            chain.push(next);
            current = self.get(next).and_then(|s| s.containing);
        }
        chain
    }

    /// Nearest containing type, skipping local functions and accessor owners.
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        self.containing_chain(id)
            .into_iter()
            .find(|c| self.get(*c).map(|s| s.kind) == Some(SymbolKind::Type))
    }

    /// `Type.Member` for members, the simple type name for types.
    pub fn display_name(&self, id: SymbolId) -> String {
        let Some(symbol) = self.get(id) else {
            return id.to_string();
        };
        match symbol.kind {
            SymbolKind::Assembly => symbol.name.clone(),
            SymbolKind::Type => simple_name(&symbol.name).to_string(),
            _ => {
                let owner = self
                    .containing_type(id)
                    .and_then(|t| self.get(t))
                    .map(|t| simple_name(&t.name).to_string());
                match (owner, symbol.kind) {
                    (Some(owner), SymbolKind::Constructor) => format!("{owner}.{owner}"),
                    (Some(owner), _) => format!("{owner}.{}", symbol.name),
                    (None, _) => symbol.name.clone(),
                }
            }
        }
    }
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

impl From<Vec<Symbol>> for SymbolTable {
    fn from(symbols: Vec<Symbol>) -> Self {
        let mut table = SymbolTable::new();
        for symbol in symbols {
            table.insert(symbol);
        }
        table
    }
}

impl From<SymbolTable> for Vec<Symbol> {
    fn from(table: SymbolTable) -> Self {
        table.symbols
    }
}
