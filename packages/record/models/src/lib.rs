#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case record and search criteria types for the Citius insolvency portal.
//!
//! Every extraction strategy produces [`CaseRecord`]s: ordered field maps
//! whose field sets depend on the page layout they were read from. Two
//! records from the same search may share no fields at all. Export writers
//! consume them without knowing which strategy built them.

pub mod criteria;

use std::fmt;

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use criteria::{
    CourtSet, CriteriaError, CriteriaInput, DaysFilter, SearchCriteria, SearchSubject,
};

/// Canonical field names used by the extraction strategies and exporters.
pub mod fields {
    /// Court handling the case.
    pub const TRIBUNAL: &str = "Tribunal";
    /// Published act.
    pub const ATO: &str = "Ato";
    /// Publication reference.
    pub const REFERENCIA: &str = "Referência";
    /// Case number.
    pub const PROCESSO: &str = "Processo";
    /// Kind of proceeding.
    pub const ESPECIE: &str = "Espécie";
    /// Publication date.
    pub const DATA: &str = "Data";
    /// Date the action was filed.
    pub const DATA_PROPOSITURA: &str = "Data da propositura da ação";
    /// Insolvent party.
    pub const INSOLVENTE: &str = "Insolvente";
    /// Tax id of the insolvent party.
    pub const NIF_NIPC: &str = "NIF/NIPC";
    /// Appointed insolvency administrator.
    pub const ADMINISTRADOR: &str = "Administrador Insolvência";
    /// Free-text description of the act.
    pub const DESCRICAO: &str = "Descrição";
    /// Intervening party.
    pub const INTERVENIENTE: &str = "Interveniente";
    /// Raw text of an item that could not be split into fields.
    pub const CONTEUDO: &str = "Conteúdo";
    /// Outbound document links.
    pub const LINKS: &str = "Links";
    /// Creditor names, in page order.
    pub const CREDORES: &str = "Credores";
    /// Creditor tax ids, paired positionally with [`CREDORES`].
    pub const NIFS_CREDORES: &str = "NIFs_Credores";
    /// 1-based ordinal of a placeholder record.
    pub const INDICE: &str = "Índice";
    /// Total reported by the portal.
    pub const TOTAL_DOCUMENTOS: &str = "Total_Documentos";
    /// Human-readable note.
    pub const OBSERVACAO: &str = "Observação";
    /// Error description.
    pub const ERRO: &str = "Erro";
    /// When a fault record was produced.
    pub const DATA_EXTRACAO: &str = "Data_Extracao";

    /// Fields holding ordered lists. Exported as trailing CSV columns.
    pub const MULTI_VALUED: [&str; 3] = [LINKS, CREDORES, NIFS_CREDORES];
}

/// Separator used when a list value is flattened into a single cell.
pub const LIST_SEPARATOR: &str = "; ";

/// `chrono` format string for timestamp values rendered as text.
pub const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain text.
    Text(String),
    /// Non-negative integer (placeholder ordinals and totals).
    Number(u64),
    /// Ordered list of strings.
    List(Vec<String>),
    /// Timestamp not yet rendered as text. The normalizer converts these
    /// to [`FieldValue::Text`].
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// Returns the text when this is a [`FieldValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the items when this is a [`FieldValue::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders the value as a single cell. Lists are joined with
    /// [`LIST_SEPARATOR`], so the split back is lossy.
    #[must_use]
    pub fn flatten(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
            Self::List(items) => f.write_str(&items.join(LIST_SEPARATOR)),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(ISO_TIMESTAMP_FORMAT)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

/// One case as read from the results page.
///
/// Fields keep insertion order, which is also the key order of the JSON
/// export. Inserting an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseRecord {
    fields: Vec<(String, FieldValue)>,
}

impl CaseRecord {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets `name` to `value`, returning the previous value if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        if let Some((_, existing)) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(existing, value));
        }
        self.fields.push((name, value));
        None
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns `true` if the record has a field called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for CaseRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl IntoIterator for CaseRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for CaseRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CaseRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CaseRecordVisitor)
    }
}

struct CaseRecordVisitor;

impl<'de> Visitor<'de> for CaseRecordVisitor {
    type Value = CaseRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of case record fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = CaseRecord::new();
        while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
            record.insert(name, value);
        }
        Ok(record)
    }
}
