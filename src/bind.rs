//! Declarative field-to-key bindings for snapshot materialization
//!
//! Target structures do not get introspected at runtime. Instead they
//! declare an explicit table of `(field, key, kind)` triples, usually
//! through the [`bind_config!`](crate::bind_config) macro. Kind names are
//! validated when the table is built, so an unsupported declaration fails
//! before any materialization runs; the materializer then converts snapshot
//! values per kind and hands them to plain writer functions.

use crate::error::{ConfigError, Result};

/// Primitive kinds a bound field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 signed integer, written into `i64` fields
    Integer,
    /// Boolean literal, written into `bool` fields
    Boolean,
    /// Passthrough text, written into `String` fields
    Text,
}

impl FieldKind {
    /// Resolve a declared kind name, or `None` for unsupported names.
    fn from_declared(name: &str) -> Option<Self> {
        match name {
            "int" | "integer" | "i64" => Some(Self::Integer),
            "bool" | "boolean" => Some(Self::Boolean),
            "str" | "string" | "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// Convert a raw snapshot value into this kind.
    pub(crate) fn convert(self, field: &str, raw: &str) -> Result<FieldValue> {
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| ConfigError::conversion(field, raw, e.to_string())),
            Self::Boolean => parse_bool(raw)
                .map(FieldValue::Boolean)
                .ok_or_else(|| ConfigError::conversion(field, raw, "not a boolean literal")),
            Self::Text => Ok(FieldValue::Text(raw.to_owned())),
        }
    }
}

/// Boolean literals the configuration service convention accepts.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A converted value, ready to be written into a bound field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

/// One `(field, key, kind, writer)` entry of a binding table.
#[derive(Debug)]
pub struct FieldBinding<T> {
    pub(crate) field: &'static str,
    pub(crate) key: &'static str,
    pub(crate) kind: FieldKind,
    pub(crate) write: fn(&mut T, FieldValue),
}

/// Ordered, validated set of field bindings for one target structure.
#[derive(Debug)]
pub struct BindingTable<T> {
    entries: Vec<FieldBinding<T>>,
}

impl<T> BindingTable<T> {
    /// Start declaring bindings for `T`
    pub fn builder() -> BindingTableBuilder<T> {
        BindingTableBuilder {
            entries: Vec::new(),
            rejected: None,
        }
    }

    /// Number of declared bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table declares no bindings at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[FieldBinding<T>] {
        &self.entries
    }
}

/// Builder that validates declarations eagerly: the first unsupported kind
/// name is reported from [`build`](Self::build), before any materialization
/// can run against the table.
pub struct BindingTableBuilder<T> {
    entries: Vec<FieldBinding<T>>,
    rejected: Option<ConfigError>,
}

impl<T> BindingTableBuilder<T> {
    /// Declare one binding: snapshot key `key` supplies the value of
    /// `field`, converted to the kind named by `kind`.
    pub fn field(
        mut self,
        field: &'static str,
        key: &'static str,
        kind: &'static str,
        write: fn(&mut T, FieldValue),
    ) -> Self {
        match FieldKind::from_declared(kind) {
            Some(resolved) => self.entries.push(FieldBinding {
                field,
                key,
                kind: resolved,
                write,
            }),
            None => {
                if self.rejected.is_none() {
                    self.rejected = Some(ConfigError::unsupported_type(field, kind));
                }
            }
        }
        self
    }

    /// Finish the table, surfacing any rejected declaration
    pub fn build(self) -> Result<BindingTable<T>> {
        match self.rejected {
            Some(err) => Err(err),
            None => Ok(BindingTable {
                entries: self.entries,
            }),
        }
    }
}

/// Declares how snapshot values project onto a structure.
///
/// Implement by hand with [`BindingTable::builder`], or let the
/// [`bind_config!`](crate::bind_config) macro generate the impl.
pub trait Bindable: Sized {
    /// The declared bindings, in declaration order
    fn bindings() -> Result<BindingTable<Self>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_name_resolution() {
        assert_eq!(FieldKind::from_declared("int"), Some(FieldKind::Integer));
        assert_eq!(FieldKind::from_declared("integer"), Some(FieldKind::Integer));
        assert_eq!(FieldKind::from_declared("i64"), Some(FieldKind::Integer));
        assert_eq!(FieldKind::from_declared("bool"), Some(FieldKind::Boolean));
        assert_eq!(FieldKind::from_declared("boolean"), Some(FieldKind::Boolean));
        assert_eq!(FieldKind::from_declared("string"), Some(FieldKind::Text));
        assert_eq!(FieldKind::from_declared("str"), Some(FieldKind::Text));
        assert_eq!(FieldKind::from_declared("text"), Some(FieldKind::Text));
        assert_eq!(FieldKind::from_declared("float"), None);
        assert_eq!(FieldKind::from_declared("Integer"), None);
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(
            FieldKind::Integer.convert("port", "8080").unwrap(),
            FieldValue::Integer(8080)
        );
        assert_eq!(
            FieldKind::Integer.convert("offset", "-42").unwrap(),
            FieldValue::Integer(-42)
        );

        let err = FieldKind::Integer.convert("port", "notanumber").unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { .. }));

        let err = FieldKind::Integer.convert("port", "80.5").unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { .. }));
    }

    #[test]
    fn test_boolean_literals() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(
                FieldKind::Boolean.convert("flag", raw).unwrap(),
                FieldValue::Boolean(true),
                "literal {raw:?} should parse as true"
            );
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(
                FieldKind::Boolean.convert("flag", raw).unwrap(),
                FieldValue::Boolean(false),
                "literal {raw:?} should parse as false"
            );
        }
        for raw in ["yes", "no", "tRuE", "", "2"] {
            assert!(
                FieldKind::Boolean.convert("flag", raw).is_err(),
                "literal {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_text_passthrough() {
        assert_eq!(
            FieldKind::Text.convert("host", "localhost").unwrap(),
            FieldValue::Text("localhost".to_owned())
        );
        // Anything goes, including values that look like other kinds.
        assert_eq!(
            FieldKind::Text.convert("host", "8080").unwrap(),
            FieldValue::Text("8080".to_owned())
        );
    }

    #[derive(Debug)]
    struct Target {
        port: i64,
        host: String,
    }

    #[test]
    fn test_builder_collects_declarations_in_order() {
        let table: BindingTable<Target> = BindingTable::builder()
            .field("port", "http.port", "integer", |t: &mut Target, v| {
                if let FieldValue::Integer(port) = v {
                    t.port = port;
                }
            })
            .field("host", "http.host", "text", |t, v| {
                if let FieldValue::Text(host) = v {
                    t.host = host;
                }
            })
            .build()
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert_eq!(table.entries()[0].key, "http.port");
        assert_eq!(table.entries()[1].key, "http.host");
    }

    #[test]
    fn test_builder_rejects_unsupported_kind() {
        let result: Result<BindingTable<Target>> = BindingTable::builder()
            .field("port", "http.port", "float", |_, _| {})
            .build();

        match result.unwrap_err() {
            ConfigError::UnsupportedType { field, kind } => {
                assert_eq!(field, "port");
                assert_eq!(kind, "float");
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }
}
