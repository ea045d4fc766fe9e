//! Convenience macro for declaring field-to-key bindings

/// Implements [`Bindable`](crate::Bindable) for a structure from a list of
/// `field: kind => "key"` declarations.
///
/// Supported kinds are `integer` (for `i64` fields), `boolean` (for `bool`
/// fields) and `text` (for `String` fields). Structure fields that are not
/// declared here are never written by materialization. Declaring a kind
/// outside the supported set is a programmer error: the generated binding
/// table reports it the first time it is built, before any field is written.
///
/// # Examples
///
/// ```rust
/// use confetch::{bind_config, Bindable};
///
/// #[derive(Debug, Default)]
/// struct HttpSettings {
///     port: i64,
///     verbose: bool,
///     host: String,
/// }
///
/// bind_config!(HttpSettings {
///     port: integer => "http.port",
///     verbose: boolean => "http.verbose",
///     host: text => "http.host",
/// });
///
/// let table = HttpSettings::bindings().unwrap();
/// assert_eq!(table.len(), 3);
/// ```
#[macro_export]
macro_rules! bind_config {
    ($target:ty { $($field:ident : $kind:ident => $key:literal),+ $(,)? }) => {
        impl $crate::Bindable for $target {
            fn bindings() -> $crate::Result<$crate::BindingTable<Self>> {
                $crate::BindingTable::builder()
                    $(
                        .field(
                            stringify!($field),
                            $key,
                            stringify!($kind),
                            |target: &mut Self, value: $crate::FieldValue| {
                                $crate::bind_config!(@write target.$field, $kind, value);
                            },
                        )
                    )+
                    .build()
            }
        }
    };
    (@write $place:expr, integer, $value:ident) => {
        if let $crate::FieldValue::Integer(converted) = $value {
            $place = converted;
        }
    };
    (@write $place:expr, boolean, $value:ident) => {
        if let $crate::FieldValue::Boolean(converted) = $value {
            $place = converted;
        }
    };
    (@write $place:expr, text, $value:ident) => {
        if let $crate::FieldValue::Text(converted) = $value {
            $place = converted;
        }
    };
    // Unknown kinds still get a writer so the declaration reaches the
    // builder, which rejects the kind name before anything can be written.
    (@write $place:expr, $kind:ident, $value:ident) => {
        let _ = &$value;
        let _ = &$place;
    };
}
