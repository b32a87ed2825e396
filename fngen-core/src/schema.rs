//! Output type descriptors and schema derivation
//!
//! A [`TypeDescriptor`] is an explicit description of the declared output
//! type. [`TypeDescriptor::schema`] turns it into the short schema text that
//! the prompt uses to constrain the backend's output shape. The schema is
//! documentation for the backend only; decoding never trusts it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Primitive scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Integer,
    Long,
    Short,
    Byte,
    Double,
    Float,
    Boolean,
    Character,
    #[serde(other)]
    Unknown,
}

impl Primitive {
    /// Canonical lowercase name used in schemas
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Integer => "integer",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Byte => "byte",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Boolean => "boolean",
            Primitive::Character => "character",
            Primitive::Unknown => "unknown primitive",
        }
    }
}

/// A named field of a structured type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into() }
    }

    /// A field whose type name comes from `T`'s descriptor
    pub fn of<T: Describe>(name: impl Into<String>) -> Self {
        Self::new(name, T::descriptor().simple_name())
    }
}

/// Explicit description of a declared output type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive { primitive: Primitive },
    /// A non-composite named type such as `String`
    Named { name: String },
    Enum { name: String, members: Vec<String> },
    Array { element: Box<TypeDescriptor> },
    Struct { name: String, fields: Vec<Field> },
    /// Fully dynamic target
    Any,
}

impl TypeDescriptor {
    pub fn primitive(primitive: Primitive) -> Self {
        Self::Primitive { primitive }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Enum { name: name.into(), members: members.into_iter().map(Into::into).collect() }
    }

    pub fn array(element: TypeDescriptor) -> Self {
        Self::Array { element: Box::new(element) }
    }

    pub fn record(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::Struct { name: name.into(), fields: fields.into_iter().collect() }
    }

    /// Name used when this type appears as an array element or a field type
    pub fn simple_name(&self) -> String {
        match self {
            Self::Primitive { primitive } => primitive.name().to_string(),
            Self::Named { name } | Self::Enum { name, .. } | Self::Struct { name, .. } => {
                name.clone()
            }
            Self::Array { element } => format!("{}[]", element.simple_name()),
            Self::Any => "Object".to_string(),
        }
    }

    /// Derive the schema text embedded in prompts
    pub fn schema(&self) -> String {
        match self {
            Self::Enum { members, .. } => format!("enum({})", members.join(", ")),
            Self::Array { element } => format!("array of {}", element.simple_name()),
            Self::Primitive { primitive } => primitive.name().to_string(),
            Self::Any => "unknown type".to_string(),
            Self::Named { name } => name.clone(),
            Self::Struct { fields, .. } => {
                if fields.is_empty() {
                    return "{ }".to_string();
                }
                let listed: Vec<String> =
                    fields.iter().map(|f| format!("{}: {}", f.name, f.type_name)).collect();
                format!("{{ {} }}", listed.join(", "))
            }
        }
    }

    /// Check that decoded objects carry exactly the declared field set.
    ///
    /// Structured descriptors constrain shape here, also as array elements;
    /// everything else is left to the typed decode.
    pub fn check_fields(&self, value: &Value) -> Result<(), String> {
        let (name, fields) = match self {
            Self::Struct { name, fields } => (name, fields),
            Self::Array { element } => {
                if let Value::Array(items) = value {
                    for (index, item) in items.iter().enumerate() {
                        element
                            .check_fields(item)
                            .map_err(|err| format!("element {}: {}", index, err))?;
                    }
                }
                return Ok(());
            }
            _ => return Ok(()),
        };
        let Value::Object(map) = value else {
            return Err(format!("expected a JSON object for {}", name));
        };

        let mut expected: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        let mut actual: Vec<&str> = map.keys().map(String::as_str).collect();
        expected.sort_unstable();
        actual.sort_unstable();

        if expected != actual {
            return Err(format!(
                "fields of {} do not match: expected [{}], got [{}]",
                name,
                expected.join(", "),
                actual.join(", ")
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.schema())
    }
}

/// Types that can describe themselves for schema derivation
pub trait Describe {
    fn descriptor() -> TypeDescriptor;
}

macro_rules! describe_primitive {
    ($($ty:ty => $primitive:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive(Primitive::$primitive)
                }
            }
        )*
    };
}

describe_primitive! {
    i8 => Byte,
    u8 => Byte,
    i16 => Short,
    u16 => Integer,
    i32 => Integer,
    u32 => Integer,
    i64 => Long,
    u64 => Long,
    isize => Long,
    usize => Long,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    char => Character,
}

impl Describe for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::named("String")
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor())
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor())
    }
}

impl Describe for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_schema_keeps_declaration_order() {
        let mood = TypeDescriptor::enumeration("Mood", ["HAPPY", "SAD", "ANGRY", "NEUTRAL"]);
        assert_eq!(mood.schema(), "enum(HAPPY, SAD, ANGRY, NEUTRAL)");
    }

    #[test]
    fn test_array_schema() {
        assert_eq!(Vec::<i32>::descriptor().schema(), "array of integer");
        assert_eq!(<[f64; 3]>::descriptor().schema(), "array of double");
        assert_eq!(Vec::<String>::descriptor().schema(), "array of String");

        let people = TypeDescriptor::array(TypeDescriptor::record("Person", Vec::new()));
        assert_eq!(people.schema(), "array of Person");
    }

    #[test]
    fn test_primitive_schema() {
        assert_eq!(i32::descriptor().schema(), "integer");
        assert_eq!(f64::descriptor().schema(), "double");
        assert_eq!(bool::descriptor().schema(), "boolean");
        assert_eq!(i64::descriptor().schema(), "long");
        assert_eq!(char::descriptor().schema(), "character");
        assert_eq!(i8::descriptor().schema(), "byte");
        assert_eq!(i16::descriptor().schema(), "short");
        assert_eq!(TypeDescriptor::primitive(Primitive::Unknown).schema(), "unknown primitive");
    }

    #[test]
    fn test_untyped_schema() {
        assert_eq!(Value::descriptor().schema(), "unknown type");
    }

    #[test]
    fn test_struct_schema_lists_fields_in_order() {
        let person = TypeDescriptor::record(
            "Person",
            [Field::of::<String>("name"), Field::of::<i32>("age"), Field::new("email", "String")],
        );
        assert_eq!(person.schema(), "{ name: String, age: integer, email: String }");
        assert_eq!(TypeDescriptor::record("Empty", Vec::new()).schema(), "{ }");
    }

    #[test]
    fn test_check_fields() {
        let point = TypeDescriptor::record("Point", [Field::of::<i32>("x"), Field::of::<i32>("y")]);

        assert!(point.check_fields(&json!({"y": 2, "x": 1})).is_ok());
        assert!(point.check_fields(&json!({"x": 1})).is_err());
        assert!(point.check_fields(&json!({"x": 1, "y": 2, "z": 3})).is_err());
        assert!(point.check_fields(&json!([1, 2])).is_err());

        assert!(i32::descriptor().check_fields(&json!(5)).is_ok());
    }

    #[test]
    fn test_check_fields_in_arrays() {
        let point = TypeDescriptor::record("Point", [Field::of::<i32>("x"), Field::of::<i32>("y")]);
        let points = TypeDescriptor::array(point.clone());

        assert!(points.check_fields(&json!([{"x": 1, "y": 2}, {"y": 3, "x": 4}])).is_ok());
        assert!(points.check_fields(&json!([])).is_ok());

        let err = points.check_fields(&json!([{"x": 1, "y": 2}, {"x": 1, "y": 2, "z": 3}])).unwrap_err();
        assert!(err.starts_with("element 1: fields of Point do not match"), "{}", err);

        let grid = TypeDescriptor::array(points);
        let err = grid.check_fields(&json!([[{"x": 1, "y": 2}], [{"x": 1}]])).unwrap_err();
        assert!(err.starts_with("element 1: element 0:"), "{}", err);

        assert!(Vec::<i32>::descriptor().check_fields(&json!([1, 2])).is_ok());
    }

    #[test]
    fn test_descriptor_deserializes_from_toml() {
        let descriptor: TypeDescriptor = toml::from_str(
            r#"
kind = "enum"
name = "Sentiment"
members = ["POSITIVE", "NEGATIVE"]
"#,
        )
        .unwrap();
        assert_eq!(descriptor.schema(), "enum(POSITIVE, NEGATIVE)");

        let descriptor: TypeDescriptor = toml::from_str(
            r#"
kind = "array"
element = { kind = "primitive", primitive = "integer" }
"#,
        )
        .unwrap();
        assert_eq!(descriptor.schema(), "array of integer");

        let descriptor: TypeDescriptor =
            toml::from_str("kind = \"primitive\"\nprimitive = \"decimal\"").unwrap();
        assert_eq!(descriptor.schema(), "unknown primitive");
    }
}
