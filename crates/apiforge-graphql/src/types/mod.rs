//! Schema type model.
//!
//! Types built by the [`TypeBuilder`](crate::schema::TypeBuilder) are shared as
//! [`TypeHandle`]s. Two references to the same named type are the same `Arc`,
//! which is what lets the execution layer treat repeated references as one type.
//!
//! Object, interface and input types compute their fields lazily: the field
//! provider runs on the first [`SchemaType::fields`] call and the result is
//! memoized. Mutually recursive resources (`Dummy.related -> RelatedDummy.owner
//! -> Dummy`) therefore never recurse during construction.

mod registry;

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::Result;
use crate::schema::TypeBuilder;

pub use registry::TypeRegistry;

/// Shared handle to a constructed schema type.
pub type TypeHandle = Arc<SchemaType>;

/// Deferred field-list computation, evaluated against the type builder.
pub type FieldsProvider = Box<dyn Fn(&TypeBuilder) -> Result<Vec<FieldDefinition>> + Send + Sync>;

/// Maps a normalized payload to its concrete object type.
///
/// Receives the payload, the declared return type of the field being resolved
/// and the registry holding the concrete types.
pub type TypeResolver = Box<
    dyn Fn(&Value, &TypeHandle, &TypeRegistry) -> Result<Option<TypeHandle>> + Send + Sync,
>;

/// Name of the built-in `ID` scalar.
pub const ID: &str = "ID";
/// Name of the built-in `String` scalar.
pub const STRING: &str = "String";
/// Name of the built-in `Int` scalar.
pub const INT: &str = "Int";
/// Name of the built-in `Float` scalar.
pub const FLOAT: &str = "Float";
/// Name of the built-in `Boolean` scalar.
pub const BOOLEAN: &str = "Boolean";
/// Name of the custom scalar carrying arbitrary JSON arrays/objects.
pub const ITERABLE: &str = "Iterable";

/// Discriminant of a [`SchemaType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    InputObject,
    NonNull,
    List,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "ScalarType",
            Self::Object => "ObjectType",
            Self::Interface => "InterfaceType",
            Self::InputObject => "InputObjectType",
            Self::NonNull => "NonNull",
            Self::List => "ListOf",
        };
        f.write_str(name)
    }
}

/// A GraphQL type.
pub enum SchemaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    InputObject(InputObjectType),
    NonNull(TypeHandle),
    List(TypeHandle),
}

impl SchemaType {
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Interface(_) => TypeKind::Interface,
            Self::InputObject(_) => TypeKind::InputObject,
            Self::NonNull(_) => TypeKind::NonNull,
            Self::List(_) => TypeKind::List,
        }
    }

    /// Name of the innermost named type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(t) => &t.name,
            Self::Object(t) => &t.name,
            Self::Interface(t) => &t.name,
            Self::InputObject(t) => &t.name,
            Self::NonNull(inner) | Self::List(inner) => inner.name(),
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(t) => t.description.as_deref(),
            Self::Object(t) => t.description.as_deref(),
            Self::Interface(t) => t.description.as_deref(),
            Self::InputObject(t) => t.description.as_deref(),
            Self::NonNull(_) | Self::List(_) => None,
        }
    }

    /// Strips every non-null and list wrapper.
    #[must_use]
    pub fn named_type(&self) -> &Self {
        match self {
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
            other => other,
        }
    }

    /// Strips a single non-null or list wrapper, if any.
    #[must_use]
    pub fn unwrap_once(self: &Arc<Self>) -> &Arc<Self> {
        match self.as_ref() {
            Self::NonNull(inner) | Self::List(inner) => inner,
            _ => self,
        }
    }

    #[must_use]
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Self::NonNull(_) | Self::List(_))
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            Self::Interface(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            Self::InputObject(t) => Some(t),
            _ => None,
        }
    }

    /// Fields of the innermost object, interface or input type.
    ///
    /// Scalars have no fields. The first call evaluates the lazy provider.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the field provider.
    pub fn fields(&self, builder: &TypeBuilder) -> Result<&[FieldDefinition]> {
        match self.named_type() {
            Self::Object(t) => t.fields.get(builder),
            Self::Interface(t) => t.fields.get(builder),
            Self::InputObject(t) => t.fields.get(builder),
            _ => Ok(&[]),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({self})", self.kind())
    }
}

/// A scalar type.
#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

/// An output object type.
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: LazyFields,
    /// Interfaces this type declares.
    pub interfaces: Vec<TypeHandle>,
    /// Resource class the type was built for, if any.
    pub resource_class: Option<String>,
}

impl ObjectType {
    /// Whether the type declares an interface named `name`.
    #[must_use]
    pub fn implements(&self, name: &str) -> bool {
        self.interfaces.iter().any(|i| i.name() == name)
    }
}

/// An interface type.
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: LazyFields,
    resolver: TypeResolver,
}

impl InterfaceType {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        fields: LazyFields,
        resolver: TypeResolver,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            fields,
            resolver,
        }
    }

    /// Resolves the concrete object type of a runtime payload.
    ///
    /// `return_type` is the declared type of the field being resolved.
    ///
    /// # Errors
    ///
    /// Depends on the interface: resource interfaces fail with
    /// `UnexpectedValue` when the payload cannot be mapped.
    pub fn resolve_type(
        &self,
        value: &Value,
        return_type: &TypeHandle,
        registry: &TypeRegistry,
    ) -> Result<Option<TypeHandle>> {
        (self.resolver)(value, return_type, registry)
    }
}

/// An input object type.
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: LazyFields,
}

/// A field of an object/interface type, an input field, or a field argument.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeHandle,
    pub description: Option<String>,
    pub args: Vec<FieldDefinition>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, arg: FieldDefinition) -> Self {
        self.args.push(arg);
        self
    }
}

/// Field list computed on first access and memoized afterwards.
pub struct LazyFields {
    provider: FieldsProvider,
    resolved: OnceLock<Vec<FieldDefinition>>,
}

impl LazyFields {
    pub fn new(
        provider: impl Fn(&TypeBuilder) -> Result<Vec<FieldDefinition>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            resolved: OnceLock::new(),
        }
    }

    /// Fields known at construction time.
    pub fn fixed(fields: Vec<FieldDefinition>) -> Self {
        Self {
            provider: Box::new(|_| Ok(Vec::new())),
            resolved: OnceLock::from(fields),
        }
    }

    /// Returns the fields, evaluating the provider on first access.
    ///
    /// A failing provider is not memoized.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the provider.
    pub fn get(&self, builder: &TypeBuilder) -> Result<&[FieldDefinition]> {
        if let Some(fields) = self.resolved.get() {
            return Ok(fields);
        }
        let fields = (self.provider)(builder)?;
        Ok(self.resolved.get_or_init(|| fields))
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for LazyFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFields")
            .field("resolved", &self.resolved.get().map(Vec::len))
            .finish_non_exhaustive()
    }
}

fn scalar(name: &str, description: Option<&str>) -> TypeHandle {
    Arc::new(SchemaType::Scalar(ScalarType {
        name: name.to_string(),
        description: description.map(str::to_string),
    }))
}

/// The `ID` scalar.
pub fn id() -> TypeHandle {
    scalar(ID, None)
}

/// The `String` scalar.
pub fn string() -> TypeHandle {
    scalar(STRING, None)
}

/// The `Int` scalar.
pub fn int() -> TypeHandle {
    scalar(INT, None)
}

/// The `Float` scalar.
pub fn float() -> TypeHandle {
    scalar(FLOAT, None)
}

/// The `Boolean` scalar.
pub fn boolean() -> TypeHandle {
    scalar(BOOLEAN, None)
}

/// The `Iterable` scalar.
pub fn iterable() -> TypeHandle {
    scalar(
        ITERABLE,
        Some("The `Iterable` scalar type represents an array or a Traversable with any kind of data."),
    )
}

/// Returns the built-in scalar named `name`, if any.
#[must_use]
pub fn builtin_scalar(name: &str) -> Option<TypeHandle> {
    match name {
        ID => Some(id()),
        STRING => Some(string()),
        INT => Some(int()),
        FLOAT => Some(float()),
        BOOLEAN => Some(boolean()),
        ITERABLE => Some(iterable()),
        _ => None,
    }
}

/// Wraps a type in a non-null modifier.
pub fn non_null(ty: TypeHandle) -> TypeHandle {
    Arc::new(SchemaType::NonNull(ty))
}

/// Wraps a type in a list modifier.
pub fn list_of(ty: TypeHandle) -> TypeHandle {
    Arc::new(SchemaType::List(ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wrapped_types() {
        let ty = non_null(list_of(non_null(string())));
        assert_eq!(ty.to_string(), "[String!]!");
        assert_eq!(ty.name(), STRING);
        assert!(ty.is_list());
        assert!(!string().is_list());
    }

    #[test]
    fn test_unwrap_once() {
        let inner = string();
        let wrapped = non_null(list_of(inner.clone()));
        assert_eq!(wrapped.unwrap_once().kind(), TypeKind::List);
        assert!(Arc::ptr_eq(wrapped.unwrap_once().unwrap_once(), &inner));
        assert!(Arc::ptr_eq(inner.unwrap_once(), &inner));
    }

    #[test]
    fn test_named_type_strips_all_wrappers() {
        let ty = list_of(non_null(int()));
        assert_eq!(ty.named_type().kind(), TypeKind::Scalar);
    }

    #[test]
    fn test_builtin_scalar_lookup() {
        assert_eq!(builtin_scalar("ID").unwrap().name(), "ID");
        assert_eq!(builtin_scalar("Iterable").unwrap().name(), "Iterable");
        assert!(builtin_scalar("Dummy").is_none());
    }

    #[test]
    fn test_field_definition_builder() {
        let field = FieldDefinition::new("dummy", id())
            .description("A dummy")
            .argument(FieldDefinition::new("id", non_null(id())));
        assert_eq!(field.description.as_deref(), Some("A dummy"));
        assert_eq!(field.args.len(), 1);
        assert_eq!(field.args[0].ty.to_string(), "ID!");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TypeKind::Object.to_string(), "ObjectType");
        assert_eq!(TypeKind::NonNull.to_string(), "NonNull");
    }
}
