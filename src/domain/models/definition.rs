use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Key,
    Data,
    Vector,
}

/// Property types a field can hold, independent of any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    DateTime,
    Json,
    Bytes,
    List(Box<PropertyType>),
}

impl PropertyType {
    pub fn list_of(inner: PropertyType) -> Self {
        PropertyType::List(Box::new(inner))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, PropertyType::List(_))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::String => write!(f, "str"),
            PropertyType::Int => write!(f, "int"),
            PropertyType::Float => write!(f, "float"),
            PropertyType::Bool => write!(f, "bool"),
            PropertyType::DateTime => write!(f, "datetime"),
            PropertyType::Json => write!(f, "dict"),
            PropertyType::Bytes => write!(f, "bytes"),
            PropertyType::List(inner) => write!(f, "list[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFunction {
    CosineSimilarity,
    CosineDistance,
    DotProduct,
    EuclideanDistance,
    EuclideanSquaredDistance,
    Manhattan,
    Hamming,
    #[default]
    Default,
}

impl DistanceFunction {
    /// Whether a larger score means a closer match.
    pub fn higher_is_closer(&self) -> bool {
        matches!(
            self,
            DistanceFunction::CosineSimilarity | DistanceFunction::DotProduct
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceFunction::CosineSimilarity => "cosine_similarity",
            DistanceFunction::CosineDistance => "cosine_distance",
            DistanceFunction::DotProduct => "dot_prod",
            DistanceFunction::EuclideanDistance => "euclidean_distance",
            DistanceFunction::EuclideanSquaredDistance => "euclidean_squared_distance",
            DistanceFunction::Manhattan => "manhattan",
            DistanceFunction::Hamming => "hamming",
            DistanceFunction::Default => "default",
        }
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Hnsw,
    Flat,
    IvfFlat,
    DiskAnn,
    QuantizedFlat,
    Dynamic,
    #[default]
    Default,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Hnsw => "hnsw",
            IndexKind::Flat => "flat",
            IndexKind::IvfFlat => "ivf_flat",
            IndexKind::DiskAnn => "disk_ann",
            IndexKind::QuantizedFlat => "quantized_flat",
            IndexKind::Dynamic => "dynamic",
            IndexKind::Default => "default",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field of a collection: the key, a data property or a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreField {
    kind: FieldKind,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_name: Option<String>,
    #[serde(default, rename = "type")]
    property_type: PropertyType,
    #[serde(default)]
    is_indexed: bool,
    #[serde(default)]
    is_full_text_indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    #[serde(default)]
    index_kind: IndexKind,
    #[serde(default)]
    distance_function: DistanceFunction,
}

impl VectorStoreField {
    pub fn key(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(FieldKind::Key, name, property_type)
    }

    pub fn data(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self::new(FieldKind::Data, name, property_type)
    }

    pub fn vector(name: impl Into<String>, dimensions: usize) -> Self {
        let mut field = Self::new(FieldKind::Vector, name, PropertyType::Float);
        field.dimensions = Some(dimensions);
        field
    }

    fn new(kind: FieldKind, name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            kind,
            name: name.into(),
            storage_name: None,
            property_type,
            is_indexed: false,
            is_full_text_indexed: false,
            dimensions: None,
            index_kind: IndexKind::Default,
            distance_function: DistanceFunction::Default,
        }
    }

    pub fn with_storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    pub fn full_text_indexed(mut self) -> Self {
        self.is_full_text_indexed = true;
        self
    }

    pub fn with_index_kind(mut self, index_kind: IndexKind) -> Self {
        self.index_kind = index_kind;
        self
    }

    pub fn with_distance_function(mut self, distance_function: DistanceFunction) -> Self {
        self.distance_function = distance_function;
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in the backing store; falls back to the field name.
    pub fn storage_name(&self) -> &str {
        self.storage_name.as_deref().unwrap_or(&self.name)
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn is_indexed(&self) -> bool {
        self.is_indexed
    }

    pub fn is_full_text_indexed(&self) -> bool {
        self.is_full_text_indexed
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index_kind
    }

    pub fn distance_function(&self) -> DistanceFunction {
        self.distance_function
    }

    pub fn is_key(&self) -> bool {
        self.kind == FieldKind::Key
    }

    pub fn is_data(&self) -> bool {
        self.kind == FieldKind::Data
    }

    pub fn is_vector(&self) -> bool {
        self.kind == FieldKind::Vector
    }
}

/// The schema of a collection. Construct through [`CollectionDefinition::new`],
/// which validates the field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDefinition", into = "RawDefinition")]
pub struct CollectionDefinition {
    fields: Vec<VectorStoreField>,
}

#[derive(Serialize, Deserialize)]
struct RawDefinition {
    fields: Vec<VectorStoreField>,
}

impl TryFrom<RawDefinition> for CollectionDefinition {
    type Error = DomainError;

    fn try_from(raw: RawDefinition) -> Result<Self, Self::Error> {
        CollectionDefinition::new(raw.fields)
    }
}

impl From<CollectionDefinition> for RawDefinition {
    fn from(definition: CollectionDefinition) -> Self {
        RawDefinition {
            fields: definition.fields,
        }
    }
}

impl CollectionDefinition {
    pub fn new(fields: Vec<VectorStoreField>) -> Result<Self, DomainError> {
        let key_count = fields.iter().filter(|f| f.is_key()).count();
        if key_count != 1 {
            return Err(DomainError::invalid_model(format!(
                "exactly one key field is required, found {key_count}"
            )));
        }

        let mut names = HashSet::new();
        let mut storage_names = HashSet::new();
        for field in &fields {
            if field.name().is_empty() {
                return Err(DomainError::invalid_model("field names cannot be empty"));
            }
            if !names.insert(field.name()) {
                return Err(DomainError::invalid_model(format!(
                    "duplicate field name '{}'",
                    field.name()
                )));
            }
            if !storage_names.insert(field.storage_name()) {
                return Err(DomainError::invalid_model(format!(
                    "duplicate storage name '{}'",
                    field.storage_name()
                )));
            }
            match field.kind() {
                FieldKind::Key => {
                    if !matches!(field.property_type(), PropertyType::String | PropertyType::Int) {
                        return Err(DomainError::invalid_model(format!(
                            "key field '{}' must be a string or an int, not {}",
                            field.name(),
                            field.property_type()
                        )));
                    }
                }
                FieldKind::Vector => match field.dimensions() {
                    Some(d) if d > 0 => {}
                    _ => {
                        return Err(DomainError::invalid_model(format!(
                            "vector field '{}' must specify dimensions greater than zero",
                            field.name()
                        )))
                    }
                },
                FieldKind::Data => {}
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[VectorStoreField] {
        &self.fields
    }

    pub fn key_field(&self) -> &VectorStoreField {
        // Validated in `new`: exactly one key exists.
        self.fields
            .iter()
            .find(|f| f.is_key())
            .unwrap_or(&self.fields[0])
    }

    pub fn data_fields(&self) -> impl Iterator<Item = &VectorStoreField> {
        self.fields.iter().filter(|f| f.is_data())
    }

    pub fn vector_fields(&self) -> impl Iterator<Item = &VectorStoreField> {
        self.fields.iter().filter(|f| f.is_vector())
    }

    pub fn vector_field_count(&self) -> usize {
        self.vector_fields().count()
    }

    pub fn storage_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.storage_name()).collect()
    }

    /// Resolve a field by its name first, then by its storage name.
    pub fn field(&self, name: &str) -> Option<&VectorStoreField> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .or_else(|| self.fields.iter().find(|f| f.storage_name() == name))
    }

    pub fn field_by_storage_name(&self, storage_name: &str) -> Option<&VectorStoreField> {
        self.fields.iter().find(|f| f.storage_name() == storage_name)
    }

    /// Returns the requested vector field, or the first one when no name is given.
    pub fn try_get_vector_field(
        &self,
        name: Option<&str>,
    ) -> Result<Option<&VectorStoreField>, DomainError> {
        match name {
            None => Ok(self.vector_fields().next()),
            Some(name) => match self.field(name) {
                Some(field) if field.is_vector() => Ok(Some(field)),
                Some(field) => Err(DomainError::invalid_model(format!(
                    "field '{}' is not a vector field",
                    field.name()
                ))),
                None => Err(DomainError::UnknownField(name.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel_fields() -> Vec<VectorStoreField> {
        vec![
            VectorStoreField::key("hotel_id", PropertyType::String),
            VectorStoreField::data("hotel_name", PropertyType::String)
                .with_storage_name("HotelName")
                .indexed(),
            VectorStoreField::data("rating", PropertyType::Float),
            VectorStoreField::vector("embedding", 4)
                .with_distance_function(DistanceFunction::CosineDistance),
        ]
    }

    #[test]
    fn definition_requires_exactly_one_key() {
        let fields = vec![VectorStoreField::data("a", PropertyType::String)];
        assert!(CollectionDefinition::new(fields).is_err());

        let fields = vec![
            VectorStoreField::key("a", PropertyType::String),
            VectorStoreField::key("b", PropertyType::String),
        ];
        assert!(CollectionDefinition::new(fields).is_err());
    }

    #[test]
    fn definition_rejects_duplicate_storage_names() {
        let fields = vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::data("a", PropertyType::String).with_storage_name("x"),
            VectorStoreField::data("b", PropertyType::String).with_storage_name("x"),
        ];
        let err = CollectionDefinition::new(fields).unwrap_err();
        assert!(err.to_string().contains("duplicate storage name"));
    }

    #[test]
    fn definition_rejects_zero_dimension_vectors() {
        let fields = vec![
            VectorStoreField::key("id", PropertyType::String),
            VectorStoreField::vector("v", 0),
        ];
        assert!(CollectionDefinition::new(fields).is_err());
    }

    #[test]
    fn field_lookup_accepts_name_or_storage_name() {
        let definition = CollectionDefinition::new(hotel_fields()).unwrap();
        assert_eq!(definition.field("hotel_name").unwrap().storage_name(), "HotelName");
        assert_eq!(definition.field("HotelName").unwrap().name(), "hotel_name");
        assert!(definition.field("missing").is_none());
    }

    #[test]
    fn try_get_vector_field_defaults_to_first_vector() {
        let definition = CollectionDefinition::new(hotel_fields()).unwrap();
        let field = definition.try_get_vector_field(None).unwrap().unwrap();
        assert_eq!(field.name(), "embedding");
        assert!(definition.try_get_vector_field(Some("rating")).is_err());
        assert!(definition.try_get_vector_field(Some("nope")).is_err());
    }

    #[test]
    fn definition_deserializes_and_validates() {
        let json = r#"{
            "fields": [
                {"kind": "key", "name": "id"},
                {"kind": "data", "name": "tags", "type": {"list": "string"}},
                {"kind": "vector", "name": "v", "dimensions": 3, "distance_function": "dot_product"}
            ]
        }"#;
        let definition: CollectionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.fields().len(), 3);
        assert_eq!(
            definition.field("tags").unwrap().property_type(),
            &PropertyType::list_of(PropertyType::String)
        );

        let invalid = r#"{"fields": [{"kind": "data", "name": "x"}]}"#;
        assert!(serde_json::from_str::<CollectionDefinition>(invalid).is_err());
    }
}
