use crate::domain::{CollectionDefinition, DomainError, FilterExpr};

/// Renders a [`FilterExpr`] in a store's native filter syntax.
pub trait FilterTranslator {
    type Output;

    fn translate(
        &self,
        filter: &FilterExpr,
        definition: &CollectionDefinition,
    ) -> Result<Self::Output, DomainError>;
}
