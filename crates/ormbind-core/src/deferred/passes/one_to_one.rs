//! Inverse one-to-one binding.

use crate::error::{BindError, Failure};
use crate::model::Value;
use crate::registry::Registry;

use super::super::unit::ValuePath;

/// Links an inverse one-to-one to the owning to-one on the target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseOneToOnePass {
    /// Location of the inverse to-one value.
    pub value: ValuePath,
    /// Target entity.
    pub target: String,
    /// Owning property on the target.
    pub mapped_by: String,
}

impl InverseOneToOnePass {
    /// Bind the inverse side once the owning side has its columns.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let path = self.value.display();
        let unknown = || BindError::UnknownMappedBy {
            path: path.clone(),
            target: self.target.clone(),
            property: self.mapped_by.clone(),
        };
        registry.require_entity(&self.target, &path)?;
        let (_, owning) = registry
            .find_property(&self.target, &self.mapped_by)
            .ok_or_else(unknown)?;
        let Value::ToOne(owning) = &owning.value else {
            return Err(unknown().into());
        };
        if !owning.resolved {
            return Err(Failure::Recoverable(BindError::MappedByPending {
                path: path.clone(),
                target: self.target.clone(),
                property: self.mapped_by.clone(),
            }));
        }

        match registry
            .entity_mut(&self.value.entity)
            .and_then(|e| e.value_mut(self.value.in_identifier, &self.value.path))
        {
            Some(Value::ToOne(inverse)) => {
                inverse.resolved = true;
                Ok(())
            }
            _ => Err(BindError::Internal {
                path,
                message: "inverse one-to-one value not bound".to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::MetadataCompiler;
    use crate::error::BindError;
    use crate::model::Value;
    use crate::source::{
        AssociationSpec, ClassDescriptor, IdentifierSpec, MappingSource, PropertySpec,
    };

    fn id() -> IdentifierSpec {
        IdentifierSpec::simple(PropertySpec::basic("id", "long"))
    }

    fn person(owner: &str) -> ClassDescriptor {
        ClassDescriptor::entity("Person").with_identifier(id()).with_property(
            PropertySpec::one_to_one(
                "passport",
                AssociationSpec::to("Passport").mapped_by(owner),
            ),
        )
    }

    #[test]
    fn test_inverse_side_resolved_after_owner() {
        let source = MappingSource::new().with_class(person("owner")).with_class(
            ClassDescriptor::entity("Passport")
                .with_identifier(id())
                .with_property(PropertySpec::one_to_one("owner", AssociationSpec::to("Person"))),
        );
        let model = MetadataCompiler::default().compile(&source).unwrap();

        let passport = model.entity("Person").unwrap().property("passport").unwrap();
        let Value::ToOne(inverse) = &passport.value else {
            panic!("expected a to-one value");
        };
        assert!(inverse.resolved);
        assert!(inverse.columns.is_empty());
        assert!(!model.entity_table("Person").unwrap().has_column("passport_id"));
        assert!(model.entity_table("Passport").unwrap().has_column("owner_id"));
    }

    #[test]
    fn test_unknown_owning_property() {
        let source = MappingSource::new()
            .with_class(person("holder"))
            .with_class(ClassDescriptor::entity("Passport").with_identifier(id()));
        let err = MetadataCompiler::default().compile(&source).unwrap_err();
        assert!(matches!(err, BindError::UnknownMappedBy { .. }));
    }
}
