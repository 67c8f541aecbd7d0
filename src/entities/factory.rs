//! Entity factory: reconstructing a concrete entity from its raw DE
//! type code, form number, and main parameter vector.
//!
//! Grounded on `SPEC_FULL.md` §4.4 "Entity factory and base": a
//! dispatch table keyed by IGES entity type code, falling back to an
//! opaque [`UnsupportedEntity`] for any code the table doesn't carry
//! rather than failing the whole load.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::entities::curves::{
    CircularArc, CompositeCurve, ConicArc, CopiousData, CurveOnSurface, Line, NurbsCurve,
    ParametricSplineCurve,
};
use crate::entities::entity_base::Entity;
use crate::entities::parameter_vector::ParameterVector;
use crate::entities::surfaces::{NurbsSurface, RuledSurface, SurfaceOfRevolution, TabulatedCylinder};
use crate::entities::unsupported::UnsupportedEntity;
use crate::entities::{ColorDefinitionEntity, NullEntity, TransformationMatrix};
use crate::error::Result;
use crate::identity::ObjectID;

type Constructor = fn(ObjectID, &ParameterVector, i32) -> Result<Box<dyn Entity>>;

fn build_null(id: ObjectID, _params: &ParameterVector, _form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(NullEntity::new(id)))
}

fn build_circular_arc(id: ObjectID, params: &ParameterVector, _form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(CircularArc::from_parameters(id, params)?))
}

fn build_composite_curve(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(CompositeCurve::from_parameters(id, params, form)?))
}

fn build_conic_arc(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(ConicArc::from_parameters(id, params, form)?))
}

fn build_copious_data(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(CopiousData::from_parameters(id, params, form)?))
}

fn build_line(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(Line::from_parameters(id, params, form)?))
}

fn build_parametric_spline(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(ParametricSplineCurve::from_parameters(id, params, form)?))
}

fn build_ruled_surface(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(RuledSurface::from_parameters(id, params, form)?))
}

fn build_surface_of_revolution(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(SurfaceOfRevolution::from_parameters(id, params, form)?))
}

fn build_tabulated_cylinder(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(TabulatedCylinder::from_parameters(id, params, form)?))
}

fn build_transformation_matrix(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(TransformationMatrix::from_parameters(id, params, form)?))
}

fn build_nurbs_curve(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(NurbsCurve::from_parameters(id, params, form)?))
}

fn build_nurbs_surface(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(NurbsSurface::from_parameters(id, params, form)?))
}

fn build_curve_on_surface(id: ObjectID, params: &ParameterVector, form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(CurveOnSurface::from_parameters(id, params, form)?))
}

fn build_color_definition(id: ObjectID, params: &ParameterVector, _form: i32) -> Result<Box<dyn Entity>> {
    Ok(Box::new(ColorDefinitionEntity::from_parameters(id, params)?))
}

static CONSTRUCTORS: Lazy<HashMap<u16, Constructor>> = Lazy::new(|| {
    let mut table: HashMap<u16, Constructor> = HashMap::new();
    table.insert(0, build_null);
    table.insert(100, build_circular_arc);
    table.insert(102, build_composite_curve);
    table.insert(104, build_conic_arc);
    table.insert(106, build_copious_data);
    table.insert(110, build_line);
    table.insert(112, build_parametric_spline);
    table.insert(118, build_ruled_surface);
    table.insert(120, build_surface_of_revolution);
    table.insert(122, build_tabulated_cylinder);
    table.insert(124, build_transformation_matrix);
    table.insert(126, build_nurbs_curve);
    table.insert(128, build_nurbs_surface);
    table.insert(142, build_curve_on_surface);
    table.insert(314, build_color_definition);
    table
});

/// Construct a concrete entity from its raw DE type code, form
/// number, and main parameter vector, falling back to an opaque
/// [`UnsupportedEntity`] when `entity_type` names no known kind.
pub fn build_entity(
    id: ObjectID,
    entity_type: u16,
    form_number: i32,
    params: &ParameterVector,
) -> Result<Box<dyn Entity>> {
    match CONSTRUCTORS.get(&entity_type) {
        Some(constructor) => constructor(id, params, form_number),
        None => Ok(Box::new(UnsupportedEntity::new(
            id,
            entity_type,
            form_number,
            params.clone(),
        ))),
    }
}

/// Whether `entity_type` has a first-class constructor (as opposed to
/// falling back to [`UnsupportedEntity`]).
pub fn is_supported(entity_type: u16) -> bool {
    CONSTRUCTORS.contains_key(&entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::parameter_vector::Parameter;
    use crate::identity::{IdGenerator, ObjectKind};

    #[test]
    fn unknown_entity_type_falls_back_to_unsupported() {
        let (id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 9999).unwrap();
        let params = ParameterVector::from_values([Parameter::Real(1.0)]);
        let entity = build_entity(id, 9999, 0, &params).unwrap();
        assert_eq!(entity.base().kind(), crate::entities::EntityKind::Unsupported);
        assert!(!is_supported(9999));
    }

    #[test]
    fn null_entity_type_is_supported() {
        assert!(is_supported(0));
        assert!(is_supported(110));
        assert!(is_supported(124));
    }

    #[test]
    fn line_builds_through_the_factory() {
        let (id, _) = IdGenerator::generate_entity(ObjectKind::EntityNew, 110).unwrap();
        let params = ParameterVector::from_values([
            Parameter::Real(0.0),
            Parameter::Real(0.0),
            Parameter::Real(0.0),
            Parameter::Real(1.0),
            Parameter::Real(0.0),
            Parameter::Real(0.0),
        ]);
        let entity = build_entity(id, 110, 0, &params).unwrap();
        assert_eq!(entity.base().kind(), crate::entities::EntityKind::Line);
    }
}
