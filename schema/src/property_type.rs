use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::enums::{ApartmentSubtype, CommercialSubtype, LandSubtype, PropertyTypeName, VillaSubtype};
use crate::rules::{into_result, nest, rule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentDetails {
    pub subtype: ApartmentSubtype,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaDetails {
    pub subtype: VillaSubtype,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommercialDetails {
    pub subtype: CommercialSubtype,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandDetails {
    pub subtype: LandSubtype,
}

/// The property variant, tagged by `name`; carries exactly the details record
/// that belongs to that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    #[serde(rename_all = "camelCase")]
    Apartment { apartment_details: ApartmentDetails },
    #[serde(rename_all = "camelCase")]
    Villa { villa_details: VillaDetails },
    #[serde(rename_all = "camelCase")]
    Commercial { commercial_details: CommercialDetails },
    #[serde(rename_all = "camelCase")]
    Land { land_details: LandDetails },
}

/// Key under which each variant keeps its details record.
pub fn details_key(name: PropertyTypeName) -> &'static str {
    match name {
        PropertyTypeName::Apartment => "apartmentDetails",
        PropertyTypeName::Villa => "villaDetails",
        PropertyTypeName::Commercial => "commercialDetails",
        PropertyTypeName::Land => "landDetails",
    }
}

impl PropertyType {
    pub fn name(&self) -> PropertyTypeName {
        match self {
            PropertyType::Apartment { .. } => PropertyTypeName::Apartment,
            PropertyType::Villa { .. } => PropertyTypeName::Villa,
            PropertyType::Commercial { .. } => PropertyTypeName::Commercial,
            PropertyType::Land { .. } => PropertyTypeName::Land,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApartmentForm {
    #[validate(
        required(message = "Please select an apartment subtype"),
        custom(function = "ApartmentSubtype::check_wire")
    )]
    subtype: Option<String>,
    #[validate(
        required(message = "Number of bedrooms is required"),
        range(min = 1, message = "Number of bedrooms must be positive")
    )]
    bedrooms: Option<i32>,
    #[validate(
        required(message = "Number of bathrooms is required"),
        range(min = 1, message = "Number of bathrooms must be positive")
    )]
    bathrooms: Option<i32>,
    #[validate(required(message = "Furnished is required"))]
    furnished: Option<bool>,
    #[validate(range(min = 1, message = "Level must be positive"))]
    level: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VillaForm {
    #[validate(
        required(message = "Please select a villa subtype"),
        custom(function = "VillaSubtype::check_wire")
    )]
    subtype: Option<String>,
    #[validate(
        required(message = "Bedrooms is required"),
        range(min = 1, message = "Bedrooms must be positive")
    )]
    bedrooms: Option<i32>,
    #[validate(
        required(message = "Bathrooms is required"),
        range(min = 1, message = "Bathrooms must be positive")
    )]
    bathrooms: Option<i32>,
    #[validate(required(message = "Furnished is required"))]
    furnished: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct CommercialForm {
    #[validate(
        required(message = "Please select a commercial subtype"),
        custom(function = "CommercialSubtype::check_wire")
    )]
    subtype: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct LandForm {
    #[validate(
        required(message = "Please select a land subtype"),
        custom(function = "LandSubtype::check_wire")
    )]
    subtype: Option<String>,
}

/// Unvalidated `propertyType`. Only the details record named by `name` may
/// be present.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PropertyTypeForm {
    name: Option<String>,
    apartment_details: Option<ApartmentForm>,
    villa_details: Option<VillaForm>,
    commercial_details: Option<CommercialForm>,
    land_details: Option<LandForm>,
}

impl Validate for PropertyTypeForm {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        let mut report = validator::ValidationErrors::new();
        let Some(name) = self.name.as_deref().and_then(|n| n.parse::<PropertyTypeName>().ok()) else {
            report.add("name", rule("unknown_variant", PropertyTypeName::INVALID_MESSAGE));
            return Err(report);
        };

        let present = [
            (PropertyTypeName::Apartment, self.apartment_details.is_some()),
            (PropertyTypeName::Villa, self.villa_details.is_some()),
            (PropertyTypeName::Commercial, self.commercial_details.is_some()),
            (PropertyTypeName::Land, self.land_details.is_some()),
        ];
        for (other, _) in present.iter().filter(|(n, here)| *n != name && *here) {
            report.add(
                details_key(*other),
                rule("details_mismatch", "Details do not match the selected property type"),
            );
        }

        let key = details_key(name);
        let missing = "Property details is required";
        match name {
            PropertyTypeName::Apartment => nest(&mut report, key, self.apartment_details.as_ref(), missing),
            PropertyTypeName::Villa => nest(&mut report, key, self.villa_details.as_ref(), missing),
            PropertyTypeName::Commercial => nest(&mut report, key, self.commercial_details.as_ref(), missing),
            PropertyTypeName::Land => nest(&mut report, key, self.land_details.as_ref(), missing),
        }
        into_result(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrors;
    use crate::rules::check;
    use serde_json::json;

    fn read(value: serde_json::Value) -> Result<PropertyType, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let parsed = check::<PropertyTypeForm, PropertyType>(&value, &mut errors, Validate::validate);
        errors.finish(parsed)
    }

    #[test]
    fn apartment_without_level() {
        let parsed = read(json!({
            "name": "APARTMENT",
            "apartmentDetails": { "subtype": "DUPLEX", "bedrooms": 3, "bathrooms": 2, "furnished": false }
        }))
        .unwrap();
        assert_eq!(parsed.name(), PropertyTypeName::Apartment);
        let PropertyType::Apartment { apartment_details } = parsed else {
            panic!("expected apartment");
        };
        assert_eq!(apartment_details.level, None);
    }

    #[test]
    fn foreign_details_are_rejected() {
        let errors = read(json!({
            "name": "LAND",
            "landDetails": { "subtype": "ANY" },
            "villaDetails": { "subtype": "TOWN_HOUSE", "bedrooms": 1, "bathrooms": 1, "furnished": true }
        }))
        .unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["villaDetails"]);
    }

    #[test]
    fn collects_every_bad_detail_field() {
        let errors = read(json!({
            "name": "VILLA",
            "villaDetails": { "subtype": "CASTLE", "bedrooms": 0, "bathrooms": -1 }
        }))
        .unwrap_err();
        let paths: Vec<_> = errors.paths().collect();
        assert_eq!(
            paths,
            vec![
                "villaDetails.bathrooms",
                "villaDetails.bedrooms",
                "villaDetails.furnished",
                "villaDetails.subtype"
            ]
        );
    }

    #[test]
    fn unknown_name_stops_at_the_tag() {
        let errors = read(json!({ "name": "CASTLE", "landDetails": { "subtype": "ANY" } })).unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(errors.errors[0].message, "Please select a property type");
    }

    #[test]
    fn fractional_count_is_a_shape_error() {
        let errors = read(json!({
            "name": "VILLA",
            "villaDetails": { "subtype": "TOWN_HOUSE", "bedrooms": 1.5, "bathrooms": 1, "furnished": true }
        }))
        .unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn serializes_with_name_tag() {
        let value = serde_json::to_value(PropertyType::Commercial {
            commercial_details: CommercialDetails {
                subtype: CommercialSubtype::Clinic,
            },
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "name": "COMMERCIAL", "commercialDetails": { "subtype": "CLINIC" } })
        );
    }
}
