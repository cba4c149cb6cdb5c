//! Slices of the insert payload, one per wizard step.
//!
//! Each step owns a disjoint set of top-level fields and validates only
//! those: a lenient form carries the rules, the typed slice is read once
//! the form passes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrorsKind};

use crate::enums::{Amenity, Governorate, PropertyTypeName};
use crate::error::ValidationErrors;
use crate::media::{MediaRef, MediaRefForm};
use crate::phone::normalize_phone;
use crate::property::{PurposeDetails, PurposeForm};
use crate::property_type::{PropertyType, PropertyTypeForm};
use crate::rules::{check, into_result, rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    PropertyType,
    BasicDetails,
    Location,
    PurposeAndPrice,
    Media,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::PropertyType,
        Step::BasicDetails,
        Step::Location,
        Step::PurposeAndPrice,
        Step::Media,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::PropertyType => "Property Type",
            Step::BasicDetails => "Basic Details",
            Step::Location => "Location",
            Step::PurposeAndPrice => "Purpose",
            Step::Media => "Images",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::PropertyType => "Select the type of property you are posting",
            Step::BasicDetails => "Provide basic information about your property listing",
            Step::Location => "Provide location information about your property listing",
            Step::PurposeAndPrice => "Select the purpose of your property listing",
            Step::Media => "Upload images of your property listing",
        }
    }

    /// Top-level payload fields this step is responsible for.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Step::PropertyType => &["propertyType"],
            Step::BasicDetails => &["title", "description", "ownerName", "ownerPhone"],
            Step::Location => &["governorate", "city", "area", "amenities"],
            Step::PurposeAndPrice => &["price", "purpose", "sellDetails", "rentDetails"],
            Step::Media => &["mediaData"],
        }
    }

    /// Validates only this step's slice of `input`.
    pub fn validate(self, input: &Value, context: &StepContext) -> Result<StepFragment, ValidationErrors> {
        if !input.is_object() {
            return Err(ValidationErrors::single("", "Expected an object"));
        }
        let mut errors = ValidationErrors::new();
        let fragment = match self {
            Step::PropertyType => PropertyTypeStep::check(input, &mut errors).map(StepFragment::PropertyType),
            Step::BasicDetails => BasicDetailsStep::check(input, &mut errors).map(StepFragment::BasicDetails),
            Step::Location => {
                LocationStep::check(input, context.property_type, &mut errors).map(StepFragment::Location)
            }
            Step::PurposeAndPrice => PurposeStep::check(input, &mut errors).map(StepFragment::PurposeAndPrice),
            Step::Media => MediaStep::check(input, &mut errors).map(StepFragment::Media),
        };
        errors.finish(fragment)
    }
}

/// What a step may know about earlier steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepContext {
    /// Chosen in the first step; narrows the amenities the location step accepts.
    pub property_type: Option<PropertyTypeName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeStep {
    pub property_type: PropertyType,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PropertyTypeStepForm {
    #[validate(required(message = "Property type is required"), nested)]
    property_type: Option<PropertyTypeForm>,
}

impl PropertyTypeStep {
    pub(crate) fn check(input: &Value, errors: &mut ValidationErrors) -> Option<Self> {
        check(input, errors, PropertyTypeStepForm::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDetailsStep {
    pub title: String,
    pub description: String,
    pub owner_name: String,
    /// E.164.
    pub owner_phone: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct BasicDetailsForm {
    #[validate(
        required(message = "Title is required"),
        custom(function = "crate::rules::not_blank", message = "Title is too short")
    )]
    title: Option<String>,
    #[validate(
        required(message = "Description is required"),
        custom(function = "crate::rules::not_blank", message = "Description is too short")
    )]
    description: Option<String>,
    #[validate(
        required(message = "Owner name is required"),
        custom(function = "crate::rules::not_blank", message = "Owner name is too short")
    )]
    owner_name: Option<String>,
    #[validate(
        required(message = "Phone number is required"),
        custom(function = "crate::rules::phone")
    )]
    owner_phone: Option<String>,
}

impl BasicDetailsStep {
    pub(crate) fn check(input: &Value, errors: &mut ValidationErrors) -> Option<Self> {
        let step: Self = check(input, errors, BasicDetailsForm::validate)?;
        let Some(owner_phone) = normalize_phone(&step.owner_phone) else {
            errors.push("ownerPhone", "Phone number is invalid");
            return None;
        };
        Some(BasicDetailsStep {
            title: step.title.trim().to_owned(),
            description: step.description.trim().to_owned(),
            owner_name: step.owner_name.trim().to_owned(),
            owner_phone,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStep {
    pub governorate: Governorate,
    pub city: String,
    pub area: f64,
    /// Absent means none.
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct LocationForm {
    #[validate(
        required(message = "Please select a governorate"),
        custom(function = "Governorate::check_wire")
    )]
    governorate: Option<String>,
    #[validate(
        required(message = "City is required"),
        custom(function = "crate::rules::not_blank", message = "City is too short")
    )]
    city: Option<String>,
    #[validate(
        required(message = "Area is required"),
        range(min = 10.0, message = "Area must be at least 10")
    )]
    area: Option<f64>,
    #[serde(default)]
    amenities: Vec<String>,
}

impl LocationForm {
    /// Field rules plus the amenity rule, which depends on the property type
    /// chosen earlier in the flow.
    fn validate_for(&self, property_type: Option<PropertyTypeName>) -> Result<(), validator::ValidationErrors> {
        let mut report = self.validate().err().unwrap_or_default();
        let items = amenity_errors(&self.amenities, property_type);
        if !items.is_empty() {
            report
                .errors_mut()
                .insert("amenities".into(), ValidationErrorsKind::List(items));
        }
        into_result(report)
    }
}

/// One struct-level failure per offending list item.
fn amenity_errors(
    values: &[String],
    property_type: Option<PropertyTypeName>,
) -> BTreeMap<usize, Box<validator::ValidationErrors>> {
    let mut items = BTreeMap::new();
    for (index, raw) in values.iter().enumerate() {
        let failure = match raw.parse::<Amenity>() {
            Err(_) => rule("unknown_variant", Amenity::INVALID_MESSAGE),
            Ok(amenity) => match property_type {
                Some(kind) if !Amenity::allowed_for(kind).contains(&amenity) => rule(
                    "amenity_not_allowed",
                    format!("{} is not available for {} listings", amenity.label(), kind.label()),
                ),
                _ => continue,
            },
        };
        let mut item = validator::ValidationErrors::new();
        item.add("__all__", failure);
        items.insert(index, Box::new(item));
    }
    items
}

impl LocationStep {
    pub(crate) fn check(
        input: &Value,
        property_type: Option<PropertyTypeName>,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let mut step: Self = check(input, errors, |form: &LocationForm| form.validate_for(property_type))?;
        let mut amenities = Vec::with_capacity(step.amenities.len());
        for amenity in step.amenities {
            if !amenities.contains(&amenity) {
                amenities.push(amenity);
            }
        }
        step.amenities = amenities;
        step.city = step.city.trim().to_owned();
        Some(step)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurposeStep {
    pub price: f64,
    #[serde(flatten)]
    pub purpose: PurposeDetails,
}

#[derive(Debug, Deserialize, Validate)]
struct PriceForm {
    #[validate(
        required(message = "Price is required"),
        range(exclusive_min = 0.0, message = "Price must be positive")
    )]
    price: Option<f64>,
}

impl PurposeStep {
    pub(crate) fn check(input: &Value, errors: &mut ValidationErrors) -> Option<Self> {
        let price = check::<PriceForm, PriceForm>(input, errors, PriceForm::validate);
        let purpose = check::<PurposeForm, PurposeDetails>(input, errors, PurposeForm::validate);
        Some(PurposeStep {
            price: price?.price?,
            purpose: purpose?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStep {
    pub media_data: Vec<MediaRef>,
}

/// Unvalidated `mediaData`: at least one item, no id twice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaStepForm {
    media_data: Option<Vec<MediaRefForm>>,
}

impl Validate for MediaStepForm {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        let mut report = validator::ValidationErrors::new();
        let items = match &self.media_data {
            None => {
                report.add("mediaData", rule("required", "Media is required"));
                return Err(report);
            }
            Some(items) if items.is_empty() => {
                report.add("mediaData", rule("length", "You must upload at least one image"));
                return Err(report);
            }
            Some(items) => items,
        };

        let mut failures = BTreeMap::new();
        let mut seen = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let mut item_report = item.validate().err().unwrap_or_default();
            if let Some(id) = item.id() {
                if seen.contains(&id) {
                    item_report.add("id", rule("duplicate", "Media is listed more than once"));
                } else {
                    seen.push(id);
                }
            }
            if !item_report.is_empty() {
                failures.insert(index, Box::new(item_report));
            }
        }
        if !failures.is_empty() {
            report
                .errors_mut()
                .insert("mediaData".into(), ValidationErrorsKind::List(failures));
        }
        into_result(report)
    }
}

impl MediaStep {
    pub(crate) fn check(input: &Value, errors: &mut ValidationErrors) -> Option<Self> {
        check(input, errors, MediaStepForm::validate)
    }
}

/// A validated step slice.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFragment {
    PropertyType(PropertyTypeStep),
    BasicDetails(BasicDetailsStep),
    Location(LocationStep),
    PurposeAndPrice(PurposeStep),
    Media(MediaStep),
}

impl StepFragment {
    pub fn step(&self) -> Step {
        match self {
            StepFragment::PropertyType(_) => Step::PropertyType,
            StepFragment::BasicDetails(_) => Step::BasicDetails,
            StepFragment::Location(_) => Step::Location,
            StepFragment::PurposeAndPrice(_) => Step::PurposeAndPrice,
            StepFragment::Media(_) => Step::Media,
        }
    }

    /// The fragment as the JSON object fields it contributes to the payload.
    pub fn to_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            StepFragment::PropertyType(f) => serde_json::to_value(f)?,
            StepFragment::BasicDetails(f) => serde_json::to_value(f)?,
            StepFragment::Location(f) => serde_json::to_value(f)?,
            StepFragment::PurposeAndPrice(f) => serde_json::to_value(f)?,
            StepFragment::Media(f) => serde_json::to_value(f)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "step fragment serialized to a non-object: {other}"
            ))),
        }
    }
}
