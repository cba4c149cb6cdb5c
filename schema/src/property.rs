use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::enums::{Amenity, Governorate, PaymentMethod, PropertyPurpose, PropertyTypeName, RentFrequency};
use crate::error::ValidationErrors;
use crate::media::{Media, MediaRef};
use crate::property_type::PropertyType;
use crate::rules::{into_result, nest, rule};
use crate::steps::{BasicDetailsStep, LocationStep, MediaStep, PropertyTypeStep, PurposeStep};

/// Sale terms, tagged by `paymentMethod`. Cash carries no down payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "paymentMethod", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellDetails {
    Cash,
    #[serde(rename_all = "camelCase")]
    Installment { down_payment: f64 },
    #[serde(rename_all = "camelCase")]
    Both { down_payment: f64 },
}

impl SellDetails {
    pub fn payment_method(&self) -> PaymentMethod {
        match self {
            SellDetails::Cash => PaymentMethod::Cash,
            SellDetails::Installment { .. } => PaymentMethod::Installment,
            SellDetails::Both { .. } => PaymentMethod::Both,
        }
    }

    pub fn down_payment(&self) -> Option<f64> {
        match self {
            SellDetails::Cash => None,
            SellDetails::Installment { down_payment } | SellDetails::Both { down_payment } => {
                Some(*down_payment)
            }
        }
    }

    /// Rebuilds the union from its stored columns.
    pub fn from_parts(method: PaymentMethod, down_payment: Option<f64>) -> Option<Self> {
        match (method, down_payment) {
            (PaymentMethod::Cash, _) => Some(SellDetails::Cash),
            (PaymentMethod::Installment, Some(down_payment)) => {
                Some(SellDetails::Installment { down_payment })
            }
            (PaymentMethod::Both, Some(down_payment)) => Some(SellDetails::Both { down_payment }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentDetails {
    pub rent_frequency: RentFrequency,
    pub deposit: f64,
    pub insurance: f64,
}

/// Purpose union, tagged by `purpose`, flattened into its parent object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurposeDetails {
    #[serde(rename_all = "camelCase")]
    Sell { sell_details: SellDetails },
    #[serde(rename_all = "camelCase")]
    Rent { rent_details: RentDetails },
}

impl PurposeDetails {
    pub fn purpose(&self) -> PropertyPurpose {
        match self {
            PurposeDetails::Sell { .. } => PropertyPurpose::Sell,
            PurposeDetails::Rent { .. } => PropertyPurpose::Rent,
        }
    }
}

/// Unvalidated `sellDetails`. The down payment only matters for
/// installment plans.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SellForm {
    payment_method: Option<String>,
    down_payment: Option<f64>,
}

impl Validate for SellForm {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        let mut report = validator::ValidationErrors::new();
        match self.payment_method.as_deref().map(str::parse::<PaymentMethod>) {
            Some(Ok(PaymentMethod::Cash)) => {}
            Some(Ok(PaymentMethod::Installment | PaymentMethod::Both)) => match self.down_payment {
                None => report.add("downPayment", rule("required", "Down payment is required")),
                Some(amount) if amount <= 0.0 => {
                    report.add("downPayment", rule("range", "Down payment must be positive"))
                }
                Some(_) => {}
            },
            _ => report.add("paymentMethod", rule("unknown_variant", PaymentMethod::INVALID_MESSAGE)),
        }
        into_result(report)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RentForm {
    #[validate(
        required(message = "Please select a rent frequency"),
        custom(function = "RentFrequency::check_wire")
    )]
    rent_frequency: Option<String>,
    #[validate(
        required(message = "Deposit is required"),
        range(exclusive_min = 0.0, message = "Deposit must be positive")
    )]
    deposit: Option<f64>,
    #[validate(
        required(message = "Insurance is required"),
        range(exclusive_min = 0.0, message = "Insurance must be positive")
    )]
    insurance: Option<f64>,
}

/// Unvalidated purpose union, read from the fields it shares with its parent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PurposeForm {
    purpose: Option<String>,
    sell_details: Option<SellForm>,
    rent_details: Option<RentForm>,
}

impl Validate for PurposeForm {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        let mut report = validator::ValidationErrors::new();
        let mismatch = || rule("details_mismatch", "Details do not match the selected purpose");
        let missing = "Purpose details is required";
        match self.purpose.as_deref().map(str::parse::<PropertyPurpose>) {
            Some(Ok(PropertyPurpose::Sell)) => {
                if self.rent_details.is_some() {
                    report.add("rentDetails", mismatch());
                }
                nest(&mut report, "sellDetails", self.sell_details.as_ref(), missing);
            }
            Some(Ok(PropertyPurpose::Rent)) => {
                if self.sell_details.is_some() {
                    report.add("sellDetails", mismatch());
                }
                nest(&mut report, "rentDetails", self.rent_details.as_ref(), missing);
            }
            _ => report.add("purpose", rule("unknown_variant", PropertyPurpose::INVALID_MESSAGE)),
        }
        into_result(report)
    }
}

/// Everything a client supplies to create a listing. Server-assigned
/// fields (id, slug, owner, timestamps) are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInsert {
    pub property_type: PropertyType,
    pub title: String,
    pub description: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub governorate: Governorate,
    pub city: String,
    pub area: f64,
    pub amenities: Vec<Amenity>,
    pub price: f64,
    #[serde(flatten)]
    pub purpose: PurposeDetails,
    pub media_data: Vec<MediaRef>,
}

impl PropertyInsert {
    /// Validates a complete insert payload, reporting every failing field.
    /// Each step validates its own slice, so a payload merged from valid
    /// wizard fragments validates exactly like one submitted whole.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        if !value.is_object() {
            return Err(ValidationErrors::single("", "Expected an object"));
        }
        let mut errors = ValidationErrors::new();
        let property_type = PropertyTypeStep::check(value, &mut errors);
        let basic = BasicDetailsStep::check(value, &mut errors);
        let type_name = property_type.as_ref().map(|p| p.property_type.name());
        let location = LocationStep::check(value, type_name, &mut errors);
        let purpose = PurposeStep::check(value, &mut errors);
        let media = MediaStep::check(value, &mut errors);
        let assembled = match (property_type, basic, location, purpose, media) {
            (Some(property_type), Some(basic), Some(location), Some(purpose), Some(media)) => {
                Some(Self::assemble(property_type, basic, location, purpose, media))
            }
            _ => None,
        };
        errors.finish(assembled)
    }

    pub fn assemble(
        property_type: PropertyTypeStep,
        basic: BasicDetailsStep,
        location: LocationStep,
        purpose: PurposeStep,
        media: MediaStep,
    ) -> Self {
        PropertyInsert {
            property_type: property_type.property_type,
            title: basic.title,
            description: basic.description,
            owner_name: basic.owner_name,
            owner_phone: basic.owner_phone,
            governorate: location.governorate,
            city: location.city,
            area: location.area,
            amenities: location.amenities,
            price: purpose.price,
            purpose: purpose.purpose,
            media_data: media.media_data,
        }
    }

    pub fn property_type_name(&self) -> PropertyTypeName {
        self.property_type.name()
    }
}

/// Public fields of a listing's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The full aggregate returned by `GET /properties/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub slug: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_phone: String,
    pub property_type: PropertyType,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub governorate: Governorate,
    pub city: String,
    pub area: f64,
    pub amenities: Vec<Amenity>,
    #[serde(flatten)]
    pub purpose: PurposeDetails,
    pub media: Vec<Media>,
    pub user: OwnerProfile,
}

/// `propertyType` as it appears in list rows: the tag without details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeRef {
    pub name: PropertyTypeName,
}

/// A list row. Carries the primary media item only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: i64,
    pub slug: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_name: String,
    pub owner_phone: String,
    pub property_type: PropertyTypeRef,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub governorate: Governorate,
    pub city: String,
    pub area: f64,
    pub amenities: Vec<Amenity>,
    #[serde(flatten)]
    pub purpose: PurposeDetails,
    pub primary_media: Option<Media>,
}

/// One page of a cursor-paginated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page {
            data: Vec::new(),
            next_cursor: None,
        }
    }
}
