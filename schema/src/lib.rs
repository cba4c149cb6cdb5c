//! Property listing domain schema: the enum registry, entity shapes and the
//! validators shared by the server and the listing wizard.

pub mod enums;
pub mod error;
pub mod media;
pub mod phone;
pub mod property;
pub mod property_type;
pub mod query;
mod rules;
pub mod slug;
pub mod steps;

pub use enums::{
    Amenity, ApartmentSubtype, CommercialSubtype, Governorate, LandSubtype, PaymentMethod,
    PropertyPurpose, PropertyTypeName, RentFrequency, UnknownVariant, VillaSubtype,
};
pub use error::{FieldError, ValidationErrors};
pub use media::{Media, MediaCreated, MediaInsert, MediaRef, PresignedUrlRequest, PresignedUrlResponse};
pub use property::{
    OwnerProfile, Page, Property, PropertyInsert, PropertySummary, PropertyTypeRef, PurposeDetails,
    RentDetails, SellDetails,
};
pub use property_type::{ApartmentDetails, CommercialDetails, LandDetails, PropertyType, VillaDetails};
pub use query::{PageRequest, PropertyFilters, QueryPairs};
pub use steps::{
    BasicDetailsStep, LocationStep, MediaStep, PropertyTypeStep, PurposeStep, Step, StepContext,
    StepFragment,
};
