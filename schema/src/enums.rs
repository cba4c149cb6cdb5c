//! Enum registry shared by the validators, the storage layer and clients.
//!
//! Every enum serializes to its wire value (`SCREAMING_SNAKE_CASE`) and the
//! storage layer persists exactly that string, so there is one definition to
//! keep in sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned by `FromStr` when a string is not one of an enum's wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! registry_enum {
    (
        $(#[$meta:meta])*
        $name:ident, invalid = $invalid:literal {
            $($variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Message reported when a payload carries a value outside this enum.
            pub const INVALID_MESSAGE: &'static str = $invalid;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// `#[validate(custom)]` rule for a raw wire value.
            pub fn check_wire(value: &str) -> Result<(), validator::ValidationError> {
                value
                    .parse::<$name>()
                    .map(|_| ())
                    .map_err(|_| crate::rules::rule("unknown_variant", $invalid))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

registry_enum! {
    /// Discriminator of the property type union.
    PropertyTypeName, invalid = "Please select a property type" {
        Apartment => ("APARTMENT", "Apartment"),
        Villa => ("VILLA", "Villa"),
        Commercial => ("COMMERCIAL", "Commercial"),
        Land => ("LAND", "Land"),
    }
}

registry_enum! {
    ApartmentSubtype, invalid = "Please select an apartment subtype" {
        Apartment => ("APARTMENT", "Classic Apartment"),
        Duplex => ("DUPLEX", "Duplex"),
        Penthouse => ("PENTHOUSE", "Penthouse"),
        Studio => ("STUDIO", "Studio"),
        HotelApartment => ("HOTEL_APARTMENT", "Hotel Apartment"),
        Roof => ("ROOF", "Roof"),
    }
}

registry_enum! {
    VillaSubtype, invalid = "Please select a villa subtype" {
        StandAloneVilla => ("STAND_ALONE_VILLA", "Stand Alone Villa"),
        TownHouse => ("TOWN_HOUSE", "Town Villa"),
        TwinHouse => ("TWIN_HOUSE", "Twin Villa"),
    }
}

registry_enum! {
    CommercialSubtype, invalid = "Please select a commercial subtype" {
        Office => ("OFFICE", "Office"),
        Clinic => ("CLINIC", "Clinic"),
        Pharmacy => ("PHARMACY", "Pharmacy"),
        Factory => ("FACTORY", "Factory"),
        Garage => ("GARAGE", "Garage"),
        Warehouse => ("WAREHOUSE", "Warehouse"),
        Restaurant => ("RESTAURANT", "Restaurant"),
        Other => ("OTHER", "Other"),
    }
}

registry_enum! {
    LandSubtype, invalid = "Please select a land subtype" {
        Residential => ("RESIDENTIAL", "Residential"),
        Commercial => ("COMMERCIAL", "Commercial"),
        Industrial => ("INDUSTRIAL", "Industrial"),
        Agricultural => ("AGRICULTURAL", "Agricultural"),
        Any => ("ANY", "Any Use"),
    }
}

registry_enum! {
    /// Egyptian governorates a listing can be located in.
    Governorate, invalid = "Please select a governorate" {
        Alexandria => ("ALEXANDRIA", "Alexandria"),
        Aswan => ("ASWAN", "Aswan"),
        Asyut => ("ASYUT", "Asyut"),
        Beheira => ("BEHEIRA", "Beheira"),
        BeniSuef => ("BENI_SUEF", "Beni Suef"),
        Cairo => ("CAIRO", "Cairo"),
        Dakahlia => ("DAKAHLIA", "Dakahlia"),
        Damietta => ("DAMIETTA", "Damietta"),
        Faiyum => ("FAIYUM", "Faiyum"),
        Gharbia => ("GHARBIA", "Gharbia"),
        Giza => ("GIZA", "Giza"),
        Ismailia => ("ISMAILIA", "Ismailia"),
        KafrElSheikh => ("KAFR_EL_SHEIKH", "Kafr El Sheikh"),
        Luxor => ("LUXOR", "Luxor"),
        Matrouh => ("MATROUH", "Matrouh"),
        Minya => ("MINYA", "Minya"),
        Monufia => ("MONUFIA", "Monufia"),
        NewValley => ("NEW_VALLEY", "New Valley"),
        NorthSinai => ("NORTH_SINAI", "North Sinai"),
        PortSaid => ("PORT_SAID", "Port Said"),
        Qalyubia => ("QALYUBIA", "Qalyubia"),
        Qena => ("QENA", "Qena"),
        RedSea => ("RED_SEA", "Red Sea"),
        Sharqia => ("SHARQIA", "Sharqia"),
        Sohag => ("SOHAG", "Sohag"),
        SouthSinai => ("SOUTH_SINAI", "South Sinai"),
        Suez => ("SUEZ", "Suez"),
    }
}

registry_enum! {
    Amenity, invalid = "Please select a valid amenity" {
        Balcony => ("BALCONY", "Balcony"),
        BuiltInKitchenAppliances => ("BUILT_IN_KITCHEN_APPLIANCES", "Built-in Kitchen Appliances"),
        PrivateGarden => ("PRIVATE_GARDEN", "Private Garden"),
        CentralAc => ("CENTRAL_AC", "Central AC"),
        Security => ("SECURITY", "Security"),
        CoveredParking => ("COVERED_PARKING", "Covered Parking"),
        MaidsRoom => ("MAIDS_ROOM", "Maids Room"),
        PetsAllowed => ("PETS_ALLOWED", "Pets Allowed"),
        Pool => ("POOL", "Pool"),
        ElectricityMeter => ("ELECTRICITY_METER", "Electricity Meter"),
        WaterMeter => ("WATER_METER", "Water Meter"),
        NaturalGas => ("NATURAL_GAS", "Natural Gas"),
        Landline => ("LANDLINE", "Landline"),
        Elevator => ("ELEVATOR", "Elevator"),
        AirConditioning => ("AIR_CONDITIONING", "Air Conditioning"),
        Storage => ("STORAGE", "Storage"),
    }
}

registry_enum! {
    PropertyPurpose, invalid = "Please select a purpose" {
        Sell => ("SELL", "Sell"),
        Rent => ("RENT", "Rent"),
    }
}

registry_enum! {
    PaymentMethod, invalid = "Please select a payment method" {
        Cash => ("CASH", "Cash"),
        Installment => ("INSTALLMENT", "Installment"),
        Both => ("BOTH", "Both"),
    }
}

registry_enum! {
    RentFrequency, invalid = "Please select a rent frequency" {
        Daily => ("DAILY", "Daily"),
        Weekly => ("WEEKLY", "Weekly"),
        Monthly => ("MONTHLY", "Monthly"),
        Yearly => ("YEARLY", "Yearly"),
    }
}

const RESIDENTIAL_AMENITIES: &[Amenity] = &[
    Amenity::Balcony,
    Amenity::BuiltInKitchenAppliances,
    Amenity::PrivateGarden,
    Amenity::CentralAc,
    Amenity::Security,
    Amenity::CoveredParking,
    Amenity::MaidsRoom,
    Amenity::PetsAllowed,
    Amenity::Pool,
    Amenity::ElectricityMeter,
    Amenity::WaterMeter,
    Amenity::NaturalGas,
    Amenity::Landline,
    Amenity::Elevator,
];

const COMMERCIAL_AMENITIES: &[Amenity] = &[
    Amenity::AirConditioning,
    Amenity::CoveredParking,
    Amenity::Security,
    Amenity::Storage,
];

impl Amenity {
    /// Amenities a listing of the given type may offer. Land offers none.
    pub fn allowed_for(property_type: PropertyTypeName) -> &'static [Amenity] {
        match property_type {
            PropertyTypeName::Apartment | PropertyTypeName::Villa => RESIDENTIAL_AMENITIES,
            PropertyTypeName::Commercial => COMMERCIAL_AMENITIES,
            PropertyTypeName::Land => &[],
        }
    }
}
