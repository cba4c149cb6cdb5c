use phonenumber::country;
use phonenumber::Mode;

/// Region assumed for numbers written without an international prefix.
pub const DEFAULT_REGION: country::Id = country::Id::EG;

/// Parses `raw` as a dialable phone number (Egypt unless the number carries
/// its own country code) and returns it in E.164 form.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let number = phonenumber::parse(Some(DEFAULT_REGION), raw.trim()).ok()?;
    if !phonenumber::is_valid(&number) {
        return None;
    }
    Some(number.format().mode(Mode::E164).to_string())
}

pub fn is_valid_phone(raw: &str) -> bool {
    normalize_phone(raw).is_some()
}
