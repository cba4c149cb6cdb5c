use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use listing_schema::{Amenity, PropertyInsert, Step, StepContext, StepFragment};
use serde_json::{Map, Value};

use crate::error::WizardError;

/// Where a finished payload goes. The HTTP client implements it; tests use
/// in-process fakes.
#[async_trait]
pub trait PropertySubmitter: Send + Sync {
    /// Returns the id of the created listing.
    async fn create_property(&self, payload: &PropertyInsert) -> Result<i64, WizardError>;
}

/// One in-progress listing flow. Owned by whoever drives that flow and
/// never shared between flows.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    step: Step,
    fragments: BTreeMap<Step, StepFragment>,
}

impl Default for WizardState {
    fn default() -> Self {
        WizardState {
            step: Step::PropertyType,
            fragments: BTreeMap::new(),
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a saved flow. Each fragment is filed under its own step.
    pub fn resume<I>(current: Step, fragments: I) -> Self
    where
        I: IntoIterator<Item = StepFragment>,
    {
        WizardState {
            step: current,
            fragments: fragments.into_iter().map(|f| (f.step(), f)).collect(),
        }
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    pub fn step_index(&self) -> usize {
        self.step.index()
    }

    pub fn is_last_step(&self) -> bool {
        self.step.index() + 1 == Step::COUNT
    }

    pub fn fragment(&self, step: Step) -> Option<&StepFragment> {
        self.fragments.get(&step)
    }

    /// What later steps know about earlier ones.
    pub fn context(&self) -> StepContext {
        let property_type = match self.fragments.get(&Step::PropertyType) {
            Some(StepFragment::PropertyType(fragment)) => Some(fragment.property_type.name()),
            _ => None,
        };
        StepContext { property_type }
    }

    /// Amenities the location step offers for the chosen property type.
    pub fn amenity_options(&self) -> &'static [Amenity] {
        self.context()
            .property_type
            .map(Amenity::allowed_for)
            .unwrap_or(&[])
    }

    /// Validates `input` against the current step only and stores the
    /// fragment, replacing an earlier one. On failure nothing changes.
    pub fn submit_step(&mut self, input: &Value) -> Result<Step, WizardError> {
        let fragment = self.step.validate(input, &self.context())?;
        self.fragments.insert(self.step, fragment);
        self.advance();
        Ok(self.step)
    }

    pub fn next(&mut self) -> Result<Step, WizardError> {
        if !self.fragments.contains_key(&self.step) {
            return Err(WizardError::StepIncomplete(self.step));
        }
        self.advance();
        Ok(self.step)
    }

    pub fn previous(&mut self) -> Step {
        if let Some(step) = self.step.index().checked_sub(1).and_then(Step::from_index) {
            self.step = step;
        }
        self.step
    }

    fn advance(&mut self) {
        if let Some(step) = Step::from_index(self.step.index() + 1) {
            self.step = step;
        }
    }

    /// Disjoint union of every stored fragment. A field written by two
    /// steps is a conflict, never an overwrite.
    pub fn merged_payload(&self) -> Result<Value, WizardError> {
        let parts = self
            .fragments
            .iter()
            .map(|(step, fragment)| fragment.to_object().map(|object| (*step, object)))
            .collect::<Result<Vec<_>, _>>()?;
        merge_disjoint(parts)
    }

    /// The merged payload, validated as a whole.
    pub fn build_payload(&self) -> Result<PropertyInsert, WizardError> {
        Ok(PropertyInsert::from_json(&self.merged_payload()?)?)
    }

    /// Sends the finished listing. Success ends the flow; any failure keeps
    /// every fragment so the user can fix it and try again.
    pub async fn submit<S>(&mut self, submitter: &S) -> Result<i64, WizardError>
    where
        S: PropertySubmitter + ?Sized,
    {
        let payload = self.build_payload()?;
        match submitter.create_property(&payload).await {
            Ok(id) => {
                log::info!("Listing {} submitted", id);
                self.reset();
                Ok(id)
            }
            Err(e) => {
                log::warn!("Listing submission failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fails on the first field two steps both write.
fn merge_disjoint(parts: Vec<(Step, Map<String, Value>)>) -> Result<Value, WizardError> {
    let mut merged = Map::new();
    let mut owners: HashMap<String, Step> = HashMap::new();
    for (step, object) in parts {
        for (field, value) in object {
            if let Some(first) = owners.get(&field) {
                return Err(WizardError::FieldConflict {
                    field,
                    first: *first,
                    second: step,
                });
            }
            owners.insert(field.clone(), step);
            merged.insert(field, value);
        }
    }
    Ok(Value::Object(merged))
}
