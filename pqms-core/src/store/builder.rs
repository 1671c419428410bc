use super::{state::AppState, EventSubscriber, Store};
use crate::{error::PqmsError, logger::ActivityLogger};
use pqms_schemas::{
    batch::MasterFormula, stability::StabilityProtocol, testing::TestMethod,
};

/// A fluent builder for constructing a `Store`.
///
/// Starts from an empty state unless one is supplied. Reference data can be
/// layered on top with the `with_*` methods; records whose id is already
/// present are left as they are.
#[derive(Default)]
pub struct StoreBuilder {
    state: AppState,
    master_formulas: Vec<MasterFormula>,
    test_methods: Vec<TestMethod>,
    stability_protocols: Vec<StabilityProtocol>,
    user: Option<String>,
    subscribers: Vec<Box<dyn EventSubscriber>>,
    log_path: Option<String>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a previously saved state.
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    pub fn with_master_formulas(mut self, formulas: Vec<MasterFormula>) -> Self {
        self.master_formulas = formulas;
        self
    }

    pub fn with_test_methods(mut self, methods: Vec<TestMethod>) -> Self {
        self.test_methods = methods;
        self
    }

    pub fn with_stability_protocols(mut self, protocols: Vec<StabilityProtocol>) -> Self {
        self.stability_protocols = protocols;
        self
    }

    /// Name recorded on every activity. Defaults to "System".
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn with_subscriber(mut self, subscriber: Box<dyn EventSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Appends every domain event to the given CSV file.
    pub fn with_activity_log_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// # Errors
    ///
    /// Returns `PqmsError::FileIO` if the activity log cannot be opened.
    pub fn build(self) -> Result<Store, PqmsError> {
        let mut state = self.state;
        merge(&mut state.master_formulas, self.master_formulas, |m| &m.id);
        merge(&mut state.test_methods, self.test_methods, |m| &m.id);
        merge(&mut state.stability_protocols, self.stability_protocols, |p| &p.id);

        let mut subscribers = self.subscribers;
        if let Some(path) = self.log_path {
            let logger = ActivityLogger::new(&path).map_err(|e| PqmsError::FileIO(path.clone(), e))?;
            subscribers.push(Box::new(logger));
        }

        Ok(Store {
            state,
            user: self.user.unwrap_or_else(|| "System".to_string()),
            subscribers,
        })
    }
}

fn merge<T>(rows: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> &String) {
    for row in incoming {
        if !rows.iter().any(|r| id(r) == id(&row)) {
            rows.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqms_schemas::batch::YieldRange;

    fn mfr(id: &str, product: &str) -> MasterFormula {
        MasterFormula {
            id: id.to_string(),
            product_name: product.to_string(),
            mfr_number: format!("MFR-{}", id),
            revision_number: "00".to_string(),
            effective_date: None,
            batch_size: 1000.0,
            batch_size_unit: "Tablets".to_string(),
            strength: String::new(),
            dosage_form: "Tablet".to_string(),
            shelf_life: String::new(),
            theoretical_yield_range: YieldRange { min: 98.0, max: 101.0 },
            line_clearance_required: true,
            ingredients: vec![],
            process_steps: vec![],
            status: None,
        }
    }

    #[test]
    fn reference_data_does_not_overwrite_saved_records() {
        let mut saved = AppState::default();
        saved.master_formulas.push(mfr("m1", "Saved"));

        let store = StoreBuilder::new()
            .with_state(saved)
            .with_master_formulas(vec![mfr("m1", "Library"), mfr("m2", "Library")])
            .with_user("QA Officer")
            .build()
            .unwrap();

        let names: Vec<&str> = store.state().master_formulas.iter().map(|m| m.product_name.as_str()).collect();
        assert_eq!(names, vec!["Saved", "Library"]);
        assert_eq!(store.user(), "QA Officer");
    }

    #[test]
    fn default_user() {
        let store = StoreBuilder::new().build().unwrap();
        assert_eq!(store.user(), "System");
        assert!(store.state().is_empty());
    }
}
