use crate::store::state::AppState;
use chrono::NaiveDate;
use pqms_schemas::{
    activity::Activity,
    market::{ComplaintStatus, RecallStatus},
    product::ProductStatus,
    quality::{CapaStatus, DeviationStatus},
    testing::{OverallResult, TestStatus},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Look-ahead windows, in days, for the due-soon counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardWindows {
    pub calibration_days: i64,
    pub expiry_days: i64,
}

impl Default for DashboardWindows {
    fn default() -> Self {
        Self {
            calibration_days: 30,
            expiry_days: 90,
        }
    }
}

pub const RECENT_ACTIVITY_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub products_by_status: BTreeMap<ProductStatus, usize>,
    pub pending_tests: usize,
    pub oos_results: usize,
    pub open_deviations: usize,
    pub open_capas: usize,
    pub calibrations_due: usize,
    pub expiring_products: usize,
    pub open_complaints: usize,
    pub active_recalls: usize,
    pub recent_activities: Vec<Activity>,
}

fn within(date: NaiveDate, today: NaiveDate, days: i64) -> bool {
    let ahead = (date - today).num_days();
    (0..=days).contains(&ahead)
}

impl DashboardStats {
    pub fn compute(state: &AppState, today: NaiveDate, windows: &DashboardWindows) -> Self {
        let mut products_by_status: BTreeMap<ProductStatus, usize> =
            ProductStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for product in &state.products {
            *products_by_status.entry(product.status).or_insert(0) += 1;
        }

        Self {
            total_products: state.products.len(),
            products_by_status,
            pending_tests: state
                .test_results
                .iter()
                .filter(|r| matches!(r.status, TestStatus::Scheduled | TestStatus::InProgress))
                .count(),
            oos_results: state
                .test_results
                .iter()
                .filter(|r| r.overall_result == OverallResult::Oos)
                .count(),
            open_deviations: state
                .deviations
                .iter()
                .filter(|d| d.status != DeviationStatus::Closed)
                .count(),
            open_capas: state
                .capas
                .iter()
                .filter(|c| c.status != CapaStatus::Closed)
                .count(),
            calibrations_due: state
                .equipment
                .iter()
                .filter_map(|e| e.calibration_schedule.next_calibration)
                .filter(|due| within(*due, today, windows.calibration_days))
                .count(),
            expiring_products: state
                .products
                .iter()
                .filter(|p| within(p.expiry_date, today, windows.expiry_days))
                .count(),
            open_complaints: state
                .market_complaints
                .iter()
                .filter(|c| !matches!(c.status, ComplaintStatus::Closed | ComplaintStatus::Invalid))
                .count(),
            active_recalls: state
                .product_recalls
                .iter()
                .filter(|r| r.status == RecallStatus::InProgress)
                .count(),
            recent_activities: state
                .activities
                .iter()
                .take(RECENT_ACTIVITY_COUNT)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pqms_schemas::product::Product;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn product(id: &str, expiry: NaiveDate, status: ProductStatus) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            generic_name: String::new(),
            brand_name: None,
            category: "Tablet".to_string(),
            dosage_form: "Tablet".to_string(),
            strength: "500mg".to_string(),
            manufacturer: String::new(),
            batch_number: "B1".to_string(),
            manufacturing_date: day(1),
            expiry_date: expiry,
            quantity: 0.0,
            unit: String::new(),
            storage_conditions: String::new(),
            pharmacopeia_standard: String::new(),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn expiry_window_is_inclusive_and_ignores_expired() {
        let today = day(1);
        let mut state = AppState::default();
        state.products = vec![
            product("p1", today, ProductStatus::Released),
            product("p2", today + chrono::Duration::days(90), ProductStatus::Released),
            product("p3", today + chrono::Duration::days(91), ProductStatus::Quarantine),
            product("p4", today - chrono::Duration::days(1), ProductStatus::Expired),
        ];

        let stats = DashboardStats::compute(&state, today, &DashboardWindows::default());
        assert_eq!(stats.total_products, 4);
        assert_eq!(stats.expiring_products, 2);
        assert_eq!(stats.products_by_status[&ProductStatus::Released], 2);
        assert_eq!(stats.products_by_status[&ProductStatus::Blocked], 0);
    }

    #[test]
    fn empty_state() {
        let stats = DashboardStats::compute(&AppState::default(), day(1), &DashboardWindows::default());
        assert_eq!(stats.pending_tests, 0);
        assert!(stats.recent_activities.is_empty());
        assert_eq!(stats.products_by_status.len(), ProductStatus::ALL.len());
    }
}
