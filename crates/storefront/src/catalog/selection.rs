//! Transient brand -> model -> case-type selection.
//!
//! Catalog loads are asynchronous and the user can change their mind while one
//! is in flight. Each selection change issues a ticket; a response is applied
//! only if its ticket is still current, so a slow answer for a superseded
//! brand or model can never overwrite newer state.

use casemandu_core::{BrandId, CaseTypeId, ProductId};

use super::types::{CaseType, PhoneModel};

/// Ticket for a pending model-list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ModelsTicket(u64);

/// Ticket for a pending case-type load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CaseTypesTicket(u64);

/// The user's current catalog selection and the lists that drive it.
#[derive(Debug, Default)]
pub struct CatalogSelection {
    brand: Option<BrandId>,
    model: Option<ProductId>,
    case_type: Option<CaseTypeId>,
    models: Vec<PhoneModel>,
    case_types: Vec<CaseType>,
    models_generation: u64,
    case_types_generation: u64,
}

impl CatalogSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a brand, discarding everything below it.
    ///
    /// Returns the ticket the model list for this brand must be applied with.
    pub fn select_brand(&mut self, brand: BrandId) -> ModelsTicket {
        self.reset_below_brand();
        self.brand = Some(brand);
        ModelsTicket(self.models_generation)
    }

    /// Deselect the brand, discarding everything below it.
    pub fn clear_brand(&mut self) {
        self.reset_below_brand();
        self.brand = None;
    }

    /// Apply a loaded model list.
    ///
    /// Returns `false` (and changes nothing) if the brand changed since the
    /// ticket was issued.
    pub fn apply_models(&mut self, ticket: ModelsTicket, models: Vec<PhoneModel>) -> bool {
        if ticket.0 != self.models_generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.models_generation,
                "Discarding stale model list"
            );
            return false;
        }
        self.models = models;
        true
    }

    /// Select a model from the loaded list.
    ///
    /// Returns the model and the ticket its case types must be applied with,
    /// or `None` if the model is not in the current list.
    pub fn select_model(&mut self, model: &ProductId) -> Option<(CaseTypesTicket, PhoneModel)> {
        self.reset_below_model();
        let selected = self.models.iter().find(|m| &m.id == model)?.clone();
        self.model = Some(selected.id.clone());
        Some((CaseTypesTicket(self.case_types_generation), selected))
    }

    /// Apply resolved case types; the first becomes the active variant.
    ///
    /// Returns `false` (and changes nothing) if the model changed since the
    /// ticket was issued.
    pub fn apply_case_types(&mut self, ticket: CaseTypesTicket, case_types: Vec<CaseType>) -> bool {
        if ticket.0 != self.case_types_generation {
            tracing::debug!(
                ticket = ticket.0,
                current = self.case_types_generation,
                "Discarding stale case types"
            );
            return false;
        }
        self.case_type = case_types.first().map(|ct| ct.id.clone());
        self.case_types = case_types;
        true
    }

    /// Make `case_type` the active variant. Returns `false` if it is not one
    /// of the loaded case types.
    pub fn select_case_type(&mut self, case_type: &CaseTypeId) -> bool {
        if self.case_types.iter().any(|ct| &ct.id == case_type) {
            self.case_type = Some(case_type.clone());
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn brand(&self) -> Option<&BrandId> {
        self.brand.as_ref()
    }

    #[must_use]
    pub fn models(&self) -> &[PhoneModel] {
        &self.models
    }

    #[must_use]
    pub fn case_types(&self) -> &[CaseType] {
        &self.case_types
    }

    #[must_use]
    pub fn selected_model(&self) -> Option<&PhoneModel> {
        let id = self.model.as_ref()?;
        self.models.iter().find(|m| &m.id == id)
    }

    #[must_use]
    pub fn selected_case_type(&self) -> Option<&CaseType> {
        let id = self.case_type.as_ref()?;
        self.case_types.iter().find(|ct| &ct.id == id)
    }

    fn reset_below_brand(&mut self) {
        self.models_generation += 1;
        self.models.clear();
        self.reset_below_model();
    }

    fn reset_below_model(&mut self) {
        self.case_types_generation += 1;
        self.model = None;
        self.case_type = None;
        self.case_types.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn model(id: &str) -> PhoneModel {
        PhoneModel {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            price: None,
            is_activate: true,
            case_types: Vec::new(),
        }
    }

    fn case_type(id: &str) -> CaseType {
        CaseType {
            id: CaseTypeId::new(id),
            name: id.to_string(),
            price: None,
        }
    }

    #[test]
    fn test_stale_brand_response_is_discarded() {
        let mut selection = CatalogSelection::new();
        let b1 = selection.select_brand(BrandId::new("b1"));
        let b2 = selection.select_brand(BrandId::new("b2"));

        // B2 resolves first, then the slow B1 response arrives.
        assert!(selection.apply_models(b2, vec![model("b2-model")]));
        assert!(!selection.apply_models(b1, vec![model("b1-model")]));

        let ids: Vec<&str> = selection.models().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["b2-model"]);
        assert_eq!(selection.brand(), Some(&BrandId::new("b2")));
    }

    #[test]
    fn test_stale_brand_response_arriving_first_is_discarded() {
        let mut selection = CatalogSelection::new();
        let b1 = selection.select_brand(BrandId::new("b1"));
        let b2 = selection.select_brand(BrandId::new("b2"));

        assert!(!selection.apply_models(b1, vec![model("b1-model")]));
        assert!(selection.models().is_empty());
        assert!(selection.apply_models(b2, vec![model("b2-model")]));
        assert_eq!(selection.models().len(), 1);
    }

    #[test]
    fn test_brand_change_invalidates_pending_case_types() {
        let mut selection = CatalogSelection::new();
        let ticket = selection.select_brand(BrandId::new("b1"));
        selection.apply_models(ticket, vec![model("m1")]);
        let (case_ticket, _) = selection.select_model(&ProductId::new("m1")).unwrap();

        let _ = selection.select_brand(BrandId::new("b2"));

        assert!(!selection.apply_case_types(case_ticket, vec![case_type("ct1")]));
        assert!(selection.case_types().is_empty());
        assert!(selection.selected_model().is_none());
    }

    #[test]
    fn test_case_types_select_first_variant() {
        let mut selection = CatalogSelection::new();
        let ticket = selection.select_brand(BrandId::new("b1"));
        selection.apply_models(ticket, vec![model("m1"), model("m2")]);

        let (case_ticket, selected) = selection.select_model(&ProductId::new("m2")).unwrap();
        assert_eq!(selected.name, "M2");
        assert!(selection.apply_case_types(case_ticket, vec![case_type("ct1"), case_type("ct2")]));

        assert_eq!(selection.selected_case_type().unwrap().id.as_str(), "ct1");
        assert!(selection.select_case_type(&CaseTypeId::new("ct2")));
        assert!(!selection.select_case_type(&CaseTypeId::new("ct3")));
        assert_eq!(selection.selected_case_type().unwrap().id.as_str(), "ct2");
    }

    #[test]
    fn test_select_unknown_model() {
        let mut selection = CatalogSelection::new();
        let ticket = selection.select_brand(BrandId::new("b1"));
        selection.apply_models(ticket, vec![model("m1")]);

        assert!(selection.select_model(&ProductId::new("zz")).is_none());
        assert!(selection.selected_model().is_none());
    }

    #[test]
    fn test_clear_brand() {
        let mut selection = CatalogSelection::new();
        let ticket = selection.select_brand(BrandId::new("b1"));
        selection.clear_brand();

        assert!(!selection.apply_models(ticket, vec![model("m1")]));
        assert_eq!(selection.brand(), None);
    }
}
