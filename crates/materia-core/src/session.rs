use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::catalog::Catalog;
use crate::correction::{apply_corrections, CorrectionPlan, Decision};
use crate::error::MateriaError;
use crate::model::{CompositeKey, ProjectLine};
use crate::report::ConsolidatedReport;

/// Where a generation cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Uploaded,
    ReconciledClean,
    ReconciledWithUnmatched,
    CorrectionsApplied,
    ReportReady,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowState::Uploaded => "uploaded",
            WorkflowState::ReconciledClean => "reconciled_clean",
            WorkflowState::ReconciledWithUnmatched => "reconciled_with_unmatched",
            WorkflowState::CorrectionsApplied => "corrections_applied",
            WorkflowState::ReportReady => "report_ready",
        };
        f.write_str(s)
    }
}

/// One project's generation cycle.
///
/// Holds the uploaded lines, the pending correction plan and the corrected
/// lines. Each step is a separate call; a step attempted from the wrong
/// state fails with [`MateriaError::InvalidState`] and changes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    project_name: String,
    uploaded: Vec<ProjectLine>,
    plan: CorrectionPlan,
    corrected: Vec<ProjectLine>,
    report: Option<ConsolidatedReport>,
    state: WorkflowState,
}

impl Session {
    pub fn new(project_name: impl Into<String>, lines: Vec<ProjectLine>) -> Self {
        Session {
            project_name: project_name.into(),
            uploaded: lines,
            plan: CorrectionPlan::default(),
            corrected: Vec::new(),
            report: None,
            state: WorkflowState::Uploaded,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn uploaded(&self) -> &[ProjectLine] {
        &self.uploaded
    }

    pub fn plan(&self) -> &CorrectionPlan {
        &self.plan
    }

    pub fn report(&self) -> Option<&ConsolidatedReport> {
        self.report.as_ref()
    }

    fn require(&self, allowed: &[WorkflowState]) -> Result<(), MateriaError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        let expected = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(MateriaError::InvalidState {
            expected,
            actual: self.state.to_string(),
        })
    }

    /// Match the uploaded lines against `catalog`.
    ///
    /// Allowed from any state: it restarts the cycle from the uploaded lines
    /// and discards earlier decisions and reports.
    pub fn reconcile(&mut self, catalog: &Catalog) -> &CorrectionPlan {
        self.plan = CorrectionPlan::build(catalog, &self.uploaded);
        self.report = None;
        if self.plan.is_empty() {
            self.corrected = self.uploaded.clone();
            self.state = WorkflowState::ReconciledClean;
        } else {
            self.corrected.clear();
            self.state = WorkflowState::ReconciledWithUnmatched;
        }
        tracing::debug!(
            state = %self.state,
            pending = self.plan.entries.len(),
            "session reconciled"
        );
        &self.plan
    }

    /// Record the operator's decision for one unmatched key.
    pub fn decide(
        &mut self,
        catalog: &Catalog,
        key: &CompositeKey,
        decision: Decision,
    ) -> Result<(), MateriaError> {
        self.require(&[WorkflowState::ReconciledWithUnmatched])?;
        self.plan.decide(catalog, &key.normalized(), decision)
    }

    /// Take decisions from an edited plan for every key this session has
    /// pending. Entries for other keys are ignored; pending keys the plan
    /// leaves undecided stay undecided.
    pub fn adopt_plan(
        &mut self,
        catalog: &Catalog,
        edited: &CorrectionPlan,
    ) -> Result<(), MateriaError> {
        self.require(&[WorkflowState::ReconciledWithUnmatched])?;
        let mut plan = self.plan.clone();
        for entry in &edited.entries {
            let key = entry.key.normalized();
            let Some(decision) = entry.decision.clone() else {
                continue;
            };
            if plan.entries.iter().any(|e| e.key == key) {
                plan.decide(catalog, &key, decision)?;
            }
        }
        self.plan = plan;
        Ok(())
    }

    /// Apply the decided plan to the uploaded lines.
    pub fn apply_corrections(
        &mut self,
        catalog: &Catalog,
    ) -> Result<&[ProjectLine], MateriaError> {
        self.require(&[WorkflowState::ReconciledWithUnmatched])?;
        let corrections = self.plan.to_corrections(catalog)?;
        self.corrected = apply_corrections(catalog, &self.uploaded, &corrections);
        self.state = WorkflowState::CorrectionsApplied;
        Ok(&self.corrected)
    }

    /// Aggregate the resolved lines into the report.
    ///
    /// Yields the full report or nothing: with no usable lines the session
    /// stays where it was and [`MateriaError::NoValidLines`] is returned.
    pub fn generate(&mut self, catalog: &Catalog) -> Result<&ConsolidatedReport, MateriaError> {
        self.require(&[
            WorkflowState::ReconciledClean,
            WorkflowState::CorrectionsApplied,
            WorkflowState::ReportReady,
        ])?;
        let items = aggregate(catalog, &self.corrected);
        if items.is_empty() {
            return Err(MateriaError::NoValidLines);
        }
        tracing::info!(
            project = %self.project_name,
            items = items.len(),
            lines = self.corrected.len(),
            "report generated"
        );
        self.state = WorkflowState::ReportReady;
        Ok(self.report.insert(ConsolidatedReport {
            project_name: self.project_name.clone(),
            items,
            line_count: self.corrected.len(),
        }))
    }

    /// Start a new cycle with fresh lines.
    pub fn reset(&mut self, lines: Vec<ProjectLine>) {
        *self = Session::new(std::mem::take(&mut self.project_name), lines);
    }
}

/// Sessions isolated by identity, all reading the same catalog.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or replace) the session `id`.
    pub fn open(&mut self, id: impl Into<String>, session: Session) -> &mut Session {
        match self.sessions.entry(id.into()) {
            Entry::Occupied(mut slot) => {
                slot.insert(session);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(session),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn close(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::model::{CatalogEntry, Variant};
    use rust_decimal_macros::dec;

    fn catalog() -> Catalog {
        let entry = |pole: &str, code: &str, qty| CatalogEntry {
            key: CompositeKey::new("A", "X", "1", pole),
            item_code: code.into(),
            item_description: "BOLT".into(),
            unit: "UN".into(),
            unit_quantity: qty,
        };
        Catalog::from_entries(vec![entry("P1", "001", dec!(4))], DuplicatePolicy::Reject)
            .unwrap()
            .0
    }

    fn line(pole: &str, n: u32) -> ProjectLine {
        ProjectLine::new(CompositeKey::new("A", "X", "1", pole), n)
    }

    #[test]
    fn test_clean_path() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P1", 3)]);
        assert!(s.reconcile(&c).is_empty());
        assert_eq!(s.state(), WorkflowState::ReconciledClean);
        let report = s.generate(&c).unwrap();
        assert_eq!(report.items[0].total_quantity, dec!(12));
        assert_eq!(s.state(), WorkflowState::ReportReady);
    }

    #[test]
    fn test_correction_path() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P2", 2), line("P1", 1)]);
        s.reconcile(&c);
        assert_eq!(s.state(), WorkflowState::ReconciledWithUnmatched);

        assert!(matches!(
            s.apply_corrections(&c),
            Err(MateriaError::InvalidCorrection { .. })
        ));
        assert_eq!(s.state(), WorkflowState::ReconciledWithUnmatched);

        let key = CompositeKey::new("a", "x", "1", "p2");
        s.decide(&c, &key, Decision::Remap(Variant::new("X", "1", "P1")))
            .unwrap();
        assert_eq!(s.apply_corrections(&c).unwrap().len(), 2);
        assert_eq!(s.generate(&c).unwrap().items[0].total_quantity, dec!(12));
    }

    #[test]
    fn test_generate_before_reconcile_rejected() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P1", 1)]);
        match s.generate(&c) {
            Err(MateriaError::InvalidState { actual, .. }) => assert_eq!(actual, "uploaded"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decide_outside_correction_rejected() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P1", 1)]);
        s.reconcile(&c);
        let err = s
            .decide(&c, &CompositeKey::new("A", "X", "1", "P1"), Decision::Drop)
            .unwrap_err();
        assert!(matches!(err, MateriaError::InvalidState { .. }));
    }

    #[test]
    fn test_all_dropped_yields_no_report() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P9", 1)]);
        s.reconcile(&c);
        s.decide(&c, &CompositeKey::new("A", "X", "1", "P9"), Decision::Drop)
            .unwrap();
        s.apply_corrections(&c).unwrap();
        let err = s.generate(&c).unwrap_err();
        assert!(err.is_soft());
        assert_eq!(s.state(), WorkflowState::CorrectionsApplied);
        assert!(s.report().is_none());
    }

    #[test]
    fn test_reconcile_again_discards_decisions() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P2", 1)]);
        s.reconcile(&c);
        s.decide(&c, &CompositeKey::new("A", "X", "1", "P2"), Decision::Drop)
            .unwrap();
        s.reconcile(&c);
        assert_eq!(s.plan().undecided().len(), 1);
    }

    #[test]
    fn test_adopt_plan_ignores_foreign_keys() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P2", 1)]);
        s.reconcile(&c);

        let mut edited = s.plan().clone();
        edited.entries[0].decision = Some(Decision::Remap(Variant::new("x", "1", "p1")));
        let mut foreign = edited.entries[0].clone();
        foreign.key = CompositeKey::new("Q", "Q", "Q", "Q");
        edited.entries.push(foreign);

        s.adopt_plan(&c, &edited).unwrap();
        assert!(s.plan().undecided().is_empty());
        s.apply_corrections(&c).unwrap();
        assert_eq!(s.generate(&c).unwrap().line_count, 1);
    }

    #[test]
    fn test_reset_starts_new_cycle() {
        let c = catalog();
        let mut s = Session::new("Obra", vec![line("P1", 1)]);
        s.reconcile(&c);
        s.generate(&c).unwrap();
        s.reset(vec![line("P1", 2)]);
        assert_eq!(s.state(), WorkflowState::Uploaded);
        assert!(s.report().is_none());
        assert_eq!(s.project_name(), "Obra");
    }

    #[test]
    fn test_store_isolates_sessions() {
        let c = catalog();
        let mut store = SessionStore::new();
        store.open("a", Session::new("A", vec![line("P1", 1)]));
        store.open("b", Session::new("B", vec![line("P2", 1)]));

        store.get_mut("a").unwrap().reconcile(&c);
        assert_eq!(store.get("a").unwrap().state(), WorkflowState::ReconciledClean);
        assert_eq!(store.get("b").unwrap().state(), WorkflowState::Uploaded);

        assert!(store.close("a").is_some());
        assert_eq!(store.len(), 1);
    }
}
