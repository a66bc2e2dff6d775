//! Visit motive filtering.
//!
//! A [`MotiveFilter`] is a predicate over a [`VisitMotive`]. Deployments
//! compose it from the constructors below (or from configuration) instead of
//! hard-coding a filter per script.

use std::collections::HashSet;
use std::sync::Arc;

use crate::center::{CenterInfo, VisitMotive};

type Predicate = dyn Fn(&VisitMotive) -> bool + Send + Sync;

/// A shareable predicate selecting the visit motives worth watching.
#[derive(Clone)]
pub struct MotiveFilter {
    predicate: Arc<Predicate>,
}

impl std::fmt::Debug for MotiveFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotiveFilter").finish_non_exhaustive()
    }
}

impl MotiveFilter {
    /// Wrap an arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&VisitMotive) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Keep everything.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Case-insensitive substring match on the motive name.
    pub fn name_contains(needle: impl Into<String>) -> Self {
        let needle = needle.into().to_lowercase();
        Self::new(move |m| m.name.to_lowercase().contains(&needle))
    }

    /// Match any of the given names (case-insensitive substring).
    pub fn name_contains_any<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let needles: Vec<String> = needles.into_iter().map(|s| s.into().to_lowercase()).collect();
        Self::new(move |m| {
            let name = m.name.to_lowercase();
            needles.iter().any(|n| name.contains(n.as_str()))
        })
    }

    /// Match motives by id.
    pub fn ids<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        let ids: HashSet<u64> = ids.into_iter().collect();
        Self::new(move |m| ids.contains(&m.id))
    }

    pub fn and(self, other: Self) -> Self {
        Self::new(move |m| self.matches(m) && other.matches(m))
    }

    pub fn or(self, other: Self) -> Self {
        Self::new(move |m| self.matches(m) || other.matches(m))
    }

    pub fn not(self) -> Self {
        Self::new(move |m| !self.matches(m))
    }

    pub fn matches(&self, motive: &VisitMotive) -> bool {
        (self.predicate)(motive)
    }
}

/// Derive a filtered copy of `info`.
///
/// Without a filter the center is returned unchanged. Otherwise only the
/// matching motives are kept, then only the agendas that can book at least
/// one of them.
pub fn apply(info: &CenterInfo, filter: Option<&MotiveFilter>) -> CenterInfo {
    let Some(filter) = filter else {
        return info.clone();
    };

    let visit_motives: Vec<VisitMotive> = info
        .visit_motives
        .iter()
        .filter(|m| filter.matches(m))
        .cloned()
        .collect();
    let kept: Vec<u64> = visit_motives.iter().map(|m| m.id).collect();
    let agendas = info
        .agendas
        .iter()
        .filter(|a| a.books_any(&kept))
        .cloned()
        .collect();

    CenterInfo {
        visit_motives,
        agendas,
        ..info.clone()
    }
}
