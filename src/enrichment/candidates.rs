use std::collections::HashMap;

use super::TaskKind;

/// Supplies the possible results for a task at submit time.
///
/// The queue picks one of them (seeded) when the task resolves. An empty
/// list fails the task immediately with `EmptyCandidates`. Closures of the
/// shape `FnMut(TaskKind, &I) -> Vec<R>` implement this trait.
pub trait CandidateSource<I, R>: Send {
    fn candidates(&mut self, kind: TaskKind, input: &I) -> Vec<R>;
}

impl<I, R, F> CandidateSource<I, R> for F
where
    F: FnMut(TaskKind, &I) -> Vec<R> + Send,
{
    fn candidates(&mut self, kind: TaskKind, input: &I) -> Vec<R> {
        self(kind, input)
    }
}

/// Source that never yields anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCandidates;

impl<I, R> CandidateSource<I, R> for NoCandidates {
    fn candidates(&mut self, _kind: TaskKind, _input: &I) -> Vec<R> {
        Vec::new()
    }
}

/// Fixed candidate lists, optionally per task kind.
#[derive(Clone, Debug)]
pub struct FixedCandidates<R> {
    fallback: Vec<R>,
    by_kind: HashMap<TaskKind, Vec<R>>,
}

impl<R> Default for FixedCandidates<R> {
    fn default() -> Self {
        FixedCandidates {
            fallback: Vec::new(),
            by_kind: HashMap::new(),
        }
    }
}

impl<R> FixedCandidates<R> {
    /// The same list for every kind.
    pub fn new(candidates: Vec<R>) -> Self {
        FixedCandidates {
            fallback: candidates,
            by_kind: HashMap::new(),
        }
    }

    /// Override the list for one kind.
    pub fn with_kind(mut self, kind: TaskKind, candidates: Vec<R>) -> Self {
        self.by_kind.insert(kind, candidates);
        self
    }
}

impl<I, R> CandidateSource<I, R> for FixedCandidates<R>
where
    R: Clone + Send,
{
    fn candidates(&mut self, kind: TaskKind, _input: &I) -> Vec<R> {
        self.by_kind
            .get(&kind)
            .unwrap_or(&self.fallback)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_kind_lists_override_fallback() {
        let mut source = FixedCandidates::new(vec!["Ubuntu spirit in action"])
            .with_kind(TaskKind::Translate, vec!["Omuntu w'omuntu ku bantu"]);

        let generated = CandidateSource::<(), _>::candidates(&mut source, TaskKind::Generate, &());
        let translated =
            CandidateSource::<(), _>::candidates(&mut source, TaskKind::Translate, &());

        assert_eq!(generated, vec!["Ubuntu spirit in action"]);
        assert_eq!(translated, vec!["Omuntu w'omuntu ku bantu"]);
    }

    #[test]
    fn closures_are_sources() {
        let mut echo = |_: TaskKind, input: &String| vec![input.to_uppercase()];
        assert_eq!(
            echo.candidates(TaskKind::Validate, &"mtu ni watu".to_string()),
            vec!["MTU NI WATU".to_string()]
        );
        let mut none = NoCandidates;
        let picked = CandidateSource::<(), u8>::candidates(&mut none, TaskKind::Moderate, &());
        assert!(picked.is_empty());
    }
}
