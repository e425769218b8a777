//! CONSTRUCT template instantiation

use fnv::FnvHashMap;

use crate::core::TemplateInstantiator;
use crate::term::{Binding, Term, Triple};
use super::TriplePattern;

/// Substitutes bindings into a template, one solution at a time
///
/// Blank nodes in the template are replaced by fresh ones for every
/// solution, consistently within that solution. Template triples that
/// still mention an unbound variable are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTemplate;

impl TemplateInstantiator for DefaultTemplate {
    fn fill_template(&self, template: &[TriplePattern], binding: &Binding) -> Vec<Triple> {
        let mut fresh: FnvHashMap<Term, Term> = FnvHashMap::default();
        template
            .iter()
            .filter_map(|pattern| {
                let subject = instantiate_term(&pattern.subject, binding, &mut fresh)?;
                let predicate = instantiate_term(&pattern.predicate, binding, &mut fresh)?;
                let object = instantiate_term(&pattern.object, binding, &mut fresh)?;
                Some(Triple::new(subject, predicate, object))
            })
            .collect()
    }
}

fn instantiate_term(term: &Term, binding: &Binding, fresh: &mut FnvHashMap<Term, Term>) -> Option<Term> {
    match term {
        Term::Variable(v) => binding.get(v).cloned(),
        Term::BlankNode(_) => Some(fresh.entry(term.clone()).or_insert_with(Term::fresh_blank).clone()),
        _ => Some(term.clone()),
    }
}
