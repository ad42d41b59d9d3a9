//! C3 linearization of the inheritance graph.
//!
//! `L(o) = [o] ++ merge(L(p1), …, L(pn), [p1..pn])` where `merge`
//! repeatedly picks the head of the first list whose head does not appear
//! in the tail of any other list, removing it from all lists. Ties break
//! by declared parent order. If no valid head exists the hierarchy is
//! inconsistent and linearization fails, naming the conflicting heads.
//!
//! The function is pure: the caller supplies a `parents_of` lookup and
//! memoizes the result in the relevant [`ObjectState`]
//! (crate::object_state::ObjectState).

use crate::error::{Error, Result};
use crate::fqon::Fqon;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Ancestor order of an object, self first.
pub type Linearization = SmallVec<[Fqon; 8]>;

/// Compute the C3 linearization of `start`.
///
/// `parents_of` returns the declared parents of an object, in order.
/// Fails on merge conflicts and on inheritance cycles.
pub fn linearize<F>(start: &Fqon, parents_of: &F) -> Result<Linearization>
where
    F: Fn(&Fqon) -> Result<Vec<Fqon>>,
{
    let mut memo = HashMap::new();
    let mut path = HashSet::new();
    linearize_memo(start, parents_of, &mut memo, &mut path)
}

fn linearize_memo<F>(
    object: &Fqon,
    parents_of: &F,
    memo: &mut HashMap<Fqon, Linearization>,
    path: &mut HashSet<Fqon>,
) -> Result<Linearization>
where
    F: Fn(&Fqon) -> Result<Vec<Fqon>>,
{
    if let Some(known) = memo.get(object) {
        return Ok(known.clone());
    }
    if !path.insert(object.clone()) {
        let cycle: Vec<String> = path.iter().map(|fqon| fqon.to_string()).collect();
        return Err(Error::linearization(object.as_str(), cycle));
    }

    let parents = parents_of(object)?;

    let mut sequences: Vec<VecDeque<Fqon>> = Vec::with_capacity(parents.len() + 1);
    for parent in &parents {
        let parent_lin = linearize_memo(parent, parents_of, memo, path)?;
        sequences.push(parent_lin.into_iter().collect());
    }
    sequences.push(parents.iter().cloned().collect());

    path.remove(object);

    let mut result = Linearization::new();
    result.push(object.clone());
    merge_into(&mut result, object, sequences)?;

    memo.insert(object.clone(), result.clone());
    Ok(result)
}

/// The merge step of C3: append a consistent order of all sequences.
fn merge_into(
    result: &mut Linearization,
    object: &Fqon,
    mut sequences: Vec<VecDeque<Fqon>>,
) -> Result<()> {
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return Ok(());
        }

        let picked = sequences
            .iter()
            .filter_map(|sequence| sequence.front())
            .find(|head| {
                sequences
                    .iter()
                    .all(|other| !other.iter().skip(1).any(|entry| entry == *head))
            })
            .cloned();

        match picked {
            Some(head) => {
                result.push(head.clone());
                for sequence in &mut sequences {
                    if sequence.front() == Some(&head) {
                        sequence.pop_front();
                    }
                }
            }
            None => {
                let heads: Vec<String> = sequences
                    .iter()
                    .filter_map(|sequence| sequence.front())
                    .map(|head| head.to_string())
                    .collect();
                return Err(Error::linearization(object.as_str(), heads));
            }
        }
    }
}
