//! Selection-panel seats: at most [`MAX_SELECTORS`] per division and at most one chair.

use uuid::Uuid;

use crate::state::roster::{MAX_SELECTORS, RosterError, Selector};

/// Append a selector, clearing any existing chair first when the newcomer is the chair.
pub fn add_selector(selectors: &mut Vec<Selector>, selector: Selector) -> Result<(), RosterError> {
    if selectors.len() >= MAX_SELECTORS {
        return Err(RosterError::SelectorCapReached);
    }
    ensure_named(&selector)?;

    if selector.is_chair {
        clear_chair(selectors, None);
    }
    selectors.push(selector);
    Ok(())
}

/// Replace the selector with `id`, keeping its identifier. Promoting it to chair clears the
/// chair flag on every other seat.
pub fn update_selector(
    selectors: &mut [Selector],
    id: Uuid,
    mut updated: Selector,
) -> Result<(), RosterError> {
    ensure_named(&updated)?;
    let index = position(selectors, id)?;

    updated.id = id;
    if updated.is_chair {
        clear_chair(selectors, Some(index));
    }
    selectors[index] = updated;
    Ok(())
}

/// Make the selector with `id` the only chair.
pub fn set_chair(selectors: &mut [Selector], id: Uuid) -> Result<(), RosterError> {
    let index = position(selectors, id)?;
    for (i, selector) in selectors.iter_mut().enumerate() {
        selector.is_chair = i == index;
    }

    let chairs = selectors.iter().filter(|s| s.is_chair).count();
    if chairs != 1 {
        return Err(RosterError::InvariantViolated(format!(
            "expected exactly one chair after promotion, found {chairs}"
        )));
    }
    Ok(())
}

/// Remove a seat. No other selector is promoted when the chair leaves.
pub fn delete_selector(selectors: &mut Vec<Selector>, id: Uuid) -> Result<Selector, RosterError> {
    let index = position(selectors, id)?;
    Ok(selectors.remove(index))
}

fn position(selectors: &[Selector], id: Uuid) -> Result<usize, RosterError> {
    selectors
        .iter()
        .position(|s| s.id == id)
        .ok_or(RosterError::SelectorNotFound(id))
}

fn clear_chair(selectors: &mut [Selector], keep: Option<usize>) {
    selectors
        .iter_mut()
        .enumerate()
        .filter(|(i, _)| Some(*i) != keep)
        .for_each(|(_, s)| s.is_chair = false);
}

fn ensure_named(selector: &Selector) -> Result<(), RosterError> {
    if selector.name.trim().is_empty() {
        return Err(RosterError::EmptyName("selector name"));
    }
    Ok(())
}
