//! Maximum-information item selection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::CalibratedItem;

/// A candidate item scored at the query θ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: String,
    pub information: f64,
}

/// Pick the item with the most Fisher information at `theta`.
///
/// Items listed in `exclude_ids` are never returned. The scan starts from a
/// best score of zero and only replaces it on a strictly greater score, so an
/// item with no information is never chosen and ties keep the item supplied
/// first. `None` means no suitable item, which is not an error.
pub fn select_next(
    theta: f64,
    candidates: &[CalibratedItem],
    exclude_ids: &HashSet<String>,
) -> Option<String> {
    let mut best: Option<&CalibratedItem> = None;
    let mut best_information = 0.0;

    for item in candidates {
        if exclude_ids.contains(&item.id) {
            continue;
        }
        let information = item.parameters.information(theta);
        if information > best_information {
            best_information = information;
            best = Some(item);
        }
    }

    best.map(|item| item.id.clone())
}

/// Every eligible candidate with its information at `theta`, most
/// informative first. Equal scores keep their input order.
pub fn rank_candidates(
    theta: f64,
    candidates: &[CalibratedItem],
    exclude_ids: &HashSet<String>,
) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = candidates
        .iter()
        .filter(|item| !exclude_ids.contains(&item.id))
        .map(|item| RankedItem {
            id: item.id.clone(),
            information: item.parameters.information(theta),
        })
        .collect();
    ranked.sort_by(|x, y| y.information.total_cmp(&x.information));
    ranked
}
