//! Local item characteristic curves.

use crate::curves::usable_items;
use crate::domain::{IccData, IccPoint, ItemParameter};
use crate::math::{ThetaGrid, probability};

/// ICC points for every usable item (or only `item_id`), flattened in item
/// order. An unmatched filter yields an empty curve set, not an error.
pub fn local_icc(items: &[ItemParameter], item_id: Option<&str>, grid: ThetaGrid) -> IccData {
    let theta = grid.values();
    let icc_data = usable_items(items)
        .into_iter()
        .filter(|(id, _)| item_id.is_none_or(|wanted| wanted == *id))
        .flat_map(|(id, p)| {
            theta.iter().map(move |&t| IccPoint {
                item_id: id.to_string(),
                theta: t,
                probability: probability(p.a, p.b, p.c, t),
            })
        })
        .collect();
    IccData { icc_data }
}
