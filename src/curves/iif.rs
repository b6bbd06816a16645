//! Local item information functions.

use rayon::prelude::*;

use crate::curves::{QueryError, usable_items};
use crate::domain::{IifData, IifPoint, ItemParameter};
use crate::math::{ThetaGrid, information_curve, round_to};

/// Decimal places kept for each information value.
const IIF_DECIMALS: u32 = 8;

/// Long-format IIF: one `{theta, iif, item_id}` row per item and grid node.
///
/// Items are evaluated in parallel; output keeps item order.
pub fn local_iif(items: &[ItemParameter], grid: ThetaGrid) -> Result<IifData, QueryError> {
    let usable = usable_items(items);
    if usable.is_empty() {
        return Err(QueryError::Computation(
            "no item has usable parameters for information functions".to_string(),
        ));
    }

    let theta = grid.values();
    let per_item: Vec<Vec<IifPoint>> = usable
        .par_iter()
        .map(|(id, params)| {
            information_curve(*params, &theta)
                .into_iter()
                .zip(&theta)
                .map(|(info, &t)| IifPoint {
                    theta: t,
                    iif: round_to(info, IIF_DECIMALS),
                    item_id: id.to_string(),
                })
                .collect()
        })
        .collect();

    Ok(IifData {
        iif_data: per_item.into_iter().flatten().collect(),
    })
}
