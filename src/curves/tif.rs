//! Local test information and standard error of measurement.

use crate::curves::usable_items;
use crate::domain::{ItemParameter, TifData};
use crate::math::{ItemParams, ThetaGrid, round_to, sem, test_information};

const TIF_DECIMALS: u32 = 8;
const SEM_DECIMALS: u32 = 6;

/// TIF summed over every usable item, with SEM on the same grid.
///
/// With no usable item the TIF is zero everywhere and the SEM sits at its
/// finite ceiling.
pub fn local_tif(items: &[ItemParameter], grid: ThetaGrid) -> TifData {
    let theta = grid.values();
    let params: Vec<ItemParams> = usable_items(items).into_iter().map(|(_, p)| p).collect();
    let tif = test_information(&params, &theta);
    let sem = sem(&tif);

    TifData {
        theta,
        tif: tif.into_iter().map(|v| round_to(v, TIF_DECIMALS)).collect(),
        sem: sem.into_iter().map(|v| round_to(v, SEM_DECIMALS)).collect(),
    }
}
