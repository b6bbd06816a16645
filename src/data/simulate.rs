//! Synthetic 3PL response data.
//!
//! Item parameters and abilities are drawn from a seeded `StdRng`, so the
//! same `(items, students, seed)` always produces the same file:
//!
//! - `a ~ U(0.6, 2.0)`, `b ~ N(0, 1)`, `c ~ U(0, 0.25)`
//! - `θ ~ N(0, 1)` per student
//! - response `~ Bernoulli(P(θ; a, b, c))`

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ItemParameter;
use crate::error::AppError;
use crate::math::probability;

#[derive(Debug, Clone)]
pub struct SimulatedData {
    /// Generating parameters, one per item (`Q1`, `Q2`, ...).
    pub items: Vec<ItemParameter>,
    pub abilities: Vec<f64>,
    /// `responses[student][item]`, each 0 or 1.
    pub responses: Vec<Vec<u8>>,
}

pub fn simulate_responses(n_items: usize, n_students: usize, seed: u64) -> Result<SimulatedData, AppError> {
    if n_items < 2 {
        return Err(AppError::Usage("simulation needs at least 2 items".to_string()));
    }
    if n_students == 0 {
        return Err(AppError::Usage("simulation needs at least 1 student".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::Usage(format!("distribution error: {e}")))?;

    let items: Vec<ItemParameter> = (1..=n_items)
        .map(|i| ItemParameter {
            item_id: format!("Q{i}"),
            discrimination: rng.gen_range(0.6..2.0),
            difficulty: normal.sample(&mut rng),
            guessing: rng.gen_range(0.0..0.25),
            model_type: "3PL".to_string(),
            ..ItemParameter::default()
        })
        .collect();

    let abilities: Vec<f64> = (0..n_students).map(|_| normal.sample(&mut rng)).collect();

    let responses = abilities
        .iter()
        .map(|&theta| {
            items
                .iter()
                .map(|item| {
                    let p = probability(item.discrimination, item.difficulty, item.guessing, theta);
                    u8::from(rng.r#gen::<f64>() < p)
                })
                .collect()
        })
        .collect();

    Ok(SimulatedData {
        items,
        abilities,
        responses,
    })
}

/// Write the responses as an upload-ready CSV with a leading `student_id` column.
pub fn write_responses_csv(path: &Path, data: &SimulatedData) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::export(path, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| AppError::export(path, e))?;

    let mut header = vec!["student_id".to_string()];
    header.extend(data.items.iter().map(|item| item.item_id.clone()));
    writer.write_record(&header).map_err(|e| AppError::export(path, e))?;

    for (idx, row) in data.responses.iter().enumerate() {
        let mut record = vec![format!("S{:04}", idx + 1)];
        record.extend(row.iter().map(u8::to_string));
        writer.write_record(&record).map_err(|e| AppError::export(path, e))?;
    }
    writer.flush().map_err(|e| AppError::export(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::load_responses;

    #[test]
    fn same_seed_same_data() {
        let a = simulate_responses(5, 50, 7).unwrap();
        let b = simulate_responses(5, 50, 7).unwrap();
        assert_eq!(a.responses, b.responses);
        assert_eq!(a.items, b.items);

        let c = simulate_responses(5, 50, 8).unwrap();
        assert_ne!(a.responses, c.responses);
    }

    #[test]
    fn parameters_stay_in_their_ranges() {
        let data = simulate_responses(40, 10, 1).unwrap();
        for item in &data.items {
            assert!((0.6..2.0).contains(&item.discrimination));
            assert!((0.0..0.25).contains(&item.guessing));
        }
        assert_eq!(data.abilities.len(), 10);
        assert!(data.responses.iter().all(|row| row.len() == 40 && row.iter().all(|&r| r <= 1)));
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(matches!(simulate_responses(1, 10, 0), Err(AppError::Usage(_))));
        assert!(matches!(simulate_responses(3, 0, 0), Err(AppError::Usage(_))));
    }

    #[test]
    fn csv_loads_as_an_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.csv");
        let data = simulate_responses(4, 25, 3).unwrap();
        write_responses_csv(&path, &data).unwrap();

        let matrix = load_responses(&path).unwrap();
        assert_eq!(matrix.identifier.as_deref(), Some("student_id"));
        assert_eq!(matrix.items, vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(matrix.n_respondents(), 25);
        assert_eq!(matrix.responses[(0, 0)], f64::from(data.responses[0][0]));
    }
}
