//! Construction-time validation of model parameters.
//!
//! Everything that would otherwise surface mid-simulation as an indexing or
//! allocation failure is rejected here, before a lattice exists. Thresholds
//! are not range-checked: values outside `[0, 1]` are accepted
//! and simply make a group always or never happy.

use schelling_types::{Group, ModelParams};

use crate::error::WorldError;

/// Check that `params` describe a buildable lattice.
///
/// A population that exactly fills the lattice is accepted; such a model
/// has no vacancies and fails with [`WorldError::NoEmptyCells`] only if an
/// agent is ever unhappy.
///
/// # Errors
///
/// Returns [`WorldError::Configuration`] when the side is zero, a radius is
/// zero, a neighborhood window `2 * radius + 1` is wider than the lattice,
/// or the combined population exceeds `side * side`.
pub fn validate(params: &ModelParams) -> Result<(), WorldError> {
    if params.side == 0 {
        return Err(WorldError::Configuration {
            reason: "side must be at least 1".to_owned(),
        });
    }

    for group in Group::ALL {
        if params.group(group).radius == 0 {
            return Err(WorldError::Configuration {
                reason: format!("radius of group {group:?} must be at least 1"),
            });
        }
    }

    let window = params
        .padding()
        .checked_mul(2)
        .and_then(|w| w.checked_add(1))
        .ok_or(WorldError::ArithmeticOverflow)?;
    if window > params.side {
        return Err(WorldError::Configuration {
            reason: format!(
                "neighborhood window {window} exceeds lattice side {}",
                params.side
            ),
        });
    }

    let area = params
        .side
        .checked_mul(params.side)
        .ok_or(WorldError::ArithmeticOverflow)?;
    let area = u64::try_from(area).map_err(|_err| WorldError::ArithmeticOverflow)?;
    let population = params.total_population();
    if population > area {
        return Err(WorldError::Configuration {
            reason: format!("population {population} exceeds lattice area {area}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reference_parameters() {
        let params = ModelParams::from_pairs(100, (250, 250), (0.8, 0.8), (1, 1));
        assert!(validate(&params).is_ok());
    }

    #[test]
    fn accepts_exactly_full_lattice() {
        let params = ModelParams::from_pairs(10, (50, 50), (0.5, 0.5), (1, 1));
        assert!(validate(&params).is_ok());
    }

    #[test]
    fn rejects_overfull_lattice() {
        let params = ModelParams::from_pairs(10, (60, 41), (0.5, 0.5), (1, 1));
        assert!(matches!(
            validate(&params),
            Err(WorldError::Configuration { .. })
        ));
    }

    #[test]
    fn rejects_zero_radius() {
        let params = ModelParams::from_pairs(10, (5, 5), (0.5, 0.5), (0, 1));
        assert!(matches!(
            validate(&params),
            Err(WorldError::Configuration { .. })
        ));
    }

    #[test]
    fn rejects_window_wider_than_lattice() {
        // 2 * 2 + 1 = 5 > 4
        let params = ModelParams::from_pairs(4, (2, 2), (0.5, 0.5), (1, 2));
        assert!(matches!(
            validate(&params),
            Err(WorldError::Configuration { .. })
        ));
        // 2 * 2 + 1 = 5 fits exactly
        let params = ModelParams::from_pairs(5, (2, 2), (0.5, 0.5), (2, 2));
        assert!(validate(&params).is_ok());
    }

    #[test]
    fn rejects_zero_side() {
        let params = ModelParams::from_pairs(0, (0, 0), (0.5, 0.5), (1, 1));
        assert!(matches!(
            validate(&params),
            Err(WorldError::Configuration { .. })
        ));
    }
}
