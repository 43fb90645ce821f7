//! Unit conventions and conversion constants.
//!
//! This layer works exclusively in kelvin, kilocalorie per mole, angstrom and
//! picosecond. The external engine speaks the MD unit system (kilojoule per
//! mole, nanometer), so the adapter converts at the boundary.

/// Kilojoules per kilocalorie (thermochemical calorie).
pub const KJ_PER_KCAL: f64 = 4.184;

/// Molar gas constant in kJ/(mol K), used to derive kT for integrators that
/// expose temperature through a thermal-energy global.
pub const MOLAR_GAS_CONSTANT_KJ: f64 = 8.31446261815324e-3;

/// Converts an energy from kcal/mol to kJ/mol.
#[inline]
pub fn kcal_to_kj(energy: f64) -> f64 {
    energy * KJ_PER_KCAL
}

/// Converts an energy from kJ/mol to kcal/mol.
#[inline]
pub fn kj_to_kcal(energy: f64) -> f64 {
    energy / KJ_PER_KCAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kcal_kj_round_trip_is_identity() {
        let e = 13.7;
        assert!((kj_to_kcal(kcal_to_kj(e)) - e).abs() < 1e-12);
    }

    #[test]
    fn one_kcal_is_4184_joules() {
        assert_eq!(kcal_to_kj(1.0), 4.184);
    }
}
