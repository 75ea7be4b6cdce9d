/// Two-bucket energy accounting: a fixed charge per step, smaller for
/// reversible instructions. The unit costs are stylized constants for
/// comparing runs, not calibrated silicon figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyModel {
    pub reversible_cost: f64,
    pub irreversible_cost: f64,
    total_energy: f64,
}

impl Default for EnergyModel {
    fn default() -> EnergyModel {
        EnergyModel::with_costs(0.1, 1.0)
    }
}

impl EnergyModel {
    pub fn new() -> EnergyModel {
        EnergyModel::default()
    }

    pub fn with_costs(reversible_cost: f64, irreversible_cost: f64) -> EnergyModel {
        EnergyModel {
            reversible_cost,
            irreversible_cost,
            total_energy: 0.0,
        }
    }

    pub fn charge_reversible(&mut self) {
        self.total_energy += self.reversible_cost;
    }

    pub fn charge_irreversible(&mut self) {
        self.total_energy += self.irreversible_cost;
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charges_accumulate_per_bucket() {
        let mut energy = EnergyModel::new();
        energy.charge_reversible();
        energy.charge_reversible();
        energy.charge_irreversible();
        assert!((energy.total_energy() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn costs_are_configurable() {
        let mut energy = EnergyModel::with_costs(0.5, 2.0);
        energy.charge_reversible();
        energy.charge_irreversible();
        assert!((energy.total_energy() - 2.5).abs() < 1e-9);
    }
}
