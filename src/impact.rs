use serde::Serialize;

/// Volume of one plastic bottle, in ml.
pub const BOTTLE_ML: u32 = 500;
/// Liters of refills credited as one planted tree, in ml.
pub const TREE_ML: u64 = 100_000;

/// Whole bottles a reusable serving replaces.
pub fn bottles_for_serving(amount_ml: u32) -> u32 {
    amount_ml / BOTTLE_ML
}

/// One tree per 200 bottles (100 liters) saved.
pub fn trees_planted(bottles_saved: u32) -> u32 {
    (u64::from(bottles_saved) * u64::from(BOTTLE_ML) / TREE_ML) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentalImpact {
    pub bottles_saved: u32,
    pub trees_planted: u32,
}

impl EnvironmentalImpact {
    pub fn from_bottles(bottles_saved: u32) -> Self {
        Self {
            bottles_saved,
            trees_planted: trees_planted(bottles_saved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trees_per_two_hundred_bottles() {
        assert_eq!(trees_planted(0), 0);
        assert_eq!(trees_planted(199), 0);
        assert_eq!(trees_planted(200), 1);
        assert_eq!(trees_planted(250), 1);
        assert_eq!(trees_planted(1000), 5);
    }

    #[test]
    fn test_large_counts_do_not_overflow() {
        let impact = EnvironmentalImpact::from_bottles(u32::MAX);
        assert_eq!(impact.trees_planted, (u64::from(u32::MAX) * 500 / 100_000) as u32);
    }

    #[test]
    fn test_bottles_for_serving() {
        assert_eq!(bottles_for_serving(250), 0);
        assert_eq!(bottles_for_serving(500), 1);
        assert_eq!(bottles_for_serving(1499), 2);
    }
}
